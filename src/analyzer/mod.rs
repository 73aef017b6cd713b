//! Reverse-engineers a templated request graph from a recorded browsing session.
//!
//! The pipeline looks for the end-user's email address among the recorded request
//! parameters, anchors on the first request that sends it, discovers a stable id in
//! that request's response by correlating it with the final page URL, and then
//! collects every later request that sends the id. Authorization tokens and CSRF
//! values are traced back to the earlier responses that produced them.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::model::{DataSource, RecordedEntry, Recording};
use crate::url::ParsedUrl;
use crate::value::ComputedValue;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

mod draft;
pub mod entry;
pub mod ids;
pub mod naming;
mod provenance;
pub mod search;

use draft::RequestDraft;
use entry::EnhancedEntry;
pub use ids::{IdGenerator, SequentialIds, UuidIds};
use search::{FrequencyCounter, find_value_paths, search_obj_for_matches};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("regex for email addresses")
});

/// Infers a `DataSource` from a `Recording`.
///
/// The analyzer is pure: it performs no I/O and can be reused across recordings.
/// Ids come from the injected `IdGenerator`, so two runs over the same recording produce
/// the same templates under different ids unless a deterministic generator is used.
pub struct Analyzer {
    config: AnalyzerConfig,
    ids: Box<dyn IdGenerator>,
}

pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
    ids: Box<dyn IdGenerator>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            ids: Box::new(UuidIds),
        }
    }
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }
    pub fn with_max_trace_depth(mut self, depth: usize) -> Self {
        self.config.max_trace_depth = depth;
        self
    }
    pub fn with_email_input_id(mut self, input_id: &str) -> Self {
        self.config.email_input_id = input_id.to_string();
        self
    }
    pub fn build(self) -> Analyzer {
        Analyzer {
            config: self.config,
            ids: self.ids,
        }
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        AnalyzerBuilder::new().build()
    }
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs the full pipeline. Any failing step aborts the run; there are no partial results.
    pub fn process(&self, recording: &Recording) -> Result<DataSource, AnalyzeError> {
        let last_url = recording.last_url.trim();
        if last_url.is_empty() {
            return Err(AnalyzeError::NoUrl);
        }

        // 1. Chronological order defines "earlier" and "later" for every later step.
        let sorted: Vec<&RecordedEntry> = recording
            .network_requests
            .iter()
            .filter(|e| !e.url.trim().is_empty())
            .sorted_by(|a, b| a.started_at.total_cmp(&b.started_at))
            .collect();
        if sorted.is_empty() {
            return Err(AnalyzeError::NoUrl);
        }
        let entries: Vec<EnhancedEntry<'_>> = sorted.into_iter().map(EnhancedEntry::new).collect();
        debug!(entries = entries.len(), "analyzing recording");

        // 2-3. The most frequent email address and the first request that sends it.
        let email = most_frequent_email(&entries).ok_or(AnalyzeError::NoEmailAddress)?;
        let anchor_index = entries
            .iter()
            .position(|e| !e.params_equal_to(&email).is_empty())
            .ok_or(AnalyzeError::NoEmailAddress)?;
        debug!(anchor = %entries[anchor_index].id(), "anchor request found");

        let mut analysis = Analysis {
            config: &self.config,
            ids: self.ids.as_ref(),
            entries,
            drafts: Vec::new(),
            by_entry: AHashMap::new(),
            traced: AHashSet::new(),
            email,
        };

        // 4-6. Materialize the anchor and trace its credentials.
        let anchor = analysis.materialize(anchor_index);
        analysis.trace_producers(anchor, 0);
        let anchor_id = analysis.drafts[anchor].id.clone();

        // 7. The response value that best matches the final URL is the stable id.
        // Only an object response can carry it; arrays count as unparseable here.
        let anchor_entry = &analysis.entries[anchor_index];
        let response = anchor_entry
            .response
            .as_ref()
            .filter(|response| response.is_object())
            .ok_or_else(|| AnalyzeError::CannotParseResponseBody {
                entry_id: anchor_entry.id().to_string(),
            })?;
        let candidates = url_candidates(last_url);
        let counter = search_obj_for_matches(response, &candidates);
        let id = best_candidate(&counter).ok_or_else(|| AnalyzeError::NoId {
            entry_id: anchor_entry.id().to_string(),
        })?;

        // 8. Where the id lives in the anchor's response.
        let id_path = find_value_paths(response, &id)
            .into_iter()
            .next()
            .ok_or_else(|| AnalyzeError::NoPathFromEmailToId {
                entry_id: anchor_entry.id().to_string(),
                id: id.clone(),
            })?;
        debug!(id = %id, path = ?id_path, "stable id located");

        // 9. Later requests that send the id read it from the anchor instead.
        let dependents: Vec<usize> = (anchor_index + 1..analysis.entries.len())
            .filter(|&i| !analysis.entries[i].params_equal_to(&id).is_empty())
            .collect();
        if dependents.is_empty() {
            return Err(AnalyzeError::NoEntriesWithId { id });
        }
        for entry_index in dependents {
            let params = analysis.entries[entry_index].params_equal_to(&id);
            let draft = analysis.materialize(entry_index);
            for param in &params {
                analysis.drafts[draft].apply(
                    &param.location,
                    ComputedValue::request(anchor_id.clone(), id_path.clone()),
                );
            }
            analysis.trace_producers(draft, 0);
        }

        // 10-11. Name the requests and assemble the data source.
        let requests = analysis
            .drafts
            .into_iter()
            .sorted_by_key(|d| d.entry_index)
            .map(RequestDraft::finish)
            .collect_vec();
        info!(requests = requests.len(), "recording analyzed");

        Ok(DataSource {
            id: self.ids.next_id(),
            name: String::new(),
            requests,
            outputs: Vec::new(),
        })
    }
}

/// Mutable state of a single analyzer run.
pub(crate) struct Analysis<'r, 'c> {
    config: &'c AnalyzerConfig,
    ids: &'c dyn IdGenerator,
    entries: Vec<EnhancedEntry<'r>>,
    drafts: Vec<RequestDraft>,
    /// Entry id to draft index, so an entry is materialized at most once.
    by_entry: AHashMap<String, usize>,
    traced: AHashSet<String>,
    email: String,
}

impl Analysis<'_, '_> {
    /// Returns the draft for the entry at `entry_index`, creating it on first use.
    /// Every literal occurrence of the email becomes the email input.
    fn materialize(&mut self, entry_index: usize) -> usize {
        let entry = &self.entries[entry_index];
        if let Some(&existing) = self.by_entry.get(entry.id()) {
            return existing;
        }

        let mut draft = RequestDraft::from_entry(self.ids.next_id(), entry_index, entry);
        for param in entry.params_equal_to(&self.email) {
            draft.apply(
                &param.location,
                ComputedValue::input(self.config.email_input_id.clone()),
            );
        }
        debug!(entry = %entry.id(), request = %draft.id, "request materialized");

        let index = self.drafts.len();
        self.by_entry.insert(entry.id().to_string(), index);
        self.drafts.push(draft);
        index
    }
}

fn most_frequent_email(entries: &[EnhancedEntry<'_>]) -> Option<String> {
    let mut counter = FrequencyCounter::default();
    for entry in entries {
        for param in entry.params() {
            if EMAIL_PATTERN.is_match(&param.value) {
                counter.add(&param.value);
            }
        }
    }
    counter.most_frequent().map(|(email, _)| email.to_string())
}

/// Decoded path segments and query values of the final page URL.
fn url_candidates(last_url: &str) -> Vec<String> {
    let parsed = ParsedUrl::parse(last_url);
    parsed
        .path_segments()
        .into_iter()
        .chain(parsed.query_pairs().into_iter().map(|(_, value)| value))
        .filter(|candidate| !candidate.is_empty())
        .unique()
        .collect()
}

fn best_candidate(counter: &FrequencyCounter) -> Option<String> {
    counter.most_frequent().map(|(value, _)| value.to_string())
}
