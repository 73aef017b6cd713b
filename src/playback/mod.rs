//! Executes a data source's request graph against live credentials.
//!
//! Requests run strictly one at a time in dependency order, so every `request`
//! reference is resolved from the response of a request that has already completed.

use crate::config::PlaybackConfig;
use crate::error::{GraphError, PlaybackError};
use crate::graph::RequestGraph;
use crate::model::{DataSourceOutput, DataSourceRequest};
use crate::value::{Inputs, resolve_path};
use ahash::AHashMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

mod engine;
pub mod transport;

pub use engine::{ResponseCache, render_request};
pub use transport::{
    RecordedTransport, Transport, TransportError, TransportRequest, TransportResponse,
};

/// Output id to resolved value. `None` means the output path did not resolve.
pub type PlaybackResult = AHashMap<String, Option<Value>>;

pub struct Playback<T: Transport> {
    transport: T,
    config: PlaybackConfig,
    cancel: Option<watch::Receiver<bool>>,
}

pub struct PlaybackBuilder<T: Transport> {
    transport: T,
    config: PlaybackConfig,
    cancel: Option<watch::Receiver<bool>>,
}

impl<T: Transport> PlaybackBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: PlaybackConfig::default(),
            cancel: None,
        }
    }
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_request_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.config.request_timeout_ms = timeout_ms;
        self
    }
    /// Playback stops with `PlaybackError::Cancelled` once the signal turns `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
    pub fn build(self) -> Playback<T> {
        Playback {
            transport: self.transport,
            config: self.config,
            cancel: self.cancel,
        }
    }
}

impl<T: Transport> Playback<T> {
    pub fn builder(transport: T) -> PlaybackBuilder<T> {
        PlaybackBuilder::new(transport)
    }

    pub fn new(transport: T) -> Self {
        PlaybackBuilder::new(transport).build()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes every request and returns each response body keyed by request id.
    pub async fn fetch_get_full_responses(
        &self,
        requests: &[DataSourceRequest],
        inputs: &Inputs,
    ) -> Result<ResponseCache, PlaybackError> {
        let graph = RequestGraph::build(requests)?;
        let order = graph.full_order()?;
        self.run(&graph, &order, inputs).await
    }

    /// Executes only the requests the outputs need and resolves each output.
    pub async fn fetch_playback(
        &self,
        requests: &[DataSourceRequest],
        outputs: &[DataSourceOutput],
        inputs: &Inputs,
    ) -> Result<PlaybackResult, PlaybackError> {
        let graph = RequestGraph::build(requests)?;
        let mut targets = Vec::with_capacity(outputs.len());
        for output in outputs {
            let target = graph.position(&output.value.request_id).ok_or_else(|| {
                GraphError::UnknownRequest {
                    referrer: output.id.clone(),
                    referenced: output.value.request_id.clone(),
                }
            })?;
            targets.push(target);
        }
        let order = graph.order_from(targets)?;
        let cache = self.run(&graph, &order, inputs).await?;

        let results = outputs
            .iter()
            .map(|output| {
                let value = cache
                    .get(&output.value.request_id)
                    .and_then(|body| resolve_path(body, &output.value.path))
                    .cloned();
                (output.id.clone(), value)
            })
            .collect();
        Ok(results)
    }

    async fn run(
        &self,
        graph: &RequestGraph<'_>,
        order: &[usize],
        inputs: &Inputs,
    ) -> Result<ResponseCache, PlaybackError> {
        let mut cache = ResponseCache::with_capacity(order.len());
        for &position in order {
            let request = graph.request(position);
            let body = engine::execute(
                &self.transport,
                request,
                inputs,
                &cache,
                self.config.request_timeout(),
                self.cancel.as_ref(),
            )
            .await?;
            cache.insert(request.id.clone(), body);
        }
        info!(executed = order.len(), "playback finished");
        Ok(cache)
    }
}
