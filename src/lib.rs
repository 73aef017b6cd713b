//! # reqgraph - Recording Analysis and Playback of Templated Request Graphs
//!
//! **reqgraph** turns a passively recorded browsing session into a reusable *data source*:
//! a small graph of HTTP requests in which some parameters are templated (the end-user's
//! email address, an id discovered in an earlier response, a token issued by a login call).
//! The data source can later be replayed for a different end-user to fetch equivalent data.
//!
//! ## Core Workflow
//!
//! 1.  **Record**: Capture a session's network traffic as a [`model::Recording`].
//! 2.  **Analyze**: Run the [`analyzer::Analyzer`] over the recording. It infers which values
//!     are user-specific and which are produced by earlier responses, and returns a
//!     [`model::DataSource`].
//! 3.  **Wire outputs**: Attach [`model::DataSourceOutput`]s pointing at the response values
//!     you want to expose, then persist the data source as JSON.
//! 4.  **Play back**: Hand the data source to a [`playback::Playback`] together with a
//!     [`playback::Transport`] and the runtime inputs. Requests run in dependency order and
//!     each output is resolved from the collected responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqgraph::prelude::*;
//! use reqgraph::response_path;
//!
//! fn main() -> Result<()> {
//!     let recording = Recording::from_file("session.json")?;
//!
//!     // Infer the templated request graph.
//!     let mut data_source = Analyzer::default().process(&recording)?;
//!
//!     // Expose the first request's `name` field.
//!     let first = data_source.requests[0].id.clone();
//!     data_source.outputs.push(DataSourceOutput {
//!         id: "name".to_string(),
//!         name: "Customer name".to_string(),
//!         value: ResponsePointer::new(first, response_path!["name"]),
//!     });
//!
//!     // Dry-run it against the recorded responses for another user.
//!     let playback = Playback::new(RecordedTransport::from_recording(&recording));
//!     let mut inputs = Inputs::new();
//!     inputs.insert("email".to_string(), "someone@example.com".to_string());
//!     let values = tokio_test::block_on(playback.fetch_playback(
//!         &data_source.requests,
//!         &data_source.outputs,
//!         &inputs,
//!     ))?;
//!     println!("{:?}", values.get("name"));
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod playback;
pub mod prelude;
pub mod url;
pub mod value;
