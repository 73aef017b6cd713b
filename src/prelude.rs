//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types of the reqgraph crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use reqgraph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let recording = Recording::from_file("path/to/recording.json")?;
//! let data_source = Analyzer::default().process(&recording)?;
//! data_source.save("path/to/data_source.json")?;
//! # Ok(())
//! # }
//! ```

// Analysis and playback
pub use crate::analyzer::{Analyzer, AnalyzerBuilder, IdGenerator, SequentialIds, UuidIds};
pub use crate::playback::{
    Playback, PlaybackBuilder, PlaybackResult, RecordedTransport, ResponseCache, Transport,
    TransportError, TransportRequest, TransportResponse,
};

// Data model
pub use crate::model::{
    Credentials, DataSource, DataSourceOutput, DataSourceRequest, RecordedEntry, Recording,
};
pub use crate::value::{
    ComputedValue, Inputs, PathKey, ResponseBodyPath, ResponsePointer, Template,
    TemplateFormatter, resolve_path,
};

// Configuration
pub use crate::config::{AnalyzerConfig, Config, PlaybackConfig};

// Error types
pub use crate::error::{
    AnalyzeError, ConfigError, EvaluationError, GraphError, ModelError, PlaybackError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
