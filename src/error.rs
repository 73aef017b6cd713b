use std::time::Duration;
use thiserror::Error;

/// Reasons the recording analyzer gives up. Every failure aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("The recording has no usable final URL")]
    NoUrl,

    #[error("No email address was found in any recorded request parameter")]
    NoEmailAddress,

    #[error("The response body of request '{entry_id}' is not a JSON object")]
    CannotParseResponseBody { entry_id: String },

    #[error("No response value of request '{entry_id}' matches the final URL")]
    NoId { entry_id: String },

    #[error("Id '{id}' could not be located in the response body of request '{entry_id}'")]
    NoPathFromEmailToId { entry_id: String, id: String },

    #[error("No later request uses id '{id}'")]
    NoEntriesWithId { id: String },
}

impl AnalyzeError {
    /// The stable snake_case error code.
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::NoUrl => "no_url",
            AnalyzeError::NoEmailAddress => "no_email_address",
            AnalyzeError::CannotParseResponseBody { .. } => "cannot_parse_response_body",
            AnalyzeError::NoId { .. } => "no_id",
            AnalyzeError::NoPathFromEmailToId { .. } => "no_path_from_email_to_id",
            AnalyzeError::NoEntriesWithId { .. } => "no_entries_with_id",
        }
    }
}

/// Errors raised while evaluating a computed value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Request '{request_id}' was referenced before it was executed")]
    UnresolvedRequest { request_id: String },
}

/// Structural problems in a request dependency graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Request id '{0}' is used more than once")]
    DuplicateRequestId(String),

    #[error("Request '{referenced}' is referenced by '{referrer}' but does not exist")]
    UnknownRequest { referrer: String, referenced: String },

    #[error("Dependency cycle detected at request '{0}'")]
    Cycle(String),
}

/// Errors that abort a playback. No partial results are returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Request '{referenced}' is referenced by '{referrer}' but is not part of the data source")]
    UnknownRequest { referrer: String, referenced: String },

    #[error("Dependency cycle detected at request '{request_id}'")]
    Cycle { request_id: String },

    #[error("Request id '{0}' is used more than once")]
    DuplicateRequestId(String),

    #[error("The URL of request '{request_id}' evaluated to undefined")]
    UndefinedUrl { request_id: String },

    #[error("Transport failed for request '{request_id}': {message}")]
    Transport { request_id: String, message: String },

    #[error("Request '{request_id}' returned HTTP status {status}")]
    UnexpectedStatus { request_id: String, status: u16 },

    #[error("Response of request '{request_id}' is not valid JSON: {message}")]
    MalformedResponse { request_id: String, message: String },

    #[error("Request '{request_id}' timed out after {after:?}")]
    Timeout { request_id: String, after: Duration },

    #[error("Playback was cancelled before request '{request_id}' completed")]
    Cancelled { request_id: String },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl From<GraphError> for PlaybackError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::DuplicateRequestId(id) => PlaybackError::DuplicateRequestId(id),
            GraphError::UnknownRequest {
                referrer,
                referenced,
            } => PlaybackError::UnknownRequest {
                referrer,
                referenced,
            },
            GraphError::Cycle(request_id) => PlaybackError::Cycle { request_id },
        }
    }
}

/// Structural problems in a data source or a persisted file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid request graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(String),

    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors loading configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
