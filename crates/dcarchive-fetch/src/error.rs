use thiserror::Error;

/// Errors that abort a discovery run.
///
/// Probe misses never show up here; see [`crate::Probe`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    /// A strategy was configured with a version it cannot walk from.
    #[error("malformed version {version:?}: expected major.minor.patch")]
    MalformedVersion { version: String },

    /// The discovery configuration is invalid.
    #[error("invalid discovery configuration: {message}")]
    Config { message: String },

    /// The persistence layer rejected a record.
    #[error("persisting records failed: {0}")]
    Sink(#[from] SinkError),

    /// The run was cancelled before it completed.
    #[error("discovery run cancelled")]
    Cancelled,
}

/// Failure reported by an [`crate::ArchiveSink`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
