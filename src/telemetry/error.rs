//! Error taxonomy for the telemetry client.

use thiserror::Error;

/// Fatal startup errors. Building the client handle cannot proceed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required configuration value is absent or blank.
    #[error("missing required telemetry setting: {0}")]
    Missing(&'static str),

    /// The ingestion API host is not a valid base URL.
    #[error("invalid telemetry API host '{host}': {reason}")]
    InvalidApiHost { host: String, reason: String },

    /// The batch sender needs a tokio runtime to run on.
    #[error("telemetry client must be built inside a tokio runtime")]
    NoRuntime,

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build telemetry HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Local host name lookup failed. Startup continues without the host field.
#[derive(Debug, Error)]
pub enum HostResolutionError {
    #[error("failed to resolve local host name: {0}")]
    Lookup(#[from] std::io::Error),

    #[error("local host name is not valid UTF-8")]
    NotUtf8,
}

/// Errors raised when handing an event to the transmission.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The pending queue is at capacity; the event was dropped.
    #[error("telemetry queue is full, event dropped")]
    QueueFull,

    /// The client has been closed.
    #[error("telemetry client is closed")]
    Closed,

    /// Events with no fields are rejected.
    #[error("refusing to send an event with no fields")]
    EmptyEvent,
}

impl TransportError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TransportError::QueueFull => "queue_full",
            TransportError::Closed => "closed",
            TransportError::EmptyEvent => "empty",
        }
    }
}
