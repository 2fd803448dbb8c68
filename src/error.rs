use std::time::Duration;
use thiserror::Error;

/// Errors produced by the workflow engine and its components.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A generation provider returned a non-success status, or produced an
    /// unusable response after the transport retry budget was exhausted.
    ///
    /// The `retry_after` field is populated from the `Retry-After` response
    /// header when present.
    #[error("provider error {status}: {body}")]
    Provider {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
        /// Parsed `Retry-After` header value, if present.
        retry_after: Option<Duration>,
    },

    /// A workflow step failed with a descriptive message.
    ///
    /// The engine converts this (and any other step error) into an entry in
    /// the run's error log; it never propagates past the engine boundary.
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// Structural failure in composition or packaging.
    ///
    /// Reserved for genuinely malformed inputs. Composition and packaging
    /// substitute safe defaults wherever possible, so this is rare.
    #[error("composition failed: {0}")]
    Composition(String),

    /// Invalid pipeline configuration detected at build time.
    ///
    /// This is the only whole-run failure mode: a pipeline that cannot even
    /// be constructed. Per-step errors are advisory and accumulated instead.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled via the cancellation flag.
    #[error("run was cancelled")]
    Cancelled,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
