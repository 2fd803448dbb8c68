//! Generation service trait and normalized request/response types.
//!
//! The [`GenerationService`] trait abstracts over text-completion and
//! image-synthesis providers, translating between normalized request types
//! and provider-specific HTTP APIs. Transient failures are retried here with
//! exponential backoff; once the budget is exhausted the error surfaces at
//! the step boundary and becomes a run error-log entry, never a panic or an
//! aborted run.
//!
//! Built-in implementations: [`RemoteGeneration`] (OpenAI-compatible chat
//! API plus an image endpoint) and [`MockGeneration`] for tests.

pub mod backoff;
pub mod mock;
pub mod remote;

pub use backoff::BackoffConfig;
pub use mock::MockGeneration;
pub use remote::RemoteGeneration;

use crate::error::Result;
use crate::EngineError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Callback invoked before each transport retry:
/// `(attempt_number, delay_before_retry, reason)`.
pub type RetryCallback<'a> = Option<&'a mut (dyn FnMut(u32, std::time::Duration, &str) + Send)>;

/// A normalized text-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The user prompt text.
    pub prompt: String,

    /// System context message framing the model's role.
    pub system_message: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, system_message: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: system_message.into(),
            max_tokens: 2048,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A normalized text-completion response.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,
}

/// A normalized image-synthesis request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Visual description of the image to synthesize.
    pub prompt: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.into(),
            width,
            height,
        }
    }

    /// `"WIDTHxHEIGHT"` dimension string used on image assets.
    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Handle to a synthesized image.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    /// Provider-assigned identifier.
    pub id: String,

    /// Location of the rendered image, if the provider hosts it.
    pub url: Option<String>,

    pub width: u32,
    pub height: u32,
}

/// Abstraction over text-completion and image-synthesis providers.
///
/// Implementors translate the normalized request types into the provider's
/// HTTP API. Both calls fail with [`EngineError::Provider`] on non-success
/// statuses; transient failures are the caller's to retry via
/// [`with_backoff`] / [`with_backoff_image`].
///
/// Object-safe; designed to be used as `Arc<dyn GenerationService>`.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Execute a text-completion call.
    async fn complete(&self, client: &Client, request: &CompletionRequest) -> Result<Completion>;

    /// Execute an image-synthesis call.
    async fn synthesize(&self, client: &Client, request: &ImageRequest) -> Result<ImageHandle>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Check whether an error is retryable under the given backoff config.
///
/// Retryable conditions:
/// - [`EngineError::Provider`] with a status in `config.retryable_statuses`
/// - [`EngineError::Request`] (connection/transport errors)
pub fn is_retryable(error: &EngineError, config: &BackoffConfig) -> bool {
    match error {
        EngineError::Provider { status, .. } => config.retryable_statuses.contains(status),
        EngineError::Request(_) => true,
        _ => false,
    }
}

/// Execute a completion call with transport-level retry.
///
/// Returns the first successful response, or the last error once the retry
/// budget is exhausted. The cancellation flag is checked before each attempt
/// and again after each backoff sleep.
pub async fn with_backoff(
    service: &Arc<dyn GenerationService>,
    client: &Client,
    request: &CompletionRequest,
    config: &BackoffConfig,
    cancel: Option<&std::sync::atomic::AtomicBool>,
    mut on_retry: RetryCallback<'_>,
) -> Result<Completion> {
    let mut last_error: Option<EngineError> = None;

    for attempt in 0..=config.max_retries {
        if let Some(flag) = cancel {
            if flag.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }
        }

        if attempt > 0 {
            let delay = retry_delay(&last_error, config, attempt);
            let reason = last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            if let Some(ref mut cb) = on_retry {
                cb(attempt, delay, &reason);
            }
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %reason, "retrying completion");
            tokio::time::sleep(delay).await;

            if let Some(flag) = cancel {
                if flag.load(std::sync::atomic::Ordering::Relaxed) {
                    return Err(EngineError::Cancelled);
                }
            }
        }

        match service.complete(client, request).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt < config.max_retries && is_retryable(&e, config) {
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or(EngineError::Other(
        "backoff loop exited unexpectedly".into(),
    )))
}

/// Execute an image-synthesis call with transport-level retry.
///
/// Same policy as [`with_backoff`].
pub async fn with_backoff_image(
    service: &Arc<dyn GenerationService>,
    client: &Client,
    request: &ImageRequest,
    config: &BackoffConfig,
    cancel: Option<&std::sync::atomic::AtomicBool>,
    mut on_retry: RetryCallback<'_>,
) -> Result<ImageHandle> {
    let mut last_error: Option<EngineError> = None;

    for attempt in 0..=config.max_retries {
        if let Some(flag) = cancel {
            if flag.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(EngineError::Cancelled);
            }
        }

        if attempt > 0 {
            let delay = retry_delay(&last_error, config, attempt);
            let reason = last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            if let Some(ref mut cb) = on_retry {
                cb(attempt, delay, &reason);
            }
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %reason, "retrying synthesis");
            tokio::time::sleep(delay).await;

            if let Some(flag) = cancel {
                if flag.load(std::sync::atomic::Ordering::Relaxed) {
                    return Err(EngineError::Cancelled);
                }
            }
        }

        match service.synthesize(client, request).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt < config.max_retries && is_retryable(&e, config) {
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or(EngineError::Other(
        "backoff loop exited unexpectedly".into(),
    )))
}

/// Delay before retry `attempt`, honoring `Retry-After` when configured.
fn retry_delay(
    last_error: &Option<EngineError>,
    config: &BackoffConfig,
    attempt: u32,
) -> std::time::Duration {
    if let Some(EngineError::Provider {
        retry_after: Some(ra),
        ..
    }) = last_error
    {
        if config.respect_retry_after {
            return *ra;
        }
    }
    config.delay_for_attempt(attempt - 1)
}
