//! Execution context shared across workflow steps.
//!
//! [`RunCtx`] carries the HTTP client, generation service, backoff policy,
//! pacing delay, cancellation handle, and optional event handler. It is
//! constructed once and shared by every step of a run.

use crate::events::EventHandler;
use crate::generation::{BackoffConfig, GenerationService, MockGeneration};
use reqwest::Client;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

/// Shared execution context for workflow steps.
///
/// # Example
///
/// ```
/// use campaign_pipeline::RunCtx;
/// use campaign_pipeline::generation::{BackoffConfig, RemoteGeneration};
/// use std::sync::Arc;
///
/// let ctx = RunCtx::builder()
///     .service(Arc::new(
///         RemoteGeneration::new("https://api.groq.com/openai", "llama3-8b-8192"),
///     ))
///     .backoff(BackoffConfig::standard())
///     .build();
/// ```
pub struct RunCtx {
    /// HTTP client (cheap to clone, uses `Arc` internally).
    pub client: Client,
    /// Generation service used by all content steps.
    pub service: Arc<dyn GenerationService>,
    /// Transport retry configuration. Default: [`BackoffConfig::none()`].
    pub backoff: BackoffConfig,
    /// Pause between sibling generation calls within one step, to respect
    /// upstream rate limits. Default: zero.
    pub pacing: Duration,
    /// Optional cancellation flag; the engine checks it between steps and
    /// the backoff loop checks it between attempts.
    pub cancellation: Option<Arc<AtomicBool>>,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl RunCtx {
    /// Create a new builder.
    pub fn builder() -> RunCtxBuilder {
        RunCtxBuilder {
            client: None,
            service: None,
            backoff: None,
            pacing: Duration::ZERO,
            cancellation: None,
            event_handler: None,
            timeout: None,
        }
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Get a reference to the cancellation flag, if set.
    pub fn cancel_flag(&self) -> Option<&AtomicBool> {
        self.cancellation.as_deref()
    }

    /// Sleep for the configured pacing delay, if any.
    pub async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}

impl std::fmt::Debug for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCtx")
            .field("service", &self.service.name())
            .field("backoff", &self.backoff)
            .field("pacing", &self.pacing)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`RunCtx`].
pub struct RunCtxBuilder {
    client: Option<Client>,
    service: Option<Arc<dyn GenerationService>>,
    backoff: Option<BackoffConfig>,
    pacing: Duration,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl RunCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the generation service. Default: a fixed-response mock, so tests
    /// and dry runs work without a live provider.
    pub fn service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Set the transport retry configuration. Default: [`BackoffConfig::none()`].
    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = Some(config);
        self
    }

    /// Set the pause between sibling generation calls within one step.
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the cancellation flag.
    pub fn cancellation(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancellation = cancel;
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout for the default client. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> RunCtx {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(60));
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client")
        });
        RunCtx {
            client,
            service: self
                .service
                .unwrap_or_else(|| Arc::new(MockGeneration::fixed("placeholder response"))),
            backoff: self.backoff.unwrap_or_else(BackoffConfig::none),
            pacing: self.pacing,
            cancellation: self.cancellation,
            event_handler: self.event_handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ctx = RunCtx::builder().build();
        assert_eq!(ctx.service.name(), "mock");
        assert_eq!(ctx.backoff.max_retries, 0);
        assert!(ctx.pacing.is_zero());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_cancellation_flag() {
        let cancel = Arc::new(AtomicBool::new(false));
        let ctx = RunCtx::builder().cancellation(Some(cancel.clone())).build();
        assert!(!ctx.is_cancelled());
        cancel.store(true, Ordering::Relaxed);
        assert!(ctx.is_cancelled());
    }
}
