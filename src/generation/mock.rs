//! Mock generation service for testing without live providers.
//!
//! [`MockGeneration`] returns pre-configured completions in order and mints
//! deterministic image handles, allowing downstream consumers to write
//! deterministic tests against this crate.
//!
//! # Example
//!
//! ```
//! use campaign_pipeline::generation::MockGeneration;
//!
//! let mock = MockGeneration::new(vec!["Subject: Hello\n\nBody text".to_string()]);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;

use super::{Completion, CompletionRequest, GenerationService, ImageHandle, ImageRequest};
use crate::error::Result;
use crate::EngineError;

/// A test service that returns canned completions in order.
///
/// Cycles back to the beginning when all responses have been consumed.
/// Image synthesis mints sequential handles (`mock_img_1`, `mock_img_2`, ...)
/// without payload URLs. A failing variant simulates a provider that errors
/// on every call.
#[derive(Debug)]
pub struct MockGeneration {
    responses: Vec<String>,
    index: AtomicUsize,
    images: AtomicUsize,
    failure: Option<(u16, String)>,
}

impl MockGeneration {
    /// Create a mock with the given canned completions.
    ///
    /// Responses are returned in order, cycling when exhausted.
    pub fn new(responses: Vec<String>) -> Self {
        assert!(
            !responses.is_empty(),
            "MockGeneration requires at least one response"
        );
        Self {
            responses,
            index: AtomicUsize::new(0),
            images: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// Create a mock that always returns the same completion.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock whose every call fails with the given status.
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            responses: Vec::new(),
            index: AtomicUsize::new(0),
            images: AtomicUsize::new(0),
            failure: Some((status, body.into())),
        }
    }

    /// Number of completion calls served so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn next_response(&self) -> String {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl GenerationService for MockGeneration {
    async fn complete(&self, _client: &Client, _request: &CompletionRequest) -> Result<Completion> {
        if let Some((status, body)) = &self.failure {
            return Err(EngineError::Provider {
                status: *status,
                body: body.clone(),
                retry_after: None,
            });
        }
        Ok(Completion {
            text: self.next_response(),
            status: 200,
        })
    }

    async fn synthesize(&self, _client: &Client, request: &ImageRequest) -> Result<ImageHandle> {
        if let Some((status, body)) = &self.failure {
            return Err(EngineError::Provider {
                status: *status,
                body: body.clone(),
                retry_after: None,
            });
        }
        let n = self.images.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ImageHandle {
            id: format!("mock_img_{}", n),
            url: None,
            width: request.width,
            height: request.height,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
