//! Event system for workflow lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a run. The engine emits
//! events as steps start, skip, fail, and finish; the generation layer emits
//! events for provider calls and transport retries. Users can implement
//! [`EventHandler`] to receive these for logging or progress UIs.

use std::sync::Arc;

/// Events emitted during a workflow run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A workflow step has started executing.
    StepStart {
        /// Machine name of the step.
        name: String,
        /// 0-based position in the pipeline.
        index: usize,
        /// Total steps in the pipeline.
        total: usize,
    },
    /// A workflow step finished.
    StepEnd {
        name: String,
        /// Whether the step populated its slot. A `false` here corresponds
        /// to one entry appended to the run's error log.
        ok: bool,
    },
    /// A step's `applies` predicate declined; the step was skipped.
    /// Skipping is not a failure and logs no error.
    StepSkipped { name: String },
    /// A generation call is being issued to the provider.
    GenerationCall {
        /// Step issuing the call.
        step: String,
        /// Short description, e.g. `"email 2/3"` or `"hero_image"`.
        what: String,
    },
    /// A transport-level retry due to a transient provider error.
    TransportRetry {
        /// Operation description.
        name: String,
        /// The retry attempt number (1-indexed).
        attempt: u32,
        /// Delay before this retry attempt in milliseconds.
        delay_ms: u64,
        /// Reason for the retry (error description).
        reason: String,
    },
}

/// Handler for workflow lifecycle events.
///
/// Entirely optional; the engine works without one.
///
/// # Example
///
/// ```
/// use campaign_pipeline::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StepStart { name, index, total } => {
///                 println!("[{}/{}] {}", index + 1, total, name)
///             }
///             Event::StepEnd { name, ok } => println!("{} ok={}", name, ok),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the engine or a step emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use campaign_pipeline::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::StepSkipped { name } = event {
///         println!("skipped {}", name);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
