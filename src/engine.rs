//! Workflow engine: a straight-line pipeline with per-step failure isolation.
//!
//! [`WorkflowEngine`] executes a fixed, ordered list of named steps against
//! one [`WorkflowState`]. A step that fails has its error appended to the
//! state's error log and the run proceeds to the next step with the state
//! otherwise unchanged; one failing content type never prevents delivery of
//! the others. The engine performs no branching, no loops, and no retries of
//! its own (transient provider retries live in the generation layer).

use crate::error::Result;
use crate::events::{emit, Event};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::RunResult;
use crate::EngineError;
use std::future::Future;
use std::pin::Pin;

/// A boxed, pinned, Send future — the return type of [`Step::run`].
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe trait for workflow steps.
///
/// A step reads and mutates the shared [`WorkflowState`]. It must either
/// fully populate its result slot or return an error and leave the slot
/// absent; partial writes must not appear in the state.
pub trait Step: Send + Sync {
    /// Stable machine name (e.g. `"generate_emails"`).
    fn name(&self) -> &str;

    /// Human-readable name used in error-log entries
    /// (e.g. `"Email generation"`).
    fn label(&self) -> &str;

    /// Whether this step should run for the given state. Steps whose
    /// content type was not requested decline here; skipping is not a
    /// failure and logs no error.
    fn applies(&self, _state: &WorkflowState) -> bool {
        true
    }

    /// Execute the step.
    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>>;
}

/// Type alias for the closure wrapped by [`FnStep`].
pub type StepFn = Box<
    dyn for<'a> Fn(&'a RunCtx, &'a mut WorkflowState) -> BoxFut<'a, Result<()>> + Send + Sync,
>;

/// A [`Step`] backed by a closure. Used for tests and one-off pipelines.
pub struct FnStep {
    name: String,
    label: String,
    f: StepFn,
}

impl FnStep {
    pub fn new(name: impl Into<String>, label: impl Into<String>, f: StepFn) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            f,
        }
    }
}

impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        (self.f)(ctx, state)
    }
}

/// Straight-line workflow pipeline executor.
///
/// State machine: "running step i" with forward-only transitions; terminal
/// state "complete" after the last step regardless of any step's success.
///
/// # Example
///
/// ```no_run
/// use campaign_pipeline::{RunCtx, WorkflowEngine, WorkflowState};
/// use campaign_pipeline::steps::marketing_automation_pipeline;
/// use campaign_pipeline::types::{CampaignParameters, CampaignType};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = marketing_automation_pipeline()?;
/// let ctx = RunCtx::builder().build();
/// let params = CampaignParameters::new("https://acme.com", CampaignType::CartAbandonment);
/// let result = engine.run(&ctx, WorkflowState::new(params)).await;
/// println!("{} errors", result.errors.len());
/// # Ok(())
/// # }
/// ```
pub struct WorkflowEngine {
    steps: Vec<Box<dyn Step>>,
}

impl WorkflowEngine {
    /// Create a new engine builder.
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder { steps: Vec::new() }
    }

    /// Names of the configured steps, in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Execute all steps in order and finalize the state.
    ///
    /// Never returns an error: per-step failures are recorded in the
    /// result's error log. A cancellation requested mid-run finalizes early
    /// with a recorded error for the remaining steps.
    pub async fn run(&self, ctx: &RunCtx, mut state: WorkflowState) -> RunResult {
        let total = self.steps.len();

        for (index, step) in self.steps.iter().enumerate() {
            if ctx.is_cancelled() {
                state.push_error(format!(
                    "Run cancelled before step '{}'; remaining steps skipped",
                    step.name()
                ));
                break;
            }

            if !step.applies(&state) {
                tracing::debug!(step = step.name(), "step skipped");
                emit(
                    &ctx.event_handler,
                    Event::StepSkipped {
                        name: step.name().to_string(),
                    },
                );
                continue;
            }

            emit(
                &ctx.event_handler,
                Event::StepStart {
                    name: step.name().to_string(),
                    index,
                    total,
                },
            );
            tracing::debug!(step = step.name(), index, total, "step start");

            match step.run(ctx, &mut state).await {
                Ok(()) => {
                    emit(
                        &ctx.event_handler,
                        Event::StepEnd {
                            name: step.name().to_string(),
                            ok: true,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(step = step.name(), error = %e, "step failed");
                    state.push_error(format!("{} failed: {}", step.label(), e));
                    emit(
                        &ctx.event_handler,
                        Event::StepEnd {
                            name: step.name().to_string(),
                            ok: false,
                        },
                    );
                }
            }
        }

        state.into_result()
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Builder for [`WorkflowEngine`].
pub struct WorkflowEngineBuilder {
    steps: Vec<Box<dyn Step>>,
}

impl WorkflowEngineBuilder {
    /// Append a step to the pipeline.
    pub fn add_step(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Build the engine, validating configuration.
    ///
    /// An empty pipeline is the top-level run error of this crate: the only
    /// failure mode that surfaces as `Err` rather than an error-log entry.
    pub fn build(self) -> Result<WorkflowEngine> {
        if self.steps.is_empty() {
            return Err(EngineError::InvalidConfig(
                "Pipeline must have at least one step".to_string(),
            ));
        }
        Ok(WorkflowEngine { steps: self.steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CampaignParameters, CampaignType, MessageUnit};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn state() -> WorkflowState {
        WorkflowState::new(CampaignParameters::new(
            "https://acme.com",
            CampaignType::WelcomeSeries,
        ))
    }

    fn ok_step(name: &str, label: &str) -> Box<dyn Step> {
        let slot_name = name.to_string();
        Box::new(FnStep::new(
            name,
            label,
            Box::new(move |_ctx, st| {
                let slot_name = slot_name.clone();
                Box::pin(async move {
                    match slot_name.as_str() {
                        "emails" => st.emails = Some(vec![MessageUnit::email(1, "Hi", "Body")]),
                        "sms" => st.sms = Some(vec![MessageUnit::sms(1, "Hi")]),
                        _ => {}
                    }
                    Ok(())
                })
            }),
        ))
    }

    fn failing_step(name: &str, label: &str) -> Box<dyn Step> {
        Box::new(FnStep::new(
            name,
            label,
            Box::new(|_ctx, _st| {
                Box::pin(async {
                    Err(EngineError::Provider {
                        status: 429,
                        body: "rate limited".into(),
                        retry_after: None,
                    })
                })
            }),
        ))
    }

    #[test]
    fn test_empty_pipeline_is_top_level_error() {
        let result = WorkflowEngine::builder().build();
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_single_failing_step_isolated() {
        // P1: one forced failure, N-1 populated slots, one error naming it.
        let engine = WorkflowEngine::builder()
            .add_step(ok_step("emails", "Email generation"))
            .add_step(failing_step("visuals", "Visual generation"))
            .add_step(ok_step("sms", "SMS generation"))
            .build()
            .unwrap();

        let ctx = RunCtx::builder().build();
        let result = engine.run(&ctx, state()).await;

        assert!(result.emails.is_some());
        assert!(result.sms.is_some());
        assert!(result.visuals.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Visual generation failed:"));
        assert!(result.errors[0].contains("429"));
    }

    #[tokio::test]
    async fn test_all_steps_failing_still_completes() {
        let engine = WorkflowEngine::builder()
            .add_step(failing_step("a", "Step A"))
            .add_step(failing_step("b", "Step B"))
            .build()
            .unwrap();

        let ctx = RunCtx::builder().build();
        let result = engine.run(&ctx, state()).await;

        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("Step A failed:"));
        assert!(result.errors[1].starts_with("Step B failed:"));
        assert!(result.emails.is_none());
    }

    struct ConditionalStep;

    impl Step for ConditionalStep {
        fn name(&self) -> &str {
            "sms"
        }
        fn label(&self) -> &str {
            "SMS generation"
        }
        fn applies(&self, state: &WorkflowState) -> bool {
            state.parameters.num_sms > 0
        }
        fn run<'a>(
            &'a self,
            _ctx: &'a RunCtx,
            state: &'a mut WorkflowState,
        ) -> BoxFut<'a, Result<()>> {
            Box::pin(async move {
                state.sms = Some(vec![MessageUnit::sms(1, "Hi")]);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_skipped_step_logs_no_error() {
        let engine = WorkflowEngine::builder()
            .add_step(Box::new(ConditionalStep))
            .build()
            .unwrap();

        let ctx = RunCtx::builder().build();
        let mut st = state();
        st.parameters.num_sms = 0;
        let result = engine.run(&ctx, st).await;

        assert!(result.sms.is_none());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_skip_events_emitted() {
        use crate::events::{Event, FnEventHandler};
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let handler = Arc::new(FnEventHandler(move |event: Event| {
            if let Event::StepSkipped { name } = event {
                seen_clone.lock().unwrap().push(name);
            }
        }));

        let engine = WorkflowEngine::builder()
            .add_step(Box::new(ConditionalStep))
            .build()
            .unwrap();

        let ctx = RunCtx::builder().event_handler(handler).build();
        let mut st = state();
        st.parameters.num_sms = 0;
        engine.run(&ctx, st).await;

        assert_eq!(*seen.lock().unwrap(), vec!["sms".to_string()]);
    }

    #[tokio::test]
    async fn test_cancellation_finalizes_early() {
        let cancel = Arc::new(AtomicBool::new(true));
        let engine = WorkflowEngine::builder()
            .add_step(ok_step("emails", "Email generation"))
            .build()
            .unwrap();

        let ctx = RunCtx::builder().cancellation(Some(cancel.clone())).build();
        let result = engine.run(&ctx, state()).await;

        assert!(result.emails.is_none());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("cancelled"));
        cancel.store(false, Ordering::Relaxed);
    }
}
