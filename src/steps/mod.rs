//! Workflow steps and the stock pipelines built from them.
//!
//! Each step implements [`Step`](crate::engine::Step), populates exactly one
//! slot of the [`WorkflowState`](crate::state::WorkflowState), and is atomic:
//! it writes its slot only after all of its generation calls succeeded, so a
//! mid-batch failure leaves the slot absent and surfaces as one error-log
//! entry.

pub mod ad_copy;
pub mod email;
pub mod email_assets;
pub mod flow;
pub mod images;
pub mod package;
pub mod plan;
pub mod social;
pub mod sms;
pub mod ugc;
pub mod visuals;

pub use ad_copy::AdCopyStep;
pub use email::EmailGenerationStep;
pub use email_assets::EmailAssetStep;
pub use flow::FlowCompositionStep;
pub use images::ImageGenerationStep;
pub use package::PackagingStep;
pub use plan::{BrandAnalysisStep, CampaignPlanStep, ContentStrategyStep};
pub use social::SocialCaptionStep;
pub use sms::SmsGenerationStep;
pub use ugc::UgcScriptStep;
pub use visuals::VisualGenerationStep;

use crate::engine::WorkflowEngine;
use crate::error::Result;
use crate::events::{emit, Event};
use crate::generation::{
    with_backoff, with_backoff_image, Completion, CompletionRequest, ImageHandle, ImageRequest,
};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{CampaignParameters, RunResult};
use std::time::Duration;

/// Issue a completion call with retry, emitting generation events.
pub(crate) async fn complete(
    ctx: &RunCtx,
    step: &str,
    what: &str,
    request: &CompletionRequest,
) -> Result<Completion> {
    emit(
        &ctx.event_handler,
        Event::GenerationCall {
            step: step.to_string(),
            what: what.to_string(),
        },
    );
    let handler = ctx.event_handler.clone();
    let step_name = step.to_string();
    let mut on_retry = move |attempt: u32, delay: Duration, reason: &str| {
        emit(
            &handler,
            Event::TransportRetry {
                name: step_name.clone(),
                attempt,
                delay_ms: delay.as_millis() as u64,
                reason: reason.to_string(),
            },
        );
    };
    with_backoff(
        &ctx.service,
        &ctx.client,
        request,
        &ctx.backoff,
        ctx.cancel_flag(),
        Some(&mut on_retry),
    )
    .await
}

/// Issue an image-synthesis call with retry, emitting generation events.
pub(crate) async fn synthesize(
    ctx: &RunCtx,
    step: &str,
    what: &str,
    request: &ImageRequest,
) -> Result<ImageHandle> {
    emit(
        &ctx.event_handler,
        Event::GenerationCall {
            step: step.to_string(),
            what: what.to_string(),
        },
    );
    let handler = ctx.event_handler.clone();
    let step_name = step.to_string();
    let mut on_retry = move |attempt: u32, delay: Duration, reason: &str| {
        emit(
            &handler,
            Event::TransportRetry {
                name: step_name.clone(),
                attempt,
                delay_ms: delay.as_millis() as u64,
                reason: reason.to_string(),
            },
        );
    };
    with_backoff_image(
        &ctx.service,
        &ctx.client,
        request,
        &ctx.backoff,
        ctx.cancel_flag(),
        Some(&mut on_retry),
    )
    .await
}

/// The standard marketing-automation pipeline: brand analysis, strategy,
/// planning, email and SMS generation, campaign visuals, and flow
/// composition.
pub fn marketing_automation_pipeline() -> Result<WorkflowEngine> {
    WorkflowEngine::builder()
        .add_step(Box::new(BrandAnalysisStep::default()))
        .add_step(Box::new(ContentStrategyStep))
        .add_step(Box::new(CampaignPlanStep))
        .add_step(Box::new(EmailGenerationStep))
        .add_step(Box::new(SmsGenerationStep))
        .add_step(Box::new(VisualGenerationStep))
        .add_step(Box::new(FlowCompositionStep))
        .build()
}

/// The standard content-generation pipeline: brand analysis, strategy, then
/// the requested content types, finishing with asset packaging.
pub fn content_generation_pipeline() -> Result<WorkflowEngine> {
    WorkflowEngine::builder()
        .add_step(Box::new(BrandAnalysisStep::default()))
        .add_step(Box::new(ContentStrategyStep))
        .add_step(Box::new(AdCopyStep))
        .add_step(Box::new(SocialCaptionStep))
        .add_step(Box::new(ImageGenerationStep))
        .add_step(Box::new(UgcScriptStep))
        .add_step(Box::new(EmailAssetStep))
        .add_step(Box::new(PackagingStep))
        .build()
}

/// Run the marketing-automation pipeline end to end.
pub async fn run_marketing_automation(
    ctx: &RunCtx,
    parameters: CampaignParameters,
) -> Result<RunResult> {
    let engine = marketing_automation_pipeline()?;
    Ok(engine.run(ctx, WorkflowState::new(parameters)).await)
}

/// Run the content-generation pipeline end to end.
pub async fn run_content_generation(
    ctx: &RunCtx,
    parameters: CampaignParameters,
) -> Result<RunResult> {
    let engine = content_generation_pipeline()?;
    Ok(engine.run(ctx, WorkflowState::new(parameters)).await)
}
