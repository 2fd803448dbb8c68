//! Flow composition step: turns generated messages into the delivery
//! timeline.

use crate::compose::SequenceComposer;
use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;

/// Composes the campaign flow from whatever messages earlier steps
/// produced.
///
/// Pure computation over the state; absent email or SMS slots compose as
/// empty collections, so this step succeeds even when every generation step
/// failed.
pub struct FlowCompositionStep;

impl Step for FlowCompositionStep {
    fn name(&self) -> &str {
        "compose_flow"
    }

    fn label(&self) -> &str {
        "Flow composition"
    }

    fn run<'a>(&'a self, _ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = super::email::effective_plan(state);
            let emails = state.emails.clone().unwrap_or_default();
            let sms = state.sms.clone().unwrap_or_default();

            let flow = SequenceComposer::new().compose(&plan, &emails, &sms);
            tracing::debug!(flow_id = %flow.flow_id, steps = flow.step_count(), "flow composed");
            state.campaign_flow = Some(flow);
            Ok(())
        })
    }
}
