//! Email sequence generation.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::parse::{extract_tags, parse_email};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{CampaignPlan, Channel, MessagePlan, MessageUnit};

/// Generates the email sequence, one completion call per message.
///
/// The batch is atomic: the `emails` slot is written only after every
/// message generated successfully. Delays follow the campaign delay table
/// for the email channel.
pub struct EmailGenerationStep;

impl Step for EmailGenerationStep {
    fn name(&self) -> &str {
        "generate_emails"
    }

    fn label(&self) -> &str {
        "Email generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.num_emails > 0
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = effective_plan(state);
            let strategy_block = state
                .content_strategy
                .as_ref()
                .map(|s| s.prompt_block(&plan.brand_name))
                .unwrap_or_else(|| format!("Brand: {}", plan.brand_name));

            let total = state.parameters.num_emails;
            let mut emails = Vec::with_capacity(total as usize);

            for i in 0..total {
                let message_plan = plan
                    .email_plans
                    .get(i as usize)
                    .cloned()
                    .unwrap_or_else(|| MessagePlan::follow_up(i + 1));

                let prompt = format!(
                    "Write email {} of {} for a {} campaign.\n\n{}\n\n\
                     Purpose: {}\nFocus: {}\n\n\
                     Format your response with these labeled lines followed by \
                     the body:\nSubject: <subject line>\nPreview: <preview text>\n\
                     <email body, may use {{{{first_name}}}} personalization>\n\
                     CTA: <call to action>",
                    i + 1,
                    total,
                    plan.campaign_type,
                    strategy_block,
                    message_plan.purpose,
                    message_plan.focus,
                );
                let request = CompletionRequest::new(
                    prompt,
                    "You are an email marketing copywriter. Follow the requested format exactly.",
                );

                let completion = super::complete(
                    ctx,
                    self.name(),
                    &format!("email {}/{}", i + 1, total),
                    &request,
                )
                .await?;

                let parsed = parse_email(&completion.text);
                let mut unit = MessageUnit::email(i + 1, parsed.subject, parsed.body)
                    .with_delay(Channel::Email.delay_for_position(i + 1));
                unit.preview_text = parsed.preview;
                unit.cta = parsed.cta;
                unit.purpose = message_plan.purpose;
                unit.focus = message_plan.focus;
                unit.personalization = extract_tags(&unit.body);
                emails.push(unit);

                if i + 1 < total {
                    ctx.pace().await;
                }
            }

            state.emails = Some(emails);
            Ok(())
        })
    }
}

/// The campaign plan to generate against: the planned one, or a minimal
/// plan so message generation can proceed after a failed planning step.
pub(crate) fn effective_plan(state: &WorkflowState) -> CampaignPlan {
    state.campaign_plan.clone().unwrap_or_else(|| {
        let brand_name = state
            .brand_profile
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| crate::types::domain_name(&state.parameters.brand_url));
        CampaignPlan::minimal(state.parameters.campaign_type, brand_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::MockGeneration;
    use crate::types::{CampaignParameters, CampaignType};
    use std::sync::Arc;

    fn state(num_emails: u32) -> WorkflowState {
        WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::CartAbandonment)
                .with_counts(num_emails, 0),
        )
    }

    #[tokio::test]
    async fn test_generates_requested_count_with_delay_table() {
        let service = Arc::new(MockGeneration::fixed(
            "Subject: Come back\nPreview: Waiting for you\nHi {{first_name}},\n\nYour cart is waiting.\nCTA: Checkout now",
        ));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state(3);
        EmailGenerationStep.run(&ctx, &mut st).await.unwrap();

        let emails = st.emails.as_ref().unwrap();
        assert_eq!(emails.len(), 3);
        assert_eq!(emails[0].delay_hours, Some(1));
        assert_eq!(emails[1].delay_hours, Some(24));
        assert_eq!(emails[2].delay_hours, Some(72));
        assert_eq!(emails[0].subject.as_deref(), Some("Come back"));
        assert_eq!(emails[0].personalization, vec!["first_name"]);
        assert_eq!(emails[0].sequence, 1);
        assert_eq!(emails[2].sequence, 3);
    }

    #[tokio::test]
    async fn test_batch_is_atomic_on_failure() {
        let service = Arc::new(MockGeneration::failing(500, "boom"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state(2);
        let result = EmailGenerationStep.run(&ctx, &mut st).await;
        assert!(result.is_err());
        assert!(st.emails.is_none());
    }

    #[test]
    fn test_not_applicable_when_no_emails_requested() {
        let st = state(0);
        assert!(!EmailGenerationStep.applies(&st));
    }
}
