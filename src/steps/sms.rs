//! SMS sequence generation.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::parse::{extract_tags, parse_sms};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{Channel, MessagePlan, MessageUnit};

/// Generates the SMS sequence.
///
/// Same atomicity contract as email generation. Messages are normalized to
/// the 160-character limit and delays follow the SMS delay table.
pub struct SmsGenerationStep;

impl Step for SmsGenerationStep {
    fn name(&self) -> &str {
        "generate_sms"
    }

    fn label(&self) -> &str {
        "SMS generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.num_sms > 0
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = super::email::effective_plan(state);
            let strategy_block = state
                .content_strategy
                .as_ref()
                .map(|s| s.prompt_block(&plan.brand_name))
                .unwrap_or_else(|| format!("Brand: {}", plan.brand_name));

            let total = state.parameters.num_sms;
            let mut messages = Vec::with_capacity(total as usize);

            for i in 0..total {
                let message_plan = plan
                    .sms_plans
                    .get(i as usize)
                    .cloned()
                    .unwrap_or_else(|| MessagePlan::follow_up(i + 1));

                let prompt = format!(
                    "Write SMS {} of {} for a {} campaign.\n\n{}\n\n\
                     Purpose: {}\nFocus: {}\n\n\
                     Include opt-out instructions such as \"Reply STOP to opt out\". \
                     Respond with one line:\nMessage: <message under 160 \
                     characters, may use {{{{first_name}}}} personalization>",
                    i + 1,
                    total,
                    plan.campaign_type,
                    strategy_block,
                    message_plan.purpose,
                    message_plan.focus,
                );
                let request = CompletionRequest::new(
                    prompt,
                    "You are an SMS marketing copywriter. Keep messages under 160 characters.",
                )
                .with_max_tokens(256);

                let completion = super::complete(
                    ctx,
                    self.name(),
                    &format!("sms {}/{}", i + 1, total),
                    &request,
                )
                .await?;

                let text = parse_sms(&completion.text);
                if !has_opt_out(&text) {
                    tracing::warn!(sequence = i + 1, "SMS is missing opt-out instructions");
                }
                let mut unit = MessageUnit::sms(i + 1, text)
                    .with_delay(Channel::Sms.delay_for_position(i + 1));
                unit.purpose = message_plan.purpose;
                unit.focus = message_plan.focus;
                unit.personalization = extract_tags(&unit.body);
                messages.push(unit);

                if i + 1 < total {
                    ctx.pace().await;
                }
            }

            state.sms = Some(messages);
            Ok(())
        })
    }
}

/// Carrier compliance wants every marketing SMS to carry opt-out
/// instructions.
fn has_opt_out(message: &str) -> bool {
    let lowered = message.to_lowercase();
    ["text stop", "reply stop", "stop to opt", "unsubscribe"]
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::MockGeneration;
    use crate::parse::SMS_MAX_CHARS;
    use crate::types::{CampaignParameters, CampaignType};
    use std::sync::Arc;

    fn state(num_sms: u32) -> WorkflowState {
        WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::WinBack)
                .with_counts(0, num_sms),
        )
    }

    #[tokio::test]
    async fn test_generates_with_sms_delay_table_and_length_cap() {
        let long_tail = "x".repeat(200);
        let service = Arc::new(MockGeneration::fixed(format!(
            "Message: We miss you {{{{first_name}}}}! Come back for 20% off. {}",
            long_tail
        )));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state(2);
        SmsGenerationStep.run(&ctx, &mut st).await.unwrap();

        let messages = st.sms.as_ref().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].delay_hours, Some(2));
        assert_eq!(messages[1].delay_hours, Some(48));
        assert!(messages[0].body.len() <= SMS_MAX_CHARS);
        assert_eq!(messages[0].personalization, vec!["first_name"]);
        assert!(messages[0].subject.is_none());
    }

    #[tokio::test]
    async fn test_atomic_on_failure() {
        let service = Arc::new(MockGeneration::failing(502, "bad gateway"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state(1);
        assert!(SmsGenerationStep.run(&ctx, &mut st).await.is_err());
        assert!(st.sms.is_none());
    }

    #[test]
    fn test_opt_out_detection() {
        assert!(has_opt_out("20% off today. Reply STOP to opt out."));
        assert!(has_opt_out("Deals inside. Unsubscribe anytime."));
        assert!(!has_opt_out("We miss you! Come back for 20% off."));
    }

    #[test]
    fn test_skipped_when_zero_requested() {
        assert!(!SmsGenerationStep.applies(&state(0)));
    }
}
