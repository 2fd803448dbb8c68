//! Brand analysis, content strategy, and campaign planning steps.

use crate::brand::{BrandProfileProvider, HttpBrandProvider};
use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::parse::{extract_json, json_str, json_str_list};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::strategy::ContentStrategy;
use crate::types::{BrandProfile, CampaignPlan, MessagePlan};
use std::sync::Arc;

/// Resolves the brand profile for the run.
///
/// Never fails: the provider's contract guarantees a profile, degraded if
/// analysis was impossible.
pub struct BrandAnalysisStep {
    provider: Arc<dyn BrandProfileProvider>,
}

impl BrandAnalysisStep {
    pub fn new(provider: Arc<dyn BrandProfileProvider>) -> Self {
        Self { provider }
    }
}

impl Default for BrandAnalysisStep {
    fn default() -> Self {
        Self::new(Arc::new(HttpBrandProvider::new()))
    }
}

impl Step for BrandAnalysisStep {
    fn name(&self) -> &str {
        "brand_analysis"
    }

    fn label(&self) -> &str {
        "Brand analysis"
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let profile = self
                .provider
                .analyze(ctx, &state.parameters.brand_url)
                .await;
            if profile.degraded {
                tracing::info!(url = %state.parameters.brand_url, "proceeding with degraded brand profile");
            }
            state.brand_profile = Some(profile);
            Ok(())
        })
    }
}

/// Derives the content strategy from the profile and parameters.
///
/// Pure computation; cannot fail. Missing profile degrades to the fallback
/// profile first.
pub struct ContentStrategyStep;

impl Step for ContentStrategyStep {
    fn name(&self) -> &str {
        "content_strategy"
    }

    fn label(&self) -> &str {
        "Content strategy"
    }

    fn run<'a>(&'a self, _ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let profile = state
                .brand_profile
                .clone()
                .unwrap_or_else(|| BrandProfile::fallback(&state.parameters.brand_url));
            state.content_strategy = Some(ContentStrategy::derive(&state.parameters, &profile));
            Ok(())
        })
    }
}

/// Produces the campaign plan by querying the generation service.
///
/// Plans for positions the model did not cover are filled with generic
/// follow-ups so the message steps always have a plan per position.
pub struct CampaignPlanStep;

impl Step for CampaignPlanStep {
    fn name(&self) -> &str {
        "campaign_plan"
    }

    fn label(&self) -> &str {
        "Campaign planning"
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let profile = state
                .brand_profile
                .clone()
                .unwrap_or_else(|| BrandProfile::fallback(&state.parameters.brand_url));
            let strategy = state
                .content_strategy
                .clone()
                .unwrap_or_else(|| ContentStrategy::derive(&state.parameters, &profile));
            let params = &state.parameters;

            let prompt = format!(
                "Plan a {} campaign.\n\n{}\n\nThe campaign has {} emails and {} SMS \
                 messages.{}\n\nRespond with JSON: {{\"objective\": string, \
                 \"strategy\": string, \"email_plans\": [{{\"purpose\": string, \
                 \"focus\": string}}], \"sms_plans\": [{{\"purpose\": string, \
                 \"focus\": string}}], \"success_metrics\": [string]}}.",
                params.campaign_type,
                strategy.prompt_block(&profile.name),
                params.num_emails,
                params.num_sms,
                if params.custom_instructions.is_empty() {
                    String::new()
                } else {
                    format!("\nAdditional instructions: {}", params.custom_instructions)
                },
            );
            let request = CompletionRequest::new(
                prompt,
                "You are a marketing campaign strategist. Respond with valid JSON only.",
            )
            .with_temperature(0.5);

            let completion = super::complete(ctx, self.name(), "campaign plan", &request).await?;
            let plan = parse_plan(&completion.text, state);
            state.campaign_plan = Some(plan);
            Ok(())
        })
    }
}

fn parse_plan(text: &str, state: &WorkflowState) -> CampaignPlan {
    let profile_name = state
        .brand_profile
        .as_ref()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| crate::types::domain_name(&state.parameters.brand_url));
    let mut plan = CampaignPlan::minimal(state.parameters.campaign_type, profile_name);
    plan.target_audience = state
        .content_strategy
        .as_ref()
        .map(|s| s.target_audience.clone())
        .unwrap_or(plan.target_audience);
    plan.full_plan = text.to_string();

    if let Some(value) = extract_json(text) {
        if let Some(objective) = json_str(&value, "objective") {
            plan.objective = objective;
        }
        if let Some(strategy) = json_str(&value, "strategy") {
            plan.strategy = strategy;
        }
        plan.success_metrics = json_str_list(&value, "success_metrics");
        plan.email_plans = parse_message_plans(&value, "email_plans");
        plan.sms_plans = parse_message_plans(&value, "sms_plans");
    }

    // Pad out to the requested counts with generic follow-ups.
    for i in plan.email_plans.len() as u32..state.parameters.num_emails {
        plan.email_plans.push(MessagePlan::follow_up(i + 1));
    }
    for i in plan.sms_plans.len() as u32..state.parameters.num_sms {
        plan.sms_plans.push(MessagePlan::follow_up(i + 1));
    }
    plan
}

fn parse_message_plans(value: &serde_json::Value, key: &str) -> Vec<MessagePlan> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| MessagePlan {
                    number: i as u32 + 1,
                    purpose: json_str(item, "purpose").unwrap_or_else(|| "Follow-up".to_string()),
                    focus: json_str(item, "focus")
                        .unwrap_or_else(|| "Continued engagement".to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}
