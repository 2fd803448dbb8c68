//! Ad copy variant generation.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::parse::extract_labeled;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{AdCopyVariant, ContentType};

/// Number of ad copy variants generated per run.
const VARIANT_COUNT: usize = 3;

/// Generates three ad copy variants with headline, primary text,
/// description, and CTA.
pub struct AdCopyStep;

impl Step for AdCopyStep {
    fn name(&self) -> &str {
        "generate_ad_copy"
    }

    fn label(&self) -> &str {
        "Ad copy generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.wants(ContentType::AdCopy)
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = super::email::effective_plan(state);
            let strategy_block = state
                .content_strategy
                .as_ref()
                .map(|s| s.prompt_block(&plan.brand_name))
                .unwrap_or_else(|| format!("Brand: {}", plan.brand_name));

            let angles = ["benefit-led", "social-proof-led", "urgency-led"];
            let mut variants = Vec::with_capacity(VARIANT_COUNT);

            for (i, angle) in angles.iter().enumerate().take(VARIANT_COUNT) {
                let prompt = format!(
                    "Write ad copy variant {} of {}, {} in angle.\n\n{}\n\n\
                     Format your response with these labeled lines:\n\
                     Headline: <short punchy headline>\n\
                     Primary Text: <1-2 sentence primary text>\n\
                     Description: <one-line description>\n\
                     CTA: <call to action>",
                    i + 1,
                    VARIANT_COUNT,
                    angle,
                    strategy_block,
                );
                let request = CompletionRequest::new(
                    prompt,
                    "You are a performance marketing copywriter. Follow the requested format exactly.",
                );

                let completion = super::complete(
                    ctx,
                    self.name(),
                    &format!("variant {}/{}", i + 1, VARIANT_COUNT),
                    &request,
                )
                .await?;
                variants.push(parse_variant(&completion.text));

                if i + 1 < VARIANT_COUNT {
                    ctx.pace().await;
                }
            }

            state.ad_copy = Some(variants);
            Ok(())
        })
    }
}

/// Split a response into the variant's fields. A response without labels
/// degrades to using its first line as the headline and the rest as primary
/// text.
fn parse_variant(text: &str) -> AdCopyVariant {
    let headline = extract_labeled(text, "Headline").unwrap_or_else(|| {
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("Untitled")
            .to_string()
    });
    let primary_text = extract_labeled(text, "Primary Text")
        .unwrap_or_else(|| text.trim().to_string());
    let description = extract_labeled(text, "Description").unwrap_or_default();
    let cta = extract_labeled(text, "CTA").or_else(|| extract_labeled(text, "Call to Action"));

    AdCopyVariant {
        headline,
        primary_text,
        description,
        cta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::MockGeneration;
    use crate::types::{CampaignParameters, CampaignType};
    use std::sync::Arc;

    fn state() -> WorkflowState {
        WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::Custom)
                .with_content_types(vec![ContentType::AdCopy]),
        )
    }

    #[tokio::test]
    async fn test_generates_three_variants() {
        let service = Arc::new(MockGeneration::fixed(
            "Headline: Big news\nPrimary Text: The best widgets.\nDescription: Acme widgets\nCTA: Shop now",
        ));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state();
        AdCopyStep.run(&ctx, &mut st).await.unwrap();

        let variants = st.ad_copy.as_ref().unwrap();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].headline, "Big news");
        assert_eq!(variants[0].cta.as_deref(), Some("Shop now"));
    }

    #[test]
    fn test_unlabeled_response_degrades() {
        let variant = parse_variant("Just a punchy line\nAnd some more words.");
        assert_eq!(variant.headline, "Just a punchy line");
        assert!(variant.cta.is_none());
    }

    #[test]
    fn test_skipped_when_not_requested() {
        let st = WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::Custom)
                .with_content_types(vec![ContentType::Images]),
        );
        assert!(!AdCopyStep.applies(&st));
    }
}
