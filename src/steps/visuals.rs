//! Campaign visual generation for the marketing-automation pipeline.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::ImageRequest;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{AssetKind, ImageAsset};

/// The fixed visual set every campaign gets: kind, dimensions, and prompt
/// template.
const CAMPAIGN_VISUALS: &[(AssetKind, u32, u32, &str)] = &[
    (
        AssetKind::EmailHeader,
        600,
        200,
        "Email header banner for {brand}: clean, on-brand, with room for a headline",
    ),
    (
        AssetKind::ProductShowcase,
        1080,
        1080,
        "Product showcase image for {brand}: {products}, studio lighting",
    ),
    (
        AssetKind::SocialProof,
        1080,
        1080,
        "Social proof graphic for {brand}: customer testimonial layout",
    ),
    (
        AssetKind::CtaButton,
        300,
        100,
        "Call-to-action button graphic for {brand}: high contrast, legible",
    ),
    (
        AssetKind::TrustBadge,
        200,
        200,
        "Trust badge for {brand}: secure checkout, guarantee seal",
    ),
];

/// Generates the standard campaign visual set via the image service.
///
/// Atomic like the message steps: the `visuals` slot appears only when the
/// whole set was synthesized.
pub struct VisualGenerationStep;

impl Step for VisualGenerationStep {
    fn name(&self) -> &str {
        "generate_visuals"
    }

    fn label(&self) -> &str {
        "Visual generation"
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let brand = state
                .brand_profile
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| crate::types::domain_name(&state.parameters.brand_url));
            let products = state
                .brand_profile
                .as_ref()
                .map(|p| p.products.join(", "))
                .unwrap_or_else(|| "products".to_string());

            let mut visuals = Vec::with_capacity(CAMPAIGN_VISUALS.len());
            for (index, (kind, width, height, template)) in CAMPAIGN_VISUALS.iter().enumerate() {
                let prompt = template
                    .replace("{brand}", &brand)
                    .replace("{products}", &products);
                let request = ImageRequest::new(prompt.clone(), *width, *height);

                let handle =
                    super::synthesize(ctx, self.name(), kind.as_str(), &request).await?;

                let mut asset = ImageAsset::new(handle.id, *kind, request.dimensions())
                    .with_description(prompt);
                if let Some(url) = handle.url {
                    asset = asset.with_url(url);
                }
                visuals.push(asset);

                if index + 1 < CAMPAIGN_VISUALS.len() {
                    ctx.pace().await;
                }
            }

            state.visuals = Some(visuals);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::MockGeneration;
    use crate::types::{CampaignParameters, CampaignType};
    use std::sync::Arc;

    fn state() -> WorkflowState {
        WorkflowState::new(CampaignParameters::new(
            "https://acme.com",
            CampaignType::PostPurchase,
        ))
    }

    #[tokio::test]
    async fn test_generates_fixed_visual_set() {
        let service = Arc::new(MockGeneration::fixed("unused"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state();
        VisualGenerationStep.run(&ctx, &mut st).await.unwrap();

        let visuals = st.visuals.as_ref().unwrap();
        assert_eq!(visuals.len(), 5);
        assert_eq!(visuals[0].kind, AssetKind::EmailHeader);
        assert_eq!(visuals[0].dimensions, "600x200");
        assert_eq!(visuals[1].kind, AssetKind::ProductShowcase);
        assert_eq!(visuals[1].dimensions, "1080x1080");
        assert!(visuals.iter().all(|v| !v.id.is_empty()));
    }

    #[tokio::test]
    async fn test_atomic_on_failure() {
        let service = Arc::new(MockGeneration::failing(503, "unavailable"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = state();
        assert!(VisualGenerationStep.run(&ctx, &mut st).await.is_err());
        assert!(st.visuals.is_none());
    }
}
