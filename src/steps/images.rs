//! Content image generation.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::ImageRequest;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{AssetKind, ContentType, ImageAsset};

/// The content image set: kind, dimensions, style direction.
const CONTENT_IMAGES: &[(AssetKind, u32, u32, &str)] = &[
    (
        AssetKind::HeroImage,
        1920,
        1080,
        "cinematic, professional photography, lifestyle",
    ),
    (
        AssetKind::SocialPost,
        1080,
        1080,
        "trendy, colorful, social media optimized",
    ),
    (
        AssetKind::AdCreative,
        1200,
        628,
        "bold, attention-grabbing, clear focal point",
    ),
    (
        AssetKind::ProductShowcase,
        1080,
        1080,
        "clean, minimalist, product photography",
    ),
];

/// Generates the standard content image set via the image service.
pub struct ImageGenerationStep;

impl Step for ImageGenerationStep {
    fn name(&self) -> &str {
        "generate_images"
    }

    fn label(&self) -> &str {
        "Image generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.wants(ContentType::Images)
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let product = state
                .content_strategy
                .as_ref()
                .map(|s| s.product_description.clone())
                .unwrap_or_else(|| "the product".to_string());
            let colors = state
                .brand_profile
                .as_ref()
                .map(|p| p.colors.join(", "))
                .unwrap_or_default();

            let mut images = Vec::with_capacity(CONTENT_IMAGES.len());
            for (index, (kind, width, height, style)) in CONTENT_IMAGES.iter().enumerate() {
                let mut prompt = format!(
                    "{} image featuring {}. Style: {}.",
                    kind.as_str().replace('_', " "),
                    product,
                    style,
                );
                if !colors.is_empty() {
                    prompt.push_str(&format!(" Brand colors: {}.", colors));
                }
                let request = ImageRequest::new(prompt.clone(), *width, *height);

                let handle =
                    super::synthesize(ctx, self.name(), kind.as_str(), &request).await?;

                let mut asset = ImageAsset::new(handle.id, *kind, request.dimensions())
                    .with_description(prompt);
                if let Some(url) = handle.url {
                    asset = asset.with_url(url);
                }
                images.push(asset);

                if index + 1 < CONTENT_IMAGES.len() {
                    ctx.pace().await;
                }
            }

            state.images = Some(images);
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

    #[tokio::test]
    async fn test_generates_content_image_set() {
        let service = Arc::new(MockGeneration::fixed("unused"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::Custom)
                .with_content_types(vec![ContentType::Images]),
        );
        ImageGenerationStep.run(&ctx, &mut st).await.unwrap();

        let images = st.images.as_ref().unwrap();
        assert_eq!(images.len(), 4);
        assert_eq!(images[0].kind, AssetKind::HeroImage);
        assert_eq!(images[0].dimensions, "1920x1080");
        assert_eq!(images[1].dimensions, "1080x1080");
        assert_eq!(images[2].kind, AssetKind::AdCreative);
    }

    #[tokio::test]
    async fn test_atomic_on_failure() {
        let service = Arc::new(MockGeneration::failing(500, "boom"));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::Custom)
                .with_content_types(vec![ContentType::Images]),
        );
        assert!(ImageGenerationStep.run(&ctx, &mut st).await.is_err());
        assert!(st.images.is_none());
    }
}
