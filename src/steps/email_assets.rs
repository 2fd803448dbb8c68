//! Email-specific image assets for the content-generation pipeline.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::ImageRequest;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{AssetKind, ContentType, ImageAsset};

/// Assets every email template needs: kind, dimensions, prompt template.
const EMAIL_ASSETS: &[(AssetKind, u32, u32, &str)] = &[
    (
        AssetKind::EmailHeader,
        600,
        200,
        "Email header banner for {brand}: clean, on-brand, with room for a headline",
    ),
    (
        AssetKind::CtaButton,
        300,
        100,
        "Call-to-action button graphic for {brand}: high contrast, legible",
    ),
];

/// Generates the header and button imagery used by email templates.
pub struct EmailAssetStep;

impl Step for EmailAssetStep {
    fn name(&self) -> &str {
        "generate_email_assets"
    }

    fn label(&self) -> &str {
        "Email asset generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.wants(ContentType::EmailAssets)
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let brand = state
                .brand_profile
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| crate::types::domain_name(&state.parameters.brand_url));

            let mut assets = Vec::with_capacity(EMAIL_ASSETS.len());
            for (index, (kind, width, height, template)) in EMAIL_ASSETS.iter().enumerate() {
                let prompt = template.replace("{brand}", &brand);
                let request = ImageRequest::new(prompt.clone(), *width, *height);

                let handle =
                    super::synthesize(ctx, self.name(), kind.as_str(), &request).await?;

                let mut asset = ImageAsset::new(handle.id, *kind, request.dimensions())
                    .with_description(prompt);
                if let Some(url) = handle.url {
                    asset = asset.with_url(url);
                }
                assets.push(asset);

                if index + 1 < EMAIL_ASSETS.len() {
                    ctx.pace().await;
                }
            }

            state.email_assets = Some(assets);
            Ok(())
        })
    }
}
