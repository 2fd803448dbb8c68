//! Final packaging step for the content-generation pipeline.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::package::AssetPackager;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::strategy::ContentStrategy;
use crate::types::BrandProfile;

/// Collects whatever the generation steps produced into an [`AssetBundle`].
///
/// Runs last and never fails: missing slots package as empty sections, so a
/// partially failed run still yields an organized deliverable.
///
/// [`AssetBundle`]: crate::package::AssetBundle
pub struct PackagingStep;

impl Step for PackagingStep {
    fn name(&self) -> &str {
        "package_assets"
    }

    fn label(&self) -> &str {
        "Asset packaging"
    }

    fn run<'a>(&'a self, _ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let strategy = state.content_strategy.clone().unwrap_or_else(|| {
                let profile = state
                    .brand_profile
                    .clone()
                    .unwrap_or_else(|| BrandProfile::fallback(&state.parameters.brand_url));
                ContentStrategy::derive(&state.parameters, &profile)
            });

            let ad_copy = state.ad_copy.clone().unwrap_or_default();
            let captions = state.social_captions.clone().unwrap_or_default();
            let images = state.images.clone().unwrap_or_default();
            let ugc_scripts = state.ugc_scripts.clone().unwrap_or_default();
            let email_assets = state.email_assets.clone().unwrap_or_default();

            let bundle = AssetPackager::new().package(
                &ad_copy,
                &captions,
                &images,
                &ugc_scripts,
                &email_assets,
                &strategy,
            );
            state.asset_bundle = Some(bundle);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdCopyVariant, CampaignParameters, CampaignType};

    fn state() -> WorkflowState {
        WorkflowState::new(CampaignParameters::new(
            "https://acme.com",
            CampaignType::Custom,
        ))
    }

    #[tokio::test]
    async fn test_packages_empty_state() {
        let ctx = RunCtx::builder().build();
        let mut st = state();
        PackagingStep.run(&ctx, &mut st).await.unwrap();

        let bundle = st.asset_bundle.as_ref().unwrap();
        assert_eq!(bundle.summary.ad_copy_variants, 0);
        assert!(bundle.summary.content_types.is_empty());
        assert!(bundle.references_resolve());
    }

    #[tokio::test]
    async fn test_packages_populated_slots() {
        let ctx = RunCtx::builder().build();
        let mut st = state();
        st.ad_copy = Some(vec![AdCopyVariant {
            headline: "Better mornings".to_string(),
            primary_text: "Start your day right.".to_string(),
            description: "A fresh take".to_string(),
            cta: Some("Shop Now".to_string()),
        }]);

        PackagingStep.run(&ctx, &mut st).await.unwrap();

        let bundle = st.asset_bundle.as_ref().unwrap();
        assert_eq!(bundle.summary.ad_copy_variants, 1);
        assert_eq!(bundle.inventory.ad_copy.len(), 1);
        assert!(bundle.references_resolve());
    }
}
