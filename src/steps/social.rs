//! Social caption generation, one batch per platform.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::package::{Platform, SocialCaptions};
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::ContentType;

/// Captions requested per platform.
const CAPTIONS_PER_PLATFORM: usize = 3;

/// Generates caption sets for each supported platform.
///
/// One completion call per platform; the whole multi-platform batch is
/// atomic.
pub struct SocialCaptionStep;

impl Step for SocialCaptionStep {
    fn name(&self) -> &str {
        "generate_social_captions"
    }

    fn label(&self) -> &str {
        "Social caption generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.wants(ContentType::SocialCaptions)
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = super::email::effective_plan(state);
            let strategy_block = state
                .content_strategy
                .as_ref()
                .map(|s| s.prompt_block(&plan.brand_name))
                .unwrap_or_else(|| format!("Brand: {}", plan.brand_name));

            let platforms = Platform::all();
            let mut captions = SocialCaptions::new();

            for (index, platform) in platforms.into_iter().enumerate() {
                let prompt = format!(
                    "Write {} social media captions for {}.\n\n{}\n\n\
                     Match the platform's voice and include relevant hashtags. \
                     Respond with one caption per line, numbered 1. to {}.",
                    CAPTIONS_PER_PLATFORM, platform, strategy_block, CAPTIONS_PER_PLATFORM,
                );
                let request = CompletionRequest::new(
                    prompt,
                    "You are a social media copywriter. One caption per numbered line.",
                );

                let completion =
                    super::complete(ctx, self.name(), platform.as_str(), &request).await?;
                captions.insert(platform, parse_captions(&completion.text));

                if index + 1 < platforms.len() {
                    ctx.pace().await;
                }
            }

            state.social_captions = Some(captions);
            Ok(())
        })
    }
}

/// Split a numbered-list response into individual captions. List markers
/// are stripped; unnumbered non-empty lines are accepted as captions too.
fn parse_captions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')', '-', '*'])
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::MockGeneration;
    use crate::types::{CampaignParameters, CampaignType};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_generates_captions_for_all_platforms() {
        let service = Arc::new(MockGeneration::fixed(
            "1. Love this! #brand\n2. So good #quality\n3. Get yours today #shop",
        ));
        let ctx = RunCtx::builder().service(service).build();

        let mut st = WorkflowState::new(
            CampaignParameters::new("https://acme.com", CampaignType::Custom)
                .with_content_types(vec![ContentType::SocialCaptions]),
        );
        SocialCaptionStep.run(&ctx, &mut st).await.unwrap();

        let captions = st.social_captions.as_ref().unwrap();
        assert_eq!(captions.platform_count(), 4);
        assert_eq!(captions.get(Platform::Instagram).len(), 3);
        assert_eq!(captions.get(Platform::Instagram)[0], "Love this! #brand");
    }

    #[test]
    fn test_parse_captions_strips_markers() {
        let parsed = parse_captions("1. First one\n- Second one\n\n3) Third #tag");
        assert_eq!(parsed, vec!["First one", "Second one", "Third #tag"]);
    }
}
