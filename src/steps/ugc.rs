//! UGC video script generation.

use crate::engine::{BoxFut, Step};
use crate::error::Result;
use crate::generation::CompletionRequest;
use crate::parse::extract_labeled;
use crate::run_ctx::RunCtx;
use crate::state::WorkflowState;
use crate::types::{ContentType, UgcScript};

/// The script styles generated per run: style, duration, purpose.
const SCRIPT_TYPES: &[(&str, &str, &str)] = &[
    ("testimonial", "30 seconds", "Build trust through authentic experience"),
    ("product_demo", "45 seconds", "Show the product solving a real problem"),
    ("unboxing", "60 seconds", "Capture first-impression excitement"),
    ("before_after", "30 seconds", "Demonstrate the transformation"),
];

/// Generates a set of creator-style video scripts, one per style.
pub struct UgcScriptStep;

impl Step for UgcScriptStep {
    fn name(&self) -> &str {
        "generate_ugc_scripts"
    }

    fn label(&self) -> &str {
        "UGC script generation"
    }

    fn applies(&self, state: &WorkflowState) -> bool {
        state.parameters.wants(ContentType::UgcScripts)
    }

    fn run<'a>(&'a self, ctx: &'a RunCtx, state: &'a mut WorkflowState) -> BoxFut<'a, Result<()>> {
        Box::pin(async move {
            let plan = super::email::effective_plan(state);
            let strategy_block = state
                .content_strategy
                .as_ref()
                .map(|s| s.prompt_block(&plan.brand_name))
                .unwrap_or_else(|| format!("Brand: {}", plan.brand_name));

            let mut scripts = Vec::with_capacity(SCRIPT_TYPES.len());
            for (index, (style, duration, purpose)) in SCRIPT_TYPES.iter().enumerate() {
                let prompt = format!(
                    "Write a {} UGC video script, about {} long.\n\n{}\n\n\
                     Purpose: {}\nKeep it authentic and conversational, like a \
                     real customer filming on their phone.\n\n\
                     Format your response with these labeled lines followed by \
                     the script:\nTitle: <short title>\nHook: <first-3-seconds \
                     attention hook>\n<script body>\nCTA: <closing call to action>",
                    style, duration, strategy_block, purpose,
                );
                let request = CompletionRequest::new(
                    prompt,
                    "You write authentic creator-style video scripts. Follow the requested format exactly.",
                );

                let completion =
                    super::complete(ctx, self.name(), style, &request).await?;
                scripts.push(parse_script(&completion.text, style, duration));

                if index + 1 < SCRIPT_TYPES.len() {
                    ctx.pace().await;
                }
            }

            state.ugc_scripts = Some(scripts);
            Ok(())
        })
    }
}

fn parse_script(text: &str, style: &str, duration: &str) -> UgcScript {
    let title = extract_labeled(text, "Title")
        .unwrap_or_else(|| format!("{} script", style.replace('_', " ")));
    let hook = extract_labeled(text, "Hook").unwrap_or_default();
    let cta = extract_labeled(text, "CTA")
        .or_else(|| extract_labeled(text, "Call to Action"))
        .unwrap_or_default();

    let body: String = text
        .lines()
        .filter(|line| {
            let lower = line
                .trim()
                .trim_start_matches(['*', '#', '-', ' '])
                .to_lowercase();
            !(lower.starts_with("title:")
                || lower.starts_with("hook:")
                || lower.starts_with("cta:")
                || lower.starts_with("call to action:"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    UgcScript {
        title,
        hook,
        body: if body.is_empty() { text.trim().to_string() } else { body },
        cta,
        duration: duration.to_string(),
    }
}
