//! Content strategy derivation.
//!
//! A [`ContentStrategy`] is computed deterministically from the brand
//! profile and run parameters; no generation call is involved, so this step
//! cannot fail. It gives every downstream prompt a consistent product
//! description, audience, tone, and set of content pillars to draw from.

use crate::types::{BrandProfile, CampaignParameters};
use serde::{Deserialize, Serialize};

/// Shared inputs for content-generation prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStrategy {
    /// One-line description of what the brand sells.
    pub product_description: String,
    pub target_audience: String,
    pub tone: String,
    /// Thematic pillars content should rotate through.
    pub content_pillars: Vec<String>,
    /// Key messages to reinforce across channels.
    pub key_messages: Vec<String>,
    pub keywords: Vec<String>,
}

impl ContentStrategy {
    /// Derive a strategy from the brand profile and run parameters.
    ///
    /// Parameters take precedence over profile values for audience and
    /// tone. Empty profile fields degrade to generic pillars and messages
    /// rather than empty lists.
    pub fn derive(parameters: &CampaignParameters, profile: &BrandProfile) -> Self {
        let target_audience = prefer_explicit(
            &parameters.target_audience,
            "General customers",
            &profile.target_audience,
        );
        let tone = prefer_explicit(&parameters.tone, "Professional", &profile.tone);

        let product_description = if profile.products.is_empty() {
            format!("{} offerings", profile.name)
        } else {
            profile.products.join(", ")
        };

        let mut content_pillars = profile.content_themes.clone();
        if content_pillars.is_empty() {
            content_pillars = vec![
                "Product benefits".to_string(),
                "Social proof".to_string(),
                "Brand story".to_string(),
            ];
        }

        let mut key_messages = profile.value_propositions.clone();
        if key_messages.is_empty() {
            key_messages = vec![format!(
                "{} delivers quality you can rely on",
                profile.name
            )];
        }

        Self {
            product_description,
            target_audience,
            tone,
            content_pillars,
            key_messages,
            keywords: profile.keywords.clone(),
        }
    }

    /// Compact prompt block describing the strategy, embedded in generation
    /// prompts.
    pub fn prompt_block(&self, brand_name: &str) -> String {
        let mut block = format!(
            "Brand: {}\nProducts: {}\nTarget audience: {}\nTone: {}",
            brand_name, self.product_description, self.target_audience, self.tone
        );
        if !self.key_messages.is_empty() {
            block.push_str("\nKey messages: ");
            block.push_str(&self.key_messages.join("; "));
        }
        if !self.keywords.is_empty() {
            block.push_str("\nKeywords: ");
            block.push_str(&self.keywords.join(", "));
        }
        block
    }
}

/// A parameter still holding its documented default defers to the profile
/// value when the profile has one.
fn prefer_explicit(parameter: &str, default: &str, profile_value: &str) -> String {
    if parameter.trim().is_empty() || parameter == default {
        if profile_value.trim().is_empty() {
            default.to_string()
        } else {
            profile_value.to_string()
        }
    } else {
        parameter.to_string()
    }
}
