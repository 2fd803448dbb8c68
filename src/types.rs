//! Shared data model for campaign runs.
//!
//! These types flow between the workflow engine, the generation steps, the
//! sequence composer, and the asset packager. Everything here is
//! JSON-serializable so run results can be persisted and exported as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of campaign being generated.
///
/// Closed enum: unknown/custom campaigns resolve to [`CampaignType::Custom`]
/// rather than failing, and every lookup keyed on campaign type carries an
/// explicit fallback arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignType {
    CartAbandonment,
    WelcomeSeries,
    PostPurchase,
    WinBack,
    Custom,
}

impl CampaignType {
    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CampaignType::CartAbandonment => "Cart Abandonment",
            CampaignType::WelcomeSeries => "Welcome Series",
            CampaignType::PostPurchase => "Post-Purchase",
            CampaignType::WinBack => "Win-Back",
            CampaignType::Custom => "Custom",
        }
    }

    /// Snake-case slug used for flow ids.
    pub fn slug(&self) -> &'static str {
        match self {
            CampaignType::CartAbandonment => "cart_abandonment",
            CampaignType::WelcomeSeries => "welcome_series",
            CampaignType::PostPurchase => "post_purchase",
            CampaignType::WinBack => "win_back",
            CampaignType::Custom => "custom",
        }
    }

    /// Entry trigger type for the composed flow.
    ///
    /// Custom campaigns resolve to the generic `custom_event` trigger.
    pub fn trigger_type(&self) -> &'static str {
        match self {
            CampaignType::CartAbandonment => "cart_abandonment",
            CampaignType::WelcomeSeries => "user_signup",
            CampaignType::PostPurchase => "purchase_completed",
            CampaignType::WinBack => "user_inactive",
            CampaignType::Custom => "custom_event",
        }
    }
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Content types a content-generation run can request.
///
/// Steps whose content type was not requested are skipped, which is not a
/// failure and logs no error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    AdCopy,
    SocialCaptions,
    Images,
    UgcScripts,
    EmailAssets,
}

/// Delivery channel of a message unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    /// Merge priority for equal-delay ties: email sorts before SMS.
    pub fn merge_rank(&self) -> u8 {
        match self {
            Channel::Email => 0,
            Channel::Sms => 1,
        }
    }

    /// Flat fallback delay for a unit that carries no delay of its own.
    pub fn default_delay_hours(&self) -> u32 {
        match self {
            Channel::Email => 24,
            Channel::Sms => 48,
        }
    }

    /// Canonical send delay (hours) for the Nth message in this channel's
    /// own sequence (1-based). Positions past the table fall back to weekly.
    pub fn delay_for_position(&self, position: u32) -> u32 {
        let table: &[u32] = match self {
            Channel::Email => &[1, 24, 72, 168, 336],
            Channel::Sms => &[2, 48, 168, 336, 504],
        };
        if position >= 1 && (position as usize) <= table.len() {
            table[position as usize - 1]
        } else {
            168 * position.max(1)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

/// Input parameters for one campaign run. Immutable once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignParameters {
    /// Brand website URL to analyze (may be empty for static profiles).
    pub brand_url: String,
    pub campaign_type: CampaignType,
    pub target_audience: String,
    pub tone: String,
    pub num_emails: u32,
    pub num_sms: u32,
    /// Content types requested for content-generation runs.
    pub content_types: Vec<ContentType>,
    /// Free-text custom instructions appended to planning prompts.
    pub custom_instructions: String,
}

impl CampaignParameters {
    pub fn new(brand_url: impl Into<String>, campaign_type: CampaignType) -> Self {
        Self {
            brand_url: brand_url.into(),
            campaign_type,
            target_audience: "General customers".to_string(),
            tone: "Professional".to_string(),
            num_emails: 3,
            num_sms: 1,
            content_types: Vec::new(),
            custom_instructions: String::new(),
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = audience.into();
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_counts(mut self, num_emails: u32, num_sms: u32) -> Self {
        self.num_emails = num_emails;
        self.num_sms = num_sms;
        self
    }

    pub fn with_content_types(mut self, types: Vec<ContentType>) -> Self {
        self.content_types = types;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = instructions.into();
        self
    }

    /// Whether a content type was requested for this run.
    pub fn wants(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }
}

/// Structured brand profile supplied by a [`BrandProfileProvider`].
///
/// [`BrandProfileProvider`]: crate::brand::BrandProfileProvider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandProfile {
    pub url: String,
    pub name: String,
    pub description: String,
    pub products: Vec<String>,
    pub target_audience: String,
    pub value_propositions: Vec<String>,
    pub keywords: Vec<String>,
    /// Brand color palette as hex strings or free text.
    pub colors: Vec<String>,
    pub tone: String,
    pub content_themes: Vec<String>,
    /// True when live extraction failed and fallback values were substituted.
    /// Downstream steps proceed with the fallback; no run error is logged.
    pub degraded: bool,
}

impl BrandProfile {
    /// Degraded fallback profile used when brand analysis fails.
    ///
    /// The brand name is derived from the URL's domain; products and
    /// audience take documented placeholder values.
    pub fn fallback(url: &str) -> Self {
        Self {
            url: url.to_string(),
            name: domain_name(url),
            description: "Brand analysis failed - using fallback data".to_string(),
            products: vec!["Product or Service".to_string()],
            target_audience: "General consumers".to_string(),
            value_propositions: Vec::new(),
            keywords: Vec::new(),
            colors: Vec::new(),
            tone: "Professional".to_string(),
            content_themes: Vec::new(),
            degraded: true,
        }
    }
}

/// Extract a presentable domain name from a URL.
///
/// `"https://www.acme-widgets.com/shop"` becomes `"Acme-widgets"`.
/// Garbage input degrades to `"Your Brand"` rather than failing.
pub fn domain_name(url: &str) -> String {
    let stripped = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    let host = stripped.split(['/', '?', '#']).next().unwrap_or("");
    let base = host.split(':').next().unwrap_or("").split('.').next().unwrap_or("");
    if base.is_empty() {
        return "Your Brand".to_string();
    }
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Your Brand".to_string(),
    }
}

/// Per-message plan produced by the campaign planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePlan {
    /// 1-based position within the channel's own sequence.
    pub number: u32,
    pub purpose: String,
    pub focus: String,
}

impl MessagePlan {
    /// Generic follow-up plan for positions the planner did not cover.
    pub fn follow_up(number: u32) -> Self {
        Self {
            number,
            purpose: "Follow-up".to_string(),
            focus: "Continued engagement".to_string(),
        }
    }
}

/// Campaign plan derived from brand analysis and run parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPlan {
    pub campaign_type: CampaignType,
    pub brand_name: String,
    pub target_audience: String,
    pub objective: String,
    pub strategy: String,
    pub email_plans: Vec<MessagePlan>,
    pub sms_plans: Vec<MessagePlan>,
    pub success_metrics: Vec<String>,
    /// Raw planner output, kept for traceability.
    pub full_plan: String,
}

impl CampaignPlan {
    /// A bare plan with generic objective and no per-message plans. Used
    /// when planning is skipped or failed and composition still needs
    /// campaign metadata.
    pub fn minimal(campaign_type: CampaignType, brand_name: impl Into<String>) -> Self {
        Self {
            campaign_type,
            brand_name: brand_name.into(),
            target_audience: "General customers".to_string(),
            objective: format!("Drive results with a {} campaign", campaign_type),
            strategy: String::new(),
            email_plans: Vec::new(),
            sms_plans: Vec::new(),
            success_metrics: Vec::new(),
            full_plan: String::new(),
        }
    }
}

/// Normalized representation of one deliverable message (email or SMS).
///
/// Produced by the generation steps; consumed by the sequence composer.
/// `delay_hours` is resolved against the channel's default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUnit {
    /// 1-based sequence number within the unit's own channel.
    pub sequence: u32,
    pub channel: Channel,
    /// Email subject line. `None` for SMS.
    pub subject: Option<String>,
    /// Email preview text. `None` for SMS.
    pub preview_text: Option<String>,
    /// Email body or SMS message text.
    pub body: String,
    pub cta: Option<String>,
    /// Hours after the campaign trigger at which this unit fires.
    pub delay_hours: Option<u32>,
    pub purpose: String,
    pub focus: String,
    /// Personalization tags referenced by the copy (e.g. `{{first_name}}`).
    pub personalization: Vec<String>,
}

impl MessageUnit {
    pub fn email(sequence: u32, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sequence,
            channel: Channel::Email,
            subject: Some(subject.into()),
            preview_text: None,
            body: body.into(),
            cta: None,
            delay_hours: None,
            purpose: String::new(),
            focus: String::new(),
            personalization: Vec::new(),
        }
    }

    pub fn sms(sequence: u32, message: impl Into<String>) -> Self {
        Self {
            sequence,
            channel: Channel::Sms,
            subject: None,
            preview_text: None,
            body: message.into(),
            cta: None,
            delay_hours: None,
            purpose: String::new(),
            focus: String::new(),
            personalization: Vec::new(),
        }
    }

    pub fn with_delay(mut self, hours: u32) -> Self {
        self.delay_hours = Some(hours);
        self
    }

    /// Resolved delay: the unit's own value, or the channel's flat default.
    pub fn resolved_delay_hours(&self) -> u32 {
        self.delay_hours
            .unwrap_or_else(|| self.channel.default_delay_hours())
    }
}

/// Semantic role of a generated image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    HeroImage,
    ProductShowcase,
    SocialPost,
    AdCreative,
    EmailHeader,
    SocialProof,
    CtaButton,
    TrustBadge,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::HeroImage => "hero_image",
            AssetKind::ProductShowcase => "product_showcase",
            AssetKind::SocialPost => "social_post",
            AssetKind::AdCreative => "ad_creative",
            AssetKind::EmailHeader => "email_header",
            AssetKind::SocialProof => "social_proof",
            AssetKind::CtaButton => "cta_button",
            AssetKind::TrustBadge => "trust_badges",
        }
    }
}

/// One generated image asset with its semantic role and dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Stable identifier within the run (e.g. `"img_3"`).
    pub id: String,
    pub kind: AssetKind,
    pub description: String,
    /// `"WIDTHxHEIGHT"` string, e.g. `"1080x1080"`.
    pub dimensions: String,
    /// Rendered image location, if synthesis produced one.
    pub url: Option<String>,
}

impl ImageAsset {
    pub fn new(id: impl Into<String>, kind: AssetKind, dimensions: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            description: String::new(),
            dimensions: dimensions.into(),
            url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One ad copy variant with its constituent copy elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCopyVariant {
    pub headline: String,
    pub primary_text: String,
    pub description: String,
    pub cta: Option<String>,
}

/// A UGC-style video script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UgcScript {
    pub title: String,
    pub hook: String,
    pub body: String,
    pub cta: String,
    /// Target duration, e.g. `"30-45 seconds"`.
    pub duration: String,
}

/// Finalized result of one workflow run.
///
/// Always produced, whatever happened: populated slots sit alongside the
/// accumulated error log, and partial results are expected and valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub timestamp: DateTime<Utc>,
    pub parameters: CampaignParameters,
    pub brand_profile: Option<BrandProfile>,
    pub campaign_plan: Option<CampaignPlan>,
    pub content_strategy: Option<crate::strategy::ContentStrategy>,
    pub emails: Option<Vec<MessageUnit>>,
    pub sms: Option<Vec<MessageUnit>>,
    pub visuals: Option<Vec<ImageAsset>>,
    pub ad_copy: Option<Vec<AdCopyVariant>>,
    pub social_captions: Option<crate::package::SocialCaptions>,
    pub images: Option<Vec<ImageAsset>>,
    pub ugc_scripts: Option<Vec<UgcScript>>,
    pub email_assets: Option<Vec<ImageAsset>>,
    pub campaign_flow: Option<crate::flow::CampaignFlow>,
    pub asset_bundle: Option<crate::package::AssetBundle>,
    /// Ordered, append-only step error log. Order reflects execution order.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_lookup() {
        assert_eq!(CampaignType::CartAbandonment.trigger_type(), "cart_abandonment");
        assert_eq!(CampaignType::WelcomeSeries.trigger_type(), "user_signup");
        assert_eq!(CampaignType::PostPurchase.trigger_type(), "purchase_completed");
        assert_eq!(CampaignType::WinBack.trigger_type(), "user_inactive");
        assert_eq!(CampaignType::Custom.trigger_type(), "custom_event");
    }

    #[test]
    fn test_delay_table_email() {
        assert_eq!(Channel::Email.delay_for_position(1), 1);
        assert_eq!(Channel::Email.delay_for_position(2), 24);
        assert_eq!(Channel::Email.delay_for_position(5), 336);
        // Past the table: weekly cadence
        assert_eq!(Channel::Email.delay_for_position(6), 168 * 6);
    }

    #[test]
    fn test_delay_table_sms() {
        assert_eq!(Channel::Sms.delay_for_position(1), 2);
        assert_eq!(Channel::Sms.delay_for_position(2), 48);
        assert_eq!(Channel::Sms.delay_for_position(7), 168 * 7);
    }

    #[test]
    fn test_delay_table_monotonic_per_channel() {
        for channel in [Channel::Email, Channel::Sms] {
            let mut last = 0;
            for position in 1..=10 {
                let delay = channel.delay_for_position(position);
                assert!(delay >= last, "{:?} position {} regressed", channel, position);
                last = delay;
            }
        }
    }

    #[test]
    fn test_resolved_delay_falls_back_to_channel_default() {
        let email = MessageUnit::email(1, "Hi", "Body");
        assert_eq!(email.resolved_delay_hours(), 24);
        let sms = MessageUnit::sms(1, "Hi");
        assert_eq!(sms.resolved_delay_hours(), 48);
        let explicit = MessageUnit::email(1, "Hi", "Body").with_delay(2);
        assert_eq!(explicit.resolved_delay_hours(), 2);
    }

    #[test]
    fn test_domain_name_extraction() {
        assert_eq!(domain_name("https://www.acme.com/shop"), "Acme");
        assert_eq!(domain_name("http://widgets.io"), "Widgets");
        assert_eq!(domain_name("not a url"), "Not a url");
        assert_eq!(domain_name(""), "Your Brand");
    }

    #[test]
    fn test_fallback_profile_fields() {
        let profile = BrandProfile::fallback("https://glow.example.com");
        assert!(profile.degraded);
        assert_eq!(profile.name, "Glow");
        assert_eq!(profile.products, vec!["Product or Service"]);
        assert_eq!(profile.target_audience, "General consumers");
    }
}
