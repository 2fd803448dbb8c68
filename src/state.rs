//! Mutable state bag threaded through the steps of one run.
//!
//! [`WorkflowState`] holds the immutable run inputs, a set of named, typed
//! result slots, and an append-only error log. Slots are statically
//! enumerable: a step either fully populates its slot or leaves it absent
//! and appends an error. The state is owned by exactly one run and is
//! finalized into an immutable [`RunResult`] when the run completes.

use crate::flow::CampaignFlow;
use crate::package::{AssetBundle, SocialCaptions};
use crate::strategy::ContentStrategy;
use crate::types::{
    AdCopyVariant, BrandProfile, CampaignParameters, CampaignPlan, ImageAsset, MessageUnit,
    RunResult, UgcScript,
};
use chrono::Utc;

/// The state bag for one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    /// Run inputs. Immutable once the run starts.
    pub parameters: CampaignParameters,
    /// Brand profile for the run. Set before the first step; read-only after.
    pub brand_profile: Option<BrandProfile>,

    // Result slots, populated by steps in sequence order.
    pub campaign_plan: Option<CampaignPlan>,
    pub content_strategy: Option<ContentStrategy>,
    pub emails: Option<Vec<MessageUnit>>,
    pub sms: Option<Vec<MessageUnit>>,
    pub visuals: Option<Vec<ImageAsset>>,
    pub ad_copy: Option<Vec<AdCopyVariant>>,
    pub social_captions: Option<SocialCaptions>,
    pub images: Option<Vec<ImageAsset>>,
    pub ugc_scripts: Option<Vec<UgcScript>>,
    pub email_assets: Option<Vec<ImageAsset>>,
    pub campaign_flow: Option<CampaignFlow>,
    pub asset_bundle: Option<AssetBundle>,

    /// Append-only step error log; order reflects execution order.
    pub errors: Vec<String>,
}

impl WorkflowState {
    /// Create a fresh state with only the inputs populated.
    pub fn new(parameters: CampaignParameters) -> Self {
        Self {
            parameters,
            brand_profile: None,
            campaign_plan: None,
            content_strategy: None,
            emails: None,
            sms: None,
            visuals: None,
            ad_copy: None,
            social_captions: None,
            images: None,
            ugc_scripts: None,
            email_assets: None,
            campaign_flow: None,
            asset_bundle: None,
            errors: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: BrandProfile) -> Self {
        self.brand_profile = Some(profile);
        self
    }

    /// Append a step error. Errors are never cleared.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Names of the populated result slots, in declaration order.
    pub fn populated_slots(&self) -> Vec<&'static str> {
        let mut slots = Vec::new();
        if self.campaign_plan.is_some() {
            slots.push("campaign_plan");
        }
        if self.content_strategy.is_some() {
            slots.push("content_strategy");
        }
        if self.emails.is_some() {
            slots.push("emails");
        }
        if self.sms.is_some() {
            slots.push("sms");
        }
        if self.visuals.is_some() {
            slots.push("visuals");
        }
        if self.ad_copy.is_some() {
            slots.push("ad_copy");
        }
        if self.social_captions.is_some() {
            slots.push("social_captions");
        }
        if self.images.is_some() {
            slots.push("images");
        }
        if self.ugc_scripts.is_some() {
            slots.push("ugc_scripts");
        }
        if self.email_assets.is_some() {
            slots.push("email_assets");
        }
        if self.campaign_flow.is_some() {
            slots.push("campaign_flow");
        }
        if self.asset_bundle.is_some() {
            slots.push("asset_bundle");
        }
        slots
    }

    /// Finalize the state into an immutable run result, stamped now.
    pub fn into_result(self) -> RunResult {
        RunResult {
            timestamp: Utc::now(),
            parameters: self.parameters,
            brand_profile: self.brand_profile,
            campaign_plan: self.campaign_plan,
            content_strategy: self.content_strategy,
            emails: self.emails,
            sms: self.sms,
            visuals: self.visuals,
            ad_copy: self.ad_copy,
            social_captions: self.social_captions,
            images: self.images,
            ugc_scripts: self.ugc_scripts,
            email_assets: self.email_assets,
            campaign_flow: self.campaign_flow,
            asset_bundle: self.asset_bundle,
            errors: self.errors,
        }
    }
}
