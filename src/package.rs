//! Asset packaging: organizing generated artifacts into a deliverable
//! bundle.
//!
//! The [`AssetPackager`] assembles ad copy, social captions, images, UGC
//! scripts, and email creative assets into an [`AssetBundle`]: a flat
//! inventory that owns the data, plus platform kits and campaign sets that
//! reference inventory entries by id or index, never by copy. Packaging is
//! total: empty or missing input collections produce empty selections, not
//! errors.

use crate::export::{csv_escape, write_csv_row};
use crate::strategy::ContentStrategy;
use crate::types::{AdCopyVariant, AssetKind, ContentType, ImageAsset, UgcScript};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Social platforms the packager builds kits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Facebook,
    Linkedin,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
        }
    }

    /// Image dimension specs accepted by this platform's feed.
    pub fn image_dimensions(&self) -> &'static [&'static str] {
        match self {
            Platform::Instagram => &["1080x1080"],
            Platform::Tiktok => &["1080x1920"],
            Platform::Facebook => &["1200x628", "1080x1080"],
            Platform::Linkedin => &["1200x627"],
        }
    }

    /// Recommended posting window.
    pub fn posting_window(&self) -> &'static str {
        match self {
            Platform::Instagram => "11:00 AM - 2:00 PM",
            Platform::Tiktok => "6:00 AM - 10:00 AM",
            Platform::Facebook => "9:00 AM - 10:00 AM",
            Platform::Linkedin => "10:00 AM - 11:00 AM",
        }
    }

    pub fn all() -> [Platform; 4] {
        [
            Platform::Instagram,
            Platform::Tiktok,
            Platform::Facebook,
            Platform::Linkedin,
        ]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform caption lists.
///
/// Backed by an ordered map so serialization and iteration are
/// deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialCaptions {
    by_platform: BTreeMap<Platform, Vec<String>>,
}

impl SocialCaptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, platform: Platform, captions: Vec<String>) {
        self.by_platform.insert(platform, captions);
    }

    pub fn get(&self, platform: Platform) -> &[String] {
        self.by_platform
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.by_platform.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, &[String])> {
        self.by_platform
            .iter()
            .map(|(p, captions)| (*p, captions.as_slice()))
    }

    /// Count of captions across all platforms.
    pub fn total(&self) -> usize {
        self.by_platform.values().map(Vec::len).sum()
    }

    pub fn platform_count(&self) -> usize {
        self.by_platform.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Bundle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// `content_pkg_<YYYYmmdd_HHMMSS>`.
    pub package_id: String,
    pub created_at: DateTime<Utc>,
    pub product_service: String,
    pub target_audience: String,
    pub brand_tone: String,
    pub content_pillars: Vec<String>,
    pub key_messages: Vec<String>,
    pub version: String,
    pub status: String,
}

/// Derived counts over the bundle's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    /// Sum of all collection lengths, captions flattened per platform.
    pub total_assets: usize,
    pub ad_copy_variants: usize,
    pub social_platforms: usize,
    pub total_social_captions: usize,
    pub images_generated: usize,
    pub ugc_scripts: usize,
    pub email_assets: usize,
    /// Non-empty content types, in canonical order.
    pub content_types: Vec<ContentType>,
    pub platforms_covered: Vec<String>,
}

/// The flat inventory owning all packaged asset data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetInventory {
    pub ad_copy: Vec<AdCopyVariant>,
    pub social_captions: SocialCaptions,
    pub images: Vec<ImageAsset>,
    pub ugc_scripts: Vec<UgcScript>,
    pub email_assets: Vec<ImageAsset>,
}

/// A reference to one caption in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionRef {
    pub platform: Platform,
    pub index: usize,
}

/// A ready-to-use kit for one platform: filtered views of the shared
/// inventory, referenced by id or index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformKit {
    pub platform: Platform,
    /// Caption indices within this platform's own caption list.
    pub captions: Vec<usize>,
    /// Ids of inventory images whose dimensions match the platform spec.
    pub images: Vec<String>,
    /// Distinct hashtags found in this platform's captions.
    pub hashtags: Vec<String>,
    /// Indices of applicable UGC scripts.
    pub scripts: Vec<usize>,
    pub posting_window: String,
}

/// A named campaign-ready selection of inventory references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSet {
    pub name: String,
    pub description: String,
    /// Indices into `inventory.ad_copy`.
    pub ad_copy: Vec<usize>,
    /// Ids of inventory images.
    pub images: Vec<String>,
    pub captions: Vec<CaptionRef>,
    /// Ids of inventory email assets.
    pub email_assets: Vec<String>,
    pub timeline: String,
}

/// The packaged deliverable: inventory plus derived views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBundle {
    pub info: PackageInfo,
    pub summary: ContentSummary,
    pub inventory: AssetInventory,
    pub platform_kits: Vec<PlatformKit>,
    pub campaign_sets: Vec<CampaignSet>,
}

impl AssetBundle {
    /// Check that every kit and campaign-set reference resolves in the
    /// inventory (no orphan references).
    pub fn references_resolve(&self) -> bool {
        let image_ids: Vec<&str> = self.inventory.images.iter().map(|i| i.id.as_str()).collect();
        let email_ids: Vec<&str> = self
            .inventory
            .email_assets
            .iter()
            .map(|a| a.id.as_str())
            .collect();

        for kit in &self.platform_kits {
            let caption_count = self.inventory.social_captions.get(kit.platform).len();
            if kit.captions.iter().any(|&i| i >= caption_count) {
                return false;
            }
            if kit.images.iter().any(|id| !image_ids.contains(&id.as_str())) {
                return false;
            }
            if kit.scripts.iter().any(|&i| i >= self.inventory.ugc_scripts.len()) {
                return false;
            }
        }

        for set in &self.campaign_sets {
            if set.ad_copy.iter().any(|&i| i >= self.inventory.ad_copy.len()) {
                return false;
            }
            if set.images.iter().any(|id| !image_ids.contains(&id.as_str())) {
                return false;
            }
            if set
                .captions
                .iter()
                .any(|r| r.index >= self.inventory.social_captions.get(r.platform).len())
            {
                return false;
            }
            if set
                .email_assets
                .iter()
                .any(|id| !email_ids.contains(&id.as_str()))
            {
                return false;
            }
        }
        true
    }

    /// CSV projection of ad-copy variants.
    pub fn ad_copy_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(
            &mut out,
            &["Variant", "Headline", "Primary Text", "CTA", "Description"],
        );
        for (i, variant) in self.inventory.ad_copy.iter().enumerate() {
            write_csv_row(
                &mut out,
                &[
                    &format!("Variant {}", i + 1),
                    &variant.headline,
                    &variant.primary_text,
                    variant.cta.as_deref().unwrap_or(""),
                    &variant.description,
                ],
            );
        }
        out
    }

    /// CSV projection of the social content calendar.
    pub fn social_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(
            &mut out,
            &[
                "Platform",
                "Caption Number",
                "Caption Text",
                "Character Count",
                "Hashtags",
                "Optimal Posting Time",
            ],
        );
        for (platform, captions) in self.inventory.social_captions.iter() {
            for (i, caption) in captions.iter().enumerate() {
                let hashtags = crate::parse::extract_hashtags(caption).join(", ");
                write_csv_row(
                    &mut out,
                    &[
                        platform.as_str(),
                        &(i + 1).to_string(),
                        caption,
                        &caption.chars().count().to_string(),
                        &hashtags,
                        platform.posting_window(),
                    ],
                );
            }
        }
        out
    }

    /// CSV projection of the unified asset inventory.
    ///
    /// Image assets without a url render with status `pending` rather than
    /// erroring.
    pub fn asset_inventory_csv(&self) -> String {
        let mut out = String::new();
        write_csv_row(
            &mut out,
            &["Asset Type", "Asset Name", "Description", "Dimensions", "Status"],
        );
        for image in &self.inventory.images {
            write_csv_row(
                &mut out,
                &[
                    "Image",
                    &image.id,
                    &image.description,
                    &image.dimensions,
                    image_status(image),
                ],
            );
        }
        for script in &self.inventory.ugc_scripts {
            write_csv_row(
                &mut out,
                &["UGC Script", &script.title, &script.hook, &script.duration, "ready"],
            );
        }
        for asset in &self.inventory.email_assets {
            write_csv_row(
                &mut out,
                &[
                    "Email Asset",
                    &asset.id,
                    &asset.description,
                    &asset.dimensions,
                    image_status(asset),
                ],
            );
        }
        out
    }
}

fn image_status(asset: &ImageAsset) -> &'static str {
    if asset.url.is_some() {
        "ready"
    } else {
        "pending"
    }
}

/// Assembles [`AssetBundle`]s. Stateless.
#[derive(Debug, Clone, Default)]
pub struct AssetPackager;

impl AssetPackager {
    pub fn new() -> Self {
        Self
    }

    /// Package the generated collections into a bundle.
    ///
    /// Never fails: absent tags, empty collections, and missing platforms
    /// all degrade to empty selections.
    pub fn package(
        &self,
        ad_copy: &[AdCopyVariant],
        social_captions: &SocialCaptions,
        images: &[ImageAsset],
        ugc_scripts: &[UgcScript],
        email_assets: &[ImageAsset],
        strategy: &ContentStrategy,
    ) -> AssetBundle {
        let inventory = AssetInventory {
            ad_copy: ad_copy.to_vec(),
            social_captions: social_captions.clone(),
            images: images.to_vec(),
            ugc_scripts: ugc_scripts.to_vec(),
            email_assets: email_assets.to_vec(),
        };

        let summary = build_summary(&inventory);
        let platform_kits = build_platform_kits(&inventory);
        let campaign_sets = build_campaign_sets(&inventory);

        AssetBundle {
            info: PackageInfo {
                package_id: format!("content_pkg_{}", Utc::now().format("%Y%m%d_%H%M%S")),
                created_at: Utc::now(),
                product_service: strategy.product_description.clone(),
                target_audience: strategy.target_audience.clone(),
                brand_tone: strategy.tone.clone(),
                content_pillars: strategy.content_pillars.clone(),
                key_messages: strategy.key_messages.clone(),
                version: "1.0".to_string(),
                status: "ready_for_use".to_string(),
            },
            summary,
            inventory,
            platform_kits,
            campaign_sets,
        }
    }
}

fn build_summary(inventory: &AssetInventory) -> ContentSummary {
    let mut content_types = Vec::new();
    if !inventory.ad_copy.is_empty() {
        content_types.push(ContentType::AdCopy);
    }
    if !inventory.social_captions.is_empty() {
        content_types.push(ContentType::SocialCaptions);
    }
    if !inventory.images.is_empty() {
        content_types.push(ContentType::Images);
    }
    if !inventory.ugc_scripts.is_empty() {
        content_types.push(ContentType::UgcScripts);
    }
    if !inventory.email_assets.is_empty() {
        content_types.push(ContentType::EmailAssets);
    }

    let mut platforms_covered: Vec<String> = inventory
        .social_captions
        .platforms()
        .map(|p| p.as_str().to_string())
        .collect();
    platforms_covered.push("email".to_string());
    platforms_covered.push("advertising".to_string());

    ContentSummary {
        total_assets: inventory.ad_copy.len()
            + inventory.social_captions.total()
            + inventory.images.len()
            + inventory.ugc_scripts.len()
            + inventory.email_assets.len(),
        ad_copy_variants: inventory.ad_copy.len(),
        social_platforms: inventory.social_captions.platform_count(),
        total_social_captions: inventory.social_captions.total(),
        images_generated: inventory.images.len(),
        ugc_scripts: inventory.ugc_scripts.len(),
        email_assets: inventory.email_assets.len(),
        content_types,
        platforms_covered,
    }
}

fn build_platform_kits(inventory: &AssetInventory) -> Vec<PlatformKit> {
    Platform::all()
        .into_iter()
        .map(|platform| {
            let captions = inventory.social_captions.get(platform);
            let specs = platform.image_dimensions();

            let mut hashtags: Vec<String> = Vec::new();
            for caption in captions {
                for tag in crate::parse::extract_hashtags(caption) {
                    if !hashtags.contains(&tag) {
                        hashtags.push(tag);
                    }
                }
            }

            PlatformKit {
                platform,
                captions: (0..captions.len()).collect(),
                images: inventory
                    .images
                    .iter()
                    .filter(|img| specs.contains(&img.dimensions.as_str()))
                    .map(|img| img.id.clone())
                    .collect(),
                hashtags,
                scripts: (0..inventory.ugc_scripts.len()).collect(),
                posting_window: platform.posting_window().to_string(),
            }
        })
        .collect()
}

fn build_campaign_sets(inventory: &AssetInventory) -> Vec<CampaignSet> {
    // Launch: the primary ad variant, the hero image (or first image),
    // one caption per platform, and the email header asset.
    let hero_image = inventory
        .images
        .iter()
        .find(|img| img.kind == AssetKind::HeroImage)
        .or_else(|| inventory.images.first());

    let launch = CampaignSet {
        name: "launch_campaign".to_string(),
        description: "Initial product/service launch campaign".to_string(),
        ad_copy: if inventory.ad_copy.is_empty() { vec![] } else { vec![0] },
        images: hero_image.map(|img| vec![img.id.clone()]).unwrap_or_default(),
        captions: inventory
            .social_captions
            .iter()
            .filter(|(_, captions)| !captions.is_empty())
            .map(|(platform, _)| CaptionRef { platform, index: 0 })
            .collect(),
        email_assets: inventory
            .email_assets
            .iter()
            .filter(|a| a.kind == AssetKind::EmailHeader)
            .map(|a| a.id.clone())
            .collect(),
        timeline: "Week 1: Launch announcement across all platforms".to_string(),
    };

    let engagement = CampaignSet {
        name: "engagement_campaign".to_string(),
        description: "Ongoing engagement and awareness campaign".to_string(),
        ad_copy: Vec::new(),
        images: inventory
            .images
            .iter()
            .filter(|img| img.kind == AssetKind::SocialPost)
            .map(|img| img.id.clone())
            .collect(),
        captions: inventory
            .social_captions
            .iter()
            .flat_map(|(platform, captions)| {
                (0..captions.len()).map(move |index| CaptionRef { platform, index })
            })
            .collect(),
        email_assets: Vec::new(),
        timeline: "Weeks 2-4: Sustained engagement content".to_string(),
    };

    let conversion = CampaignSet {
        name: "conversion_campaign".to_string(),
        description: "Direct response and conversion campaign".to_string(),
        ad_copy: inventory
            .ad_copy
            .iter()
            .enumerate()
            .filter(|(_, variant)| variant.cta.is_some())
            .map(|(i, _)| i)
            .collect(),
        images: inventory
            .images
            .iter()
            .filter(|img| img.kind == AssetKind::ProductShowcase)
            .map(|img| img.id.clone())
            .collect(),
        captions: Vec::new(),
        email_assets: inventory.email_assets.iter().map(|a| a.id.clone()).collect(),
        timeline: "Ongoing: Performance marketing focus".to_string(),
    };

    vec![launch, engagement, conversion]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CampaignParameters, CampaignType};

    fn strategy() -> ContentStrategy {
        let params = CampaignParameters::new("https://acme.com", CampaignType::Custom);
        let profile = crate::types::BrandProfile::fallback("https://acme.com");
        ContentStrategy::derive(&params, &profile)
    }

    fn sample_images() -> Vec<ImageAsset> {
        vec![
            ImageAsset::new("img_hero", AssetKind::HeroImage, "1200x628")
                .with_url("https://cdn.example/hero.png"),
            ImageAsset::new("img_square", AssetKind::SocialPost, "1080x1080"),
            ImageAsset::new("img_product", AssetKind::ProductShowcase, "1080x1080"),
        ]
    }

    fn sample_captions() -> SocialCaptions {
        let mut captions = SocialCaptions::new();
        captions.insert(
            Platform::Instagram,
            vec![
                "Love it! #acme #quality".to_string(),
                "Back again #acme".to_string(),
            ],
        );
        captions.insert(Platform::Tiktok, vec!["So good #viral".to_string()]);
        captions
    }

    fn sample_ad_copy() -> Vec<AdCopyVariant> {
        vec![
            AdCopyVariant {
                headline: "Big headline".to_string(),
                primary_text: "Primary".to_string(),
                description: "Desc".to_string(),
                cta: Some("Shop now".to_string()),
            },
            AdCopyVariant {
                headline: "Second".to_string(),
                primary_text: "More".to_string(),
                description: "Desc".to_string(),
                cta: None,
            },
        ]
    }

    fn bundle() -> AssetBundle {
        AssetPackager::new().package(
            &sample_ad_copy(),
            &sample_captions(),
            &sample_images(),
            &[UgcScript {
                title: "Unboxing".to_string(),
                hook: "Wait for it".to_string(),
                body: "Open the box".to_string(),
                cta: "Follow for more".to_string(),
                duration: "30s".to_string(),
            }],
            &[ImageAsset::new("email_hdr", AssetKind::EmailHeader, "600x200")],
            &strategy(),
        )
    }

    #[test]
    fn test_summary_counts() {
        let b = bundle();
        assert_eq!(b.summary.ad_copy_variants, 2);
        assert_eq!(b.summary.total_social_captions, 3);
        assert_eq!(b.summary.social_platforms, 2);
        assert_eq!(b.summary.images_generated, 3);
        assert_eq!(b.summary.email_assets, 1);
        assert_eq!(b.summary.total_assets, 2 + 3 + 3 + 1 + 1);
    }

    #[test]
    fn test_content_types_order_preserving() {
        let b = bundle();
        assert_eq!(
            b.summary.content_types,
            vec![
                ContentType::AdCopy,
                ContentType::SocialCaptions,
                ContentType::Images,
                ContentType::UgcScripts,
                ContentType::EmailAssets,
            ]
        );
    }

    #[test]
    fn test_platform_kit_filters_by_dimensions() {
        let b = bundle();
        let instagram = b
            .platform_kits
            .iter()
            .find(|k| k.platform == Platform::Instagram)
            .unwrap();
        assert_eq!(instagram.images, vec!["img_square", "img_product"]);
        assert!(instagram.hashtags.contains(&"#acme".to_string()));
        assert_eq!(instagram.captions, vec![0, 1]);

        let facebook = b
            .platform_kits
            .iter()
            .find(|k| k.platform == Platform::Facebook)
            .unwrap();
        assert!(facebook.images.contains(&"img_hero".to_string()));
        assert!(facebook.captions.is_empty());
    }

    #[test]
    fn test_launch_set_selections() {
        let b = bundle();
        let launch = &b.campaign_sets[0];
        assert_eq!(launch.name, "launch_campaign");
        assert_eq!(launch.ad_copy, vec![0]);
        assert_eq!(launch.images, vec!["img_hero"]);
        assert_eq!(launch.email_assets, vec!["email_hdr"]);
        assert_eq!(launch.captions.len(), 2);
        assert!(launch.captions.iter().all(|r| r.index == 0));
    }

    #[test]
    fn test_conversion_set_requires_cta() {
        let b = bundle();
        let conversion = &b.campaign_sets[2];
        assert_eq!(conversion.ad_copy, vec![0]);
        assert_eq!(conversion.images, vec!["img_product"]);
        assert_eq!(conversion.email_assets, vec!["email_hdr"]);
    }

    #[test]
    fn test_hero_fallback_to_first_image() {
        let images = vec![ImageAsset::new("only", AssetKind::SocialPost, "1080x1080")];
        let b = AssetPackager::new().package(
            &[],
            &SocialCaptions::new(),
            &images,
            &[],
            &[],
            &strategy(),
        );
        assert_eq!(b.campaign_sets[0].images, vec!["only"]);
    }

    #[test]
    fn test_empty_inputs_produce_empty_bundle() {
        let b = AssetPackager::new().package(
            &[],
            &SocialCaptions::new(),
            &[],
            &[],
            &[],
            &strategy(),
        );
        assert_eq!(b.summary.total_assets, 0);
        assert!(b.summary.content_types.is_empty());
        assert!(b.campaign_sets[0].ad_copy.is_empty());
        assert!(b.campaign_sets[0].images.is_empty());
        assert!(b.references_resolve());
    }

    #[test]
    fn test_all_references_resolve() {
        assert!(bundle().references_resolve());
    }

    #[test]
    fn test_ad_copy_csv() {
        let csv = bundle().ad_copy_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Variant,Headline,Primary Text,CTA,Description");
        assert!(lines[1].starts_with("Variant 1,Big headline,"));
        assert!(lines[2].contains("Second"));
    }

    #[test]
    fn test_social_csv_posting_times() {
        let csv = bundle().social_csv();
        assert!(csv.contains("instagram,1,"));
        assert!(csv.contains("11:00 AM - 2:00 PM"));
        assert!(csv.contains("#acme"));
    }

    #[test]
    fn test_inventory_csv_pending_status() {
        let csv = bundle().asset_inventory_csv();
        assert!(csv.contains("Image,img_hero,"));
        assert!(csv.lines().any(|l| l.starts_with("Image,img_square") && l.ends_with("pending")));
        assert!(csv.lines().any(|l| l.starts_with("Image,img_hero") && l.ends_with("ready")));
        assert!(csv.contains("UGC Script,Unboxing,"));
    }
}
