//! Brand analysis: turning a URL into a [`BrandProfile`].
//!
//! The default provider fetches the brand homepage, reduces the HTML to a
//! small text digest, and asks the generation service to summarize it into a
//! structured profile. Analysis never fails the run: any error at any stage
//! yields the documented fallback profile with `degraded` set, and the
//! pipeline proceeds with it.

use crate::generation::{with_backoff, CompletionRequest};
use crate::run_ctx::RunCtx;
use crate::types::BrandProfile;
use async_trait::async_trait;

/// Maximum characters of page text included in the analysis prompt.
const PAGE_DIGEST_LIMIT: usize = 2000;

/// Source of brand profiles.
///
/// Implementations must be infallible: when analysis cannot complete, return
/// [`BrandProfile::fallback`] rather than an error.
#[async_trait]
pub trait BrandProfileProvider: Send + Sync {
    /// Produce a profile for the given brand URL.
    async fn analyze(&self, ctx: &RunCtx, url: &str) -> BrandProfile;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Provider that fetches the homepage and summarizes it via the generation
/// service.
#[derive(Debug, Clone, Default)]
pub struct HttpBrandProvider;

impl HttpBrandProvider {
    pub fn new() -> Self {
        Self
    }

    async fn try_analyze(&self, ctx: &RunCtx, url: &str) -> Option<BrandProfile> {
        let digest = fetch_page_digest(ctx, url).await?;
        let prompt = format!(
            "Analyze this website content and produce a brand profile as JSON \
             with fields: name, description, products (list), target_audience, \
             value_propositions (list), keywords (list), colors (list), tone, \
             content_themes (list).\n\nURL: {}\n\nContent:\n{}\n\n\
             Respond with only the JSON object.",
            url, digest
        );
        let request = CompletionRequest::new(
            prompt,
            "You are a brand analyst. Respond with valid JSON only.",
        )
        .with_temperature(0.3);

        let completion = with_backoff(
            &ctx.service,
            &ctx.client,
            &request,
            &ctx.backoff,
            ctx.cancel_flag(),
            None,
        )
        .await
        .ok()?;

        profile_from_response(url, &completion.text)
    }
}

#[async_trait]
impl BrandProfileProvider for HttpBrandProvider {
    async fn analyze(&self, ctx: &RunCtx, url: &str) -> BrandProfile {
        match self.try_analyze(ctx, url).await {
            Some(profile) => profile,
            None => {
                tracing::warn!(url, "brand analysis failed, using fallback profile");
                BrandProfile::fallback(url)
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Provider that returns a fixed profile, for tests and offline runs.
///
/// The stored profile's `url` is overwritten with the requested one.
#[derive(Debug, Clone)]
pub struct StaticBrandProvider {
    profile: BrandProfile,
}

impl StaticBrandProvider {
    pub fn new(profile: BrandProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl BrandProfileProvider for StaticBrandProvider {
    async fn analyze(&self, _ctx: &RunCtx, url: &str) -> BrandProfile {
        let mut profile = self.profile.clone();
        profile.url = url.to_string();
        profile
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Fetch the page and reduce it to a prompt-sized text digest.
async fn fetch_page_digest(ctx: &RunCtx, url: &str) -> Option<String> {
    let response = ctx
        .client
        .get(url)
        .header(
            "User-Agent",
            "Mozilla/5.0 (compatible; campaign-pipeline/0.1)",
        )
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        tracing::debug!(url, status = %response.status(), "brand page fetch failed");
        return None;
    }
    let html = response.text().await.ok()?;

    let mut digest = String::new();
    if let Some(title) = extract_element(&html, "title") {
        digest.push_str("Title: ");
        digest.push_str(&title);
        digest.push('\n');
    }
    if let Some(description) = extract_meta_description(&html) {
        digest.push_str("Description: ");
        digest.push_str(&description);
        digest.push('\n');
    }
    digest.push_str(&strip_tags(&html));

    let digest: String = digest.chars().take(PAGE_DIGEST_LIMIT).collect();
    let digest = digest.trim().to_string();
    if digest.is_empty() {
        None
    } else {
        Some(digest)
    }
}

/// Build a profile from the model's JSON response. Missing fields take the
/// fallback's values; `None` when no JSON object can be extracted at all.
fn profile_from_response(url: &str, text: &str) -> Option<BrandProfile> {
    let value = crate::parse::extract_json(text)?;
    let fallback = BrandProfile::fallback(url);
    Some(BrandProfile {
        url: url.to_string(),
        name: crate::parse::json_str(&value, "name").unwrap_or(fallback.name),
        description: crate::parse::json_str(&value, "description")
            .unwrap_or_else(|| "".to_string()),
        products: non_empty_or(
            crate::parse::json_str_list(&value, "products"),
            fallback.products,
        ),
        target_audience: crate::parse::json_str(&value, "target_audience")
            .unwrap_or(fallback.target_audience),
        value_propositions: crate::parse::json_str_list(&value, "value_propositions"),
        keywords: crate::parse::json_str_list(&value, "keywords"),
        colors: crate::parse::json_str_list(&value, "colors"),
        tone: crate::parse::json_str(&value, "tone").unwrap_or(fallback.tone),
        content_themes: crate::parse::json_str_list(&value, "content_themes"),
        degraded: false,
    })
}

fn non_empty_or(list: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    if list.is_empty() {
        fallback
    } else {
        list
    }
}

/// Inner text of the first `<tag>...</tag>` element, entity-naive.
fn extract_element(html: &str, tag: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let open_at = lower.find(&open)?;
    let content_at = open_at + lower[open_at..].find('>')? + 1;
    let close_at = content_at + lower[content_at..].find(&close)?;
    let text = html[content_at..close_at].trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Content of `<meta name="description" content="...">`, if present.
fn extract_meta_description(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(relative) = lower[search_from..].find("<meta") {
        let meta_at = search_from + relative;
        let end = meta_at + lower[meta_at..].find('>')?;
        let tag = &lower[meta_at..end];
        if tag.contains("name=\"description\"") || tag.contains("name='description'") {
            let original = &html[meta_at..end];
            return attribute_value(original, "content");
        }
        search_from = end + 1;
    }
    None
}

fn attribute_value(tag: &str, attribute: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let key = format!("{}=", attribute);
    let key_at = lower.find(&key)?;
    let rest = &tag[key_at + key.len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = &rest[1..];
    let end = inner.find(quote)?;
    let value = inner[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Strip HTML down to visible text: tags removed, scripts and styles
/// dropped, whitespace collapsed.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len() / 4);
    let mut chars = html.char_indices().peekable();
    let lower = html.to_ascii_lowercase();
    let mut skip_until: Option<usize> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(until) = skip_until {
            if i < until {
                continue;
            }
            skip_until = None;
        }
        if c == '<' {
            let rest = &lower[i..];
            for blocked in ["<script", "<style"] {
                if rest.starts_with(blocked) {
                    let close = format!("</{}>", &blocked[1..]);
                    if let Some(end) = rest.find(&close) {
                        skip_until = Some(i + end + close.len());
                    }
                }
            }
            if skip_until.is_none() {
                if let Some(end) = rest.find('>') {
                    skip_until = Some(i + end + 1);
                }
            }
            text.push(' ');
            continue;
        }
        text.push(c);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
