//! Defensive parsing of model responses.
//!
//! Generated text arrives as loosely structured prose with labeled lines
//! (`Subject: ...`, `CTA: ...`), optional code fences, and embedded JSON.
//! Every function here degrades instead of failing: a response that does not
//! match the expected shape yields documented fallback values, never an
//! error. Malformed output from the provider must not sink a step.

use serde_json::Value;

/// Subject line substituted when a response carries no usable subject.
pub const FALLBACK_SUBJECT: &str = "Don't miss out - special offer inside!";

/// SMS body length cap. Messages are trimmed at a word boundary below this.
pub const SMS_MAX_CHARS: usize = 160;

/// A generated email split into its envelope parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub subject: String,
    pub preview: Option<String>,
    pub body: String,
    pub cta: Option<String>,
}

/// Extract the value of a `Label: value` line, case-insensitively.
///
/// Leading markdown emphasis around the label (`**Subject:**`) is tolerated.
/// Returns `None` when no line starts with the label or the value is empty.
pub fn extract_labeled(text: &str, label: &str) -> Option<String> {
    let needle = format!("{}:", label.to_lowercase());
    for line in text.lines() {
        let stripped = line.trim().trim_start_matches(['*', '#', '-', ' ']);
        if stripped.to_lowercase().starts_with(&needle) {
            let value = stripped[needle.len()..]
                .trim()
                .trim_matches(['*', '"'])
                .trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Split a generated email response into subject, preview, body, and CTA.
///
/// Labeled lines are consumed; everything unlabeled becomes the body. A
/// missing subject falls back to [`FALLBACK_SUBJECT`], and a missing body
/// falls back to the whole response text.
pub fn parse_email(text: &str) -> ParsedEmail {
    let subject =
        extract_labeled(text, "Subject").unwrap_or_else(|| FALLBACK_SUBJECT.to_string());
    let preview =
        extract_labeled(text, "Preview").or_else(|| extract_labeled(text, "Preview Text"));
    let cta =
        extract_labeled(text, "CTA").or_else(|| extract_labeled(text, "Call to Action"));

    let body: String = text
        .lines()
        .filter(|line| {
            let lower = line
                .trim()
                .trim_start_matches(['*', '#', '-', ' '])
                .to_lowercase();
            !(lower.starts_with("subject:")
                || lower.starts_with("preview:")
                || lower.starts_with("preview text:")
                || lower.starts_with("cta:")
                || lower.starts_with("call to action:"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let body = if body.is_empty() {
        text.trim().to_string()
    } else {
        body
    };

    ParsedEmail {
        subject,
        preview,
        body,
        cta,
    }
}

/// Normalize a generated SMS response to a single message within the length
/// cap.
///
/// Label prefixes and surrounding quotes are stripped; text beyond
/// [`SMS_MAX_CHARS`] is trimmed back to the last word boundary.
pub fn parse_sms(text: &str) -> String {
    let message = extract_labeled(text, "Message")
        .or_else(|| extract_labeled(text, "SMS"))
        .unwrap_or_else(|| {
            text.lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("")
                .trim_matches('"')
                .to_string()
        });

    if message.chars().count() <= SMS_MAX_CHARS {
        return message;
    }
    let head: String = message.chars().take(SMS_MAX_CHARS).collect();
    match head.rfind(char::is_whitespace) {
        Some(cut) => head[..cut].trim_end().to_string(),
        None => head,
    }
}

/// Collect `{{tag}}` personalization placeholders from a message body.
///
/// Tags are returned in first-appearance order, deduplicated.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let tag = after[..end].trim().to_string();
                if !tag.is_empty() && !tags.contains(&tag) {
                    tags.push(tag);
                }
                rest = &after[end + 2..];
            }
            None => break,
        }
    }
    tags
}

/// Collect `#hashtag` tokens from a caption, deduplicated, `#` retained.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for token in text.split_whitespace() {
        if let Some(stripped) = token.strip_prefix('#') {
            let word: String = stripped
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !word.is_empty() {
                let tag = format!("#{}", word);
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
    }
    tags
}

/// Extract the first JSON object embedded in a response.
///
/// Handles code fences and surrounding prose by scanning from the first `{`
/// to its matching close brace. Returns `None` when no parseable object is
/// found.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + 1];
                    return serde_json::from_str(candidate).ok();
                }
            }
            _ => {}
        }
    }
    None
}

/// Read a string field from a JSON object, empty-tolerant.
pub fn json_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read a string-array field from a JSON object. A scalar string is
/// promoted to a one-element list.
pub fn json_str_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
