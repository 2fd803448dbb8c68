//! Export adapters: pure projections of a [`CampaignFlow`] into target
//! schemas.
//!
//! Each adapter renders the same canonical delivery-step list; no adapter
//! re-runs composition or mutates the flow. Rendering is deterministic for
//! a given flow, so repeated exports of the same flow are byte-identical.

use crate::flow::{CampaignFlow, DeliveryStep};
use crate::types::{CampaignType, Channel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Schema version stamped into the generic JSON export.
pub const EXPORT_SCHEMA_VERSION: &str = "1.0";

/// CSV body column truncation length.
const CSV_BODY_LIMIT: usize = 100;

/// Named export formats supported by every flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Full structure dump with an explicit schema version field.
    GenericJson,
    /// One CSV row per delivery step.
    GenericCsv,
    /// Klaviyo-style flow: trigger filters, ordered messages, settings.
    Klaviyo,
    /// Mailchimp-style automation: audience trigger plus email actions.
    Mailchimp,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::GenericJson => "generic_json",
            ExportFormat::GenericCsv => "generic_csv",
            ExportFormat::Klaviyo => "klaviyo",
            ExportFormat::Mailchimp => "mailchimp",
        }
    }

    /// All supported formats, in documentation order.
    pub fn all() -> [ExportFormat; 4] {
        [
            ExportFormat::GenericJson,
            ExportFormat::GenericCsv,
            ExportFormat::Klaviyo,
            ExportFormat::Mailchimp,
        ]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a flow in the named format.
///
/// CSV output is carried as a JSON string value so all formats share one
/// return type.
pub fn render(flow: &CampaignFlow, format: ExportFormat) -> Value {
    match format {
        ExportFormat::GenericJson => render_generic_json(flow),
        ExportFormat::GenericCsv => Value::String(render_generic_csv(flow)),
        ExportFormat::Klaviyo => render_klaviyo(flow),
        ExportFormat::Mailchimp => render_mailchimp(flow),
    }
}

fn render_generic_json(flow: &CampaignFlow) -> Value {
    json!({
        "schema_version": EXPORT_SCHEMA_VERSION,
        "flow_id": flow.flow_id,
        "flow_name": flow.name,
        "campaign_type": flow.campaign_type.display_name(),
        "created_at": flow.created_at.to_rfc3339(),
        "status": flow.status,
        "entry_trigger": {
            "type": flow.entry_trigger.trigger_type,
            "description": flow.entry_trigger.description,
        },
        "exit_triggers": flow.exit_triggers.iter().map(|t| json!({
            "type": t.kind,
            "condition": t.condition,
            "action": t.action,
        })).collect::<Vec<_>>(),
        "sequence": flow.steps.iter().map(step_json).collect::<Vec<_>>(),
        "segmentation": serde_json::to_value(&flow.segmentation).unwrap_or(Value::Null),
        "personalization": serde_json::to_value(&flow.personalization).unwrap_or(Value::Null),
        "timing": {
            "frequency_capping": {
                "max_emails_per_day": flow.timing.max_emails_per_day,
                "max_sms_per_week": flow.timing.max_sms_per_week,
                "respect_quiet_hours": flow.timing.respect_quiet_hours,
            },
            "quiet_hours": {
                "start": flow.timing.quiet_hours.0,
                "end": flow.timing.quiet_hours.1,
            },
        },
    })
}

fn step_json(step: &DeliveryStep) -> Value {
    let content = match step.channel {
        Channel::Email => json!({
            "subject": step.message.subject.clone().unwrap_or_default(),
            "preview_text": step.message.preview_text.clone().unwrap_or_default(),
            "body_html": email_html(step),
            "body_text": step.message.body,
            "cta": step.message.cta,
            "personalization": step.message.personalization,
        }),
        Channel::Sms => json!({
            "message": step.message.body,
            "sender_id": "{{brand_shortcode}}",
            "personalization": step.message.personalization,
        }),
    };

    json!({
        "step_id": step.id,
        "step_type": step.channel.as_str(),
        "step_name": step.name,
        "delay": {
            "type": "time_delay",
            "value": step.delay_hours,
            "unit": "hours",
        },
        "content": content,
        "conditions": step.conditions.iter().map(|c| json!({
            "type": c.kind,
            "description": c.description,
        })).collect::<Vec<_>>(),
        "next_step": step.next_step_label(),
    })
}

/// Minimal deployable HTML shell around the email body: paragraphs, an
/// optional CTA button, and standard placeholder slots.
fn email_html(step: &DeliveryStep) -> String {
    let paragraphs: String = step
        .message
        .body
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", p.trim().replace('\n', "<br>")))
        .collect();

    let cta_block = match &step.message.cta {
        Some(cta) if !cta.is_empty() => format!(
            "<div style=\"text-align: center; margin: 30px 0;\">\
             <a href=\"#\" style=\"display: inline-block; padding: 15px 30px; \
             background-color: #007bff; color: white; text-decoration: none; \
             border-radius: 5px; font-weight: bold;\">{}</a></div>",
            cta
        ),
        _ => String::new(),
    };

    format!(
        "<!DOCTYPE html><html><body style=\"margin: 0; padding: 20px; \
         font-family: Arial, sans-serif;\">\
         <div style=\"max-width: 600px; margin: 0 auto;\">\
         <div style=\"line-height: 1.6; color: #333;\">{}</div>{}\
         <div style=\"margin-top: 40px; font-size: 12px; color: #666; \
         text-align: center;\"><p>{{{{unsubscribe_link}}}}</p>\
         <p>{{{{company_address}}}}</p></div></div></body></html>",
        paragraphs, cta_block
    )
}

/// One row per delivery step: type, sequence, subject-or-message,
/// truncated body, delay hours, purpose.
fn render_generic_csv(flow: &CampaignFlow) -> String {
    let mut out = String::new();
    write_csv_row(
        &mut out,
        &[
            "Type",
            "Sequence",
            "Subject/Message",
            "Body",
            "Delay Hours",
            "Purpose",
        ],
    );

    for step in &flow.steps {
        let (kind, headline, body) = match step.channel {
            Channel::Email => (
                "Email",
                step.message.subject.clone().unwrap_or_default(),
                truncate_body(&step.message.body),
            ),
            Channel::Sms => ("SMS", step.message.body.clone(), String::new()),
        };
        write_csv_row(
            &mut out,
            &[
                kind,
                &step.message.sequence.to_string(),
                &headline,
                &body,
                &step.delay_hours.to_string(),
                &step.message.purpose,
            ],
        );
    }
    out
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= CSV_BODY_LIMIT {
        return body.to_string();
    }
    let truncated: String = body.chars().take(CSV_BODY_LIMIT).collect();
    format!("{}...", truncated)
}

pub(crate) fn write_csv_row(out: &mut String, fields: &[&str]) {
    let rendered: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    out.push_str(&rendered.join(","));
    out.push('\n');
}

/// RFC 4180 quoting: fields containing commas, quotes, or newlines are
/// wrapped in quotes with inner quotes doubled.
pub(crate) fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_klaviyo(flow: &CampaignFlow) -> Value {
    let messages: Vec<Value> = flow
        .steps
        .iter()
        .map(|step| match step.channel {
            Channel::Email => json!({
                "type": "email",
                "name": step.name,
                "delay": step.delay_hours,
                "delay_unit": "hours",
                "subject": step.message.subject.clone().unwrap_or_default(),
                "preview_text": step.message.preview_text.clone().unwrap_or_default(),
                "body": email_html(step),
                "from_email": "{{ organization.from_email }}",
                "from_name": "{{ organization.from_name }}",
            }),
            Channel::Sms => json!({
                "type": "sms",
                "name": step.name,
                "delay": step.delay_hours,
                "delay_unit": "hours",
                "body": step.message.body,
                "media_url": null,
            }),
        })
        .collect();

    json!({
        "flow_name": flow.name,
        "trigger_filters": klaviyo_trigger_filters(flow.campaign_type),
        "flow_filters": [
            {"type": "property", "property": "email", "operator": "is set"},
            {
                "type": "property",
                "property": "can_receive_email_marketing",
                "operator": "equals",
                "value": true,
            },
        ],
        "messages": messages,
        "settings": {
            "smart_sending": true,
            "quiet_hours": {
                "start": flow.timing.quiet_hours.0,
                "end": flow.timing.quiet_hours.1,
            },
        },
    })
}

fn klaviyo_trigger_filters(campaign_type: CampaignType) -> Value {
    match campaign_type {
        CampaignType::CartAbandonment => json!([{
            "type": "event",
            "event": "Started Checkout",
            "constraint": {
                "and": [{"field": "$value", "operator": "greater than", "value": 0}]
            },
        }]),
        CampaignType::WelcomeSeries => json!([{"type": "list", "list_id": "welcome_list"}]),
        CampaignType::PostPurchase => json!([{
            "type": "event",
            "event": "Placed Order",
            "constraint": {
                "and": [{"field": "$value", "operator": "greater than", "value": 0}]
            },
        }]),
        CampaignType::WinBack | CampaignType::Custom => json!([]),
    }
}

fn render_mailchimp(flow: &CampaignFlow) -> Value {
    let emails: Vec<Value> = flow
        .steps
        .iter()
        .filter(|step| step.channel == Channel::Email)
        .map(|step| {
            json!({
                "delay": step.delay_hours,
                "delay_unit": "hours",
                "subject": step.message.subject.clone().unwrap_or_default(),
                "content": email_html(step),
            })
        })
        .collect();

    json!({
        "automation_name": flow.name,
        "trigger_type": "audience",
        "emails": emails,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::SequenceComposer;
    use crate::types::{CampaignPlan, MessageUnit};

    fn sample_flow(campaign_type: CampaignType) -> CampaignFlow {
        let plan = CampaignPlan::minimal(campaign_type, "Acme");
        let mut email = MessageUnit::email(1, "Forgot something?", "Your cart is waiting.\n\nCome back soon.")
            .with_delay(1);
        email.cta = Some("Complete your order".to_string());
        email.purpose = "Reminder".to_string();
        let mut text = MessageUnit::sms(1, "Your cart expires soon").with_delay(2);
        text.purpose = "Urgency".to_string();
        SequenceComposer::new().compose(&plan, &[email], &[text])
    }

    #[test]
    fn test_generic_json_has_schema_version_and_sentinel() {
        let flow = sample_flow(CampaignType::CartAbandonment);
        let value = render(&flow, ExportFormat::GenericJson);
        assert_eq!(value["schema_version"], EXPORT_SCHEMA_VERSION);
        let sequence = value["sequence"].as_array().unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[0]["next_step"], "step_2");
        assert_eq!(sequence[1]["next_step"], "end_flow");
    }

    #[test]
    fn test_generic_csv_rows_and_header() {
        let flow = sample_flow(CampaignType::CartAbandonment);
        let value = render(&flow, ExportFormat::GenericCsv);
        let csv = value.as_str().unwrap();
        assert!(csv.starts_with("Type,Sequence,Subject/Message,Body,Delay Hours,Purpose\n"));
        // The email body spans physical lines; the quoted field keeps it one
        // record.
        assert!(csv.contains(
            "Email,1,Forgot something?,\"Your cart is waiting.\n\nCome back soon.\",1,Reminder"
        ));
        assert!(csv.contains("SMS,1,Your cart expires soon,,2,Urgency"));
    }

    #[test]
    fn test_csv_escaping_and_truncation() {
        let long_body = "a".repeat(150);
        let mut email = MessageUnit::email(1, "Hello, friend", long_body).with_delay(1);
        email.purpose = "Say \"hi\"".to_string();
        let plan = CampaignPlan::minimal(CampaignType::Custom, "Acme");
        let flow = SequenceComposer::new().compose(&plan, &[email], &[]);

        let value = render(&flow, ExportFormat::GenericCsv);
        let csv = value.as_str().unwrap();
        assert!(csv.contains("\"Hello, friend\""));
        assert!(csv.contains("\"Say \"\"hi\"\"\""));
        assert!(csv.contains(&format!("{}...", "a".repeat(100))));
    }

    #[test]
    fn test_klaviyo_export_shape() {
        let flow = sample_flow(CampaignType::CartAbandonment);
        let value = render(&flow, ExportFormat::Klaviyo);

        assert_eq!(value["settings"]["smart_sending"], true);
        assert_eq!(value["settings"]["quiet_hours"]["start"], "22:00");
        assert_eq!(value["settings"]["quiet_hours"]["end"], "08:00");
        assert_eq!(value["trigger_filters"][0]["event"], "Started Checkout");

        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["type"], "email");
        assert_eq!(messages[0]["delay"], 1);
        assert_eq!(messages[1]["type"], "sms");
        assert!(messages[1]["media_url"].is_null());
    }

    #[test]
    fn test_klaviyo_winback_has_no_trigger_filters() {
        let flow = sample_flow(CampaignType::WinBack);
        let value = render(&flow, ExportFormat::Klaviyo);
        assert!(value["trigger_filters"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_mailchimp_emails_only() {
        let flow = sample_flow(CampaignType::WelcomeSeries);
        let value = render(&flow, ExportFormat::Mailchimp);
        assert_eq!(value["trigger_type"], "audience");
        let emails = value["emails"].as_array().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0]["subject"], "Forgot something?");
    }

    #[test]
    fn test_render_is_idempotent() {
        let flow = sample_flow(CampaignType::CartAbandonment);
        for format in ExportFormat::all() {
            assert_eq!(render(&flow, format), render(&flow, format));
        }
    }

    #[test]
    fn test_lazy_cache_returns_same_value() {
        let mut flow = sample_flow(CampaignType::CartAbandonment);
        let fresh = flow.render_export(ExportFormat::GenericJson);
        let cached = flow.to_export_format(ExportFormat::GenericJson).clone();
        assert_eq!(fresh, cached);
        assert_eq!(*flow.to_export_format(ExportFormat::GenericJson), cached);
    }

    #[test]
    fn test_email_html_contains_cta_and_placeholders() {
        let flow = sample_flow(CampaignType::CartAbandonment);
        let html = email_html(&flow.steps[0]);
        assert!(html.contains("Complete your order"));
        assert!(html.contains("{{unsubscribe_link}}"));
        assert!(html.contains("<p>Your cart is waiting.</p>"));
    }

    #[test]
    fn test_empty_flow_exports_cleanly() {
        let plan = CampaignPlan::minimal(CampaignType::Custom, "Acme");
        let flow = SequenceComposer::new().compose(&plan, &[], &[]);
        let csv = render(&flow, ExportFormat::GenericCsv);
        assert_eq!(csv.as_str().unwrap().lines().count(), 1);
        let json = render(&flow, ExportFormat::GenericJson);
        assert!(json["sequence"].as_array().unwrap().is_empty());
    }
}
