//! Composed campaign flow: the ordered, platform-deliverable timeline.
//!
//! A [`CampaignFlow`] is produced once by the
//! [`SequenceComposer`](crate::compose::SequenceComposer) and is immutable
//! afterward, except for its export cache: named export formats are rendered
//! lazily on first request and memoized, all derived from the same canonical
//! [`DeliveryStep`] list.

use crate::export::ExportFormat;
use crate::types::{CampaignType, Channel, MessageUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Sentinel `nextStep` value marking the end of the timeline in exported
/// representations.
pub const END_FLOW: &str = "end_flow";

/// One node in the composed delivery timeline.
///
/// Steps form a linked list via `next_step`; the last step's pointer is
/// `None` and renders as [`END_FLOW`] in exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStep {
    /// Synthetic id, `step_1` through `step_n` in timeline order.
    pub id: String,
    pub channel: Channel,
    /// Display name, e.g. `"Email 2"` (per-channel sequence number).
    pub name: String,
    /// Resolved delay after the entry trigger, in hours.
    pub delay_hours: u32,
    /// The message this step delivers.
    pub message: MessageUnit,
    /// Applicability conditions checked before delivery.
    pub conditions: Vec<DeliveryCondition>,
    /// Id of the following step; `None` for the last step.
    pub next_step: Option<String>,
}

impl DeliveryStep {
    /// The `nextStep` value as exported: the following step's id or the
    /// [`END_FLOW`] sentinel.
    pub fn next_step_label(&self) -> &str {
        self.next_step.as_deref().unwrap_or(END_FLOW)
    }
}

/// A precondition for delivering one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCondition {
    pub kind: String,
    pub description: String,
}

impl DeliveryCondition {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }
}

/// Entry trigger that starts the flow for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryTrigger {
    /// Trigger type resolved from the campaign type
    /// (e.g. `cart_abandonment`).
    pub trigger_type: String,
    pub description: String,
}

/// A condition that removes a user from the flow or completes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitTrigger {
    pub kind: String,
    pub condition: String,
    pub action: String,
}

/// The three fixed exit triggers carried by every flow, regardless of
/// campaign type.
pub fn standard_exit_triggers() -> Vec<ExitTrigger> {
    vec![
        ExitTrigger {
            kind: "goal_achieved".to_string(),
            condition: "user_converts".to_string(),
            action: "remove_from_flow".to_string(),
        },
        ExitTrigger {
            kind: "user_action".to_string(),
            condition: "unsubscribe".to_string(),
            action: "remove_from_flow".to_string(),
        },
        ExitTrigger {
            kind: "time_limit".to_string(),
            condition: "30_days_elapsed".to_string(),
            action: "complete_flow".to_string(),
        },
    ]
}

/// A named audience segment with its membership conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub description: String,
    pub conditions: Vec<String>,
}

/// Targeting and exclusion rules for the flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    pub target_segments: Vec<Segment>,
    /// Always contains the two standard exclusions (recent converters,
    /// suppressed users).
    pub exclusion_segments: Vec<Segment>,
}

/// Personalization tags in use across the flow plus their fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personalization {
    /// All distinct `{{tag}}` placeholders used by any message, sorted.
    pub tags_used: Vec<String>,
    /// Substitutions applied when a tag has no value for a recipient.
    pub fallback_values: HashMap<String, String>,
}

/// Frequency caps and send-window policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingRules {
    pub max_emails_per_day: u32,
    pub max_sms_per_week: u32,
    pub respect_quiet_hours: bool,
    /// Quiet-hours window as `(start, end)` local times, `"HH:MM"`.
    pub quiet_hours: (String, String),
}

impl Default for TimingRules {
    fn default() -> Self {
        Self {
            max_emails_per_day: 2,
            max_sms_per_week: 3,
            respect_quiet_hours: true,
            quiet_hours: ("22:00".to_string(), "08:00".to_string()),
        }
    }
}

/// The finalized composition: one campaign's deliverable timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignFlow {
    /// Unique per run: `<campaign_slug>_flow_<YYYYmmdd_HHMMSS>`.
    pub flow_id: String,
    /// Human-readable: `<brand> - <campaign display name> Campaign`.
    pub name: String,
    pub campaign_type: CampaignType,
    pub created_at: DateTime<Utc>,
    /// Always `"draft"` at composition time.
    pub status: String,
    pub entry_trigger: EntryTrigger,
    pub exit_triggers: Vec<ExitTrigger>,
    pub steps: Vec<DeliveryStep>,
    pub segmentation: Segmentation,
    pub personalization: Personalization,
    pub timing: TimingRules,
    /// Lazily rendered export representations, keyed by format.
    #[serde(skip)]
    exports: HashMap<ExportFormat, Value>,
}

impl CampaignFlow {
    pub(crate) fn new(
        flow_id: String,
        name: String,
        campaign_type: CampaignType,
        entry_trigger: EntryTrigger,
        steps: Vec<DeliveryStep>,
        segmentation: Segmentation,
        personalization: Personalization,
    ) -> Self {
        Self {
            flow_id,
            name,
            campaign_type,
            created_at: Utc::now(),
            status: "draft".to_string(),
            entry_trigger,
            exit_triggers: standard_exit_triggers(),
            steps,
            segmentation,
            personalization,
            timing: TimingRules::default(),
            exports: HashMap::new(),
        }
    }

    /// Render the flow in the named export format, memoizing the result.
    ///
    /// Rendering is a pure projection of the flow's fields, so repeated
    /// calls return identical output.
    pub fn to_export_format(&mut self, format: ExportFormat) -> &Value {
        if !self.exports.contains_key(&format) {
            let rendered = crate::export::render(self, format);
            self.exports.insert(format, rendered);
        }
        &self.exports[&format]
    }

    /// Render without touching the cache. Used by callers holding only a
    /// shared reference.
    pub fn render_export(&self, format: ExportFormat) -> Value {
        crate::export::render(self, format)
    }

    /// Number of delivery steps in the timeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_exit_triggers_fixed_policy() {
        let triggers = standard_exit_triggers();
        assert_eq!(triggers.len(), 3);
        assert_eq!(triggers[0].kind, "goal_achieved");
        assert_eq!(triggers[1].condition, "unsubscribe");
        assert_eq!(triggers[2].action, "complete_flow");
    }

    #[test]
    fn test_next_step_label_sentinel() {
        let step = DeliveryStep {
            id: "step_1".to_string(),
            channel: Channel::Email,
            name: "Email 1".to_string(),
            delay_hours: 1,
            message: MessageUnit::email(1, "Hi", "Body"),
            conditions: Vec::new(),
            next_step: None,
        };
        assert_eq!(step.next_step_label(), END_FLOW);
    }

    #[test]
    fn test_timing_defaults() {
        let timing = TimingRules::default();
        assert_eq!(timing.max_emails_per_day, 2);
        assert_eq!(timing.max_sms_per_week, 3);
        assert_eq!(timing.quiet_hours.0, "22:00");
    }
}
