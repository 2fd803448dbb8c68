//! Sequence composition: merging channel collections into one timeline.
//!
//! The [`SequenceComposer`] takes independently generated email and SMS
//! collections and produces a [`CampaignFlow`]: a single chronologically
//! ordered delivery timeline with trigger, segmentation, and
//! personalization rules. Composition is total over its inputs: every
//! message unit appears exactly once in the output, and empty inputs yield
//! a flow with an empty step list rather than an error.

use crate::flow::{
    CampaignFlow, DeliveryCondition, DeliveryStep, EntryTrigger, Personalization, Segment,
    Segmentation,
};
use crate::types::{CampaignPlan, CampaignType, Channel, MessageUnit};
use chrono::Utc;
use std::collections::HashMap;

/// Builds [`CampaignFlow`]s from generated message collections.
///
/// Stateless; one composer can serve any number of compositions.
///
/// # Example
///
/// ```
/// use campaign_pipeline::compose::SequenceComposer;
/// use campaign_pipeline::types::{CampaignPlan, CampaignType, MessageUnit};
///
/// let plan = CampaignPlan::minimal(CampaignType::CartAbandonment, "Acme");
/// let emails = vec![MessageUnit::email(1, "Forgot something?", "...").with_delay(1)];
/// let sms = vec![MessageUnit::sms(1, "Your cart expires soon").with_delay(2)];
///
/// let flow = SequenceComposer::new().compose(&plan, &emails, &sms);
/// assert_eq!(flow.step_count(), 2);
/// assert_eq!(flow.entry_trigger.trigger_type, "cart_abandonment");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequenceComposer;

impl SequenceComposer {
    pub fn new() -> Self {
        Self
    }

    /// Merge email and SMS units into an ordered delivery timeline.
    ///
    /// Units missing an explicit delay take their channel default (24h for
    /// email, 48h for SMS). The merged list is sorted ascending by delay,
    /// ties broken by channel priority (email before SMS) then original
    /// sequence number. Step ids are assigned `step_1..step_n` in sorted
    /// order and `next_step` pointers wired accordingly.
    pub fn compose(
        &self,
        plan: &CampaignPlan,
        emails: &[MessageUnit],
        sms: &[MessageUnit],
    ) -> CampaignFlow {
        let mut merged: Vec<MessageUnit> = emails.iter().chain(sms.iter()).cloned().collect();
        merged.sort_by_key(|unit| {
            (
                unit.resolved_delay_hours(),
                unit.channel.merge_rank(),
                unit.sequence,
            )
        });

        let total = merged.len();
        let steps: Vec<DeliveryStep> = merged
            .into_iter()
            .enumerate()
            .map(|(i, message)| {
                let delay_hours = message.resolved_delay_hours();
                DeliveryStep {
                    id: format!("step_{}", i + 1),
                    channel: message.channel,
                    name: format!("{} {}", channel_title(message.channel), message.sequence),
                    delay_hours,
                    conditions: delivery_conditions(message.channel),
                    next_step: if i + 1 < total {
                        Some(format!("step_{}", i + 2))
                    } else {
                        None
                    },
                    message,
                }
            })
            .collect();

        let personalization = build_personalization(&steps);
        let segmentation = build_segmentation(plan);
        let entry_trigger = resolve_entry_trigger(plan.campaign_type);

        CampaignFlow::new(
            generate_flow_id(plan.campaign_type),
            format!("{} - {} Campaign", plan.brand_name, plan.campaign_type),
            plan.campaign_type,
            entry_trigger,
            steps,
            segmentation,
            personalization,
        )
    }
}

fn channel_title(channel: Channel) -> &'static str {
    match channel {
        Channel::Email => "Email",
        Channel::Sms => "SMS",
    }
}

/// Unique flow id: campaign slug plus a second-granularity timestamp.
fn generate_flow_id(campaign_type: CampaignType) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("{}_flow_{}", campaign_type.slug(), timestamp)
}

/// Resolve the entry trigger from the campaign type. Custom and unknown
/// types resolve to the generic `custom_event` trigger, never an error.
fn resolve_entry_trigger(campaign_type: CampaignType) -> EntryTrigger {
    EntryTrigger {
        trigger_type: campaign_type.trigger_type().to_string(),
        description: format!("{} entry", campaign_type),
    }
}

/// Standard delivery conditions per channel. SMS adds a consent check.
fn delivery_conditions(channel: Channel) -> Vec<DeliveryCondition> {
    let mut conditions = vec![
        DeliveryCondition::new("not_completed_goal", "User hasn't converted yet"),
        DeliveryCondition::new("subscribed", "User is subscribed to marketing messages"),
    ];
    if channel == Channel::Sms {
        conditions.push(DeliveryCondition::new(
            "sms_consent",
            "User has consented to SMS marketing",
        ));
    }
    conditions
}

/// One target segment with campaign-type-specific conditions plus the two
/// fixed exclusion segments.
fn build_segmentation(plan: &CampaignPlan) -> Segmentation {
    let mut conditions = vec!["email_address_exists".to_string()];
    let extra: &[&str] = match plan.campaign_type {
        CampaignType::CartAbandonment => &[
            "has_cart_items",
            "cart_value_greater_than_0",
            "not_purchased_in_last_hour",
        ],
        CampaignType::WelcomeSeries => {
            &["signed_up_in_last_24_hours", "not_in_other_welcome_flows"]
        }
        CampaignType::PostPurchase => &["purchased_in_last_hour", "order_total_greater_than_0"],
        CampaignType::WinBack => &["last_active_30_days_ago", "previous_purchase_exists"],
        CampaignType::Custom => &[],
    };
    conditions.extend(extra.iter().map(|c| c.to_string()));

    Segmentation {
        target_segments: vec![Segment {
            name: "Primary Target".to_string(),
            description: plan.target_audience.clone(),
            conditions,
        }],
        exclusion_segments: vec![
            Segment {
                name: "Recent Converters".to_string(),
                description: "Users who converted in last 7 days".to_string(),
                conditions: vec!["converted_in_last_7_days".to_string()],
            },
            Segment {
                name: "Suppressed Users".to_string(),
                description: "Users on suppression list".to_string(),
                conditions: vec!["in_suppression_list".to_string()],
            },
        ],
    }
}

/// Collect the distinct personalization tags across all steps, sorted, with
/// the standard fallback substitutions.
fn build_personalization(steps: &[DeliveryStep]) -> Personalization {
    let mut tags: Vec<String> = Vec::new();
    for step in steps {
        for tag in &step.message.personalization {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags.sort();

    let fallback_values: HashMap<String, String> = [
        ("{{first_name}}", "there"),
        ("{{name}}", "valued customer"),
        ("{{product_name}}", "our product"),
        ("{{brand_name}}", "our brand"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Personalization {
        tags_used: tags,
        fallback_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::END_FLOW;

    fn plan(campaign_type: CampaignType) -> CampaignPlan {
        CampaignPlan::minimal(campaign_type, "Acme")
    }

    #[test]
    fn test_ordering_by_delay_channel_sequence() {
        let emails = vec![
            MessageUnit::email(1, "E1", "body").with_delay(1),
            MessageUnit::email(2, "E2", "body").with_delay(48),
        ];
        let sms = vec![
            MessageUnit::sms(1, "S1").with_delay(2),
            // Same delay as E2: email wins the tie.
            MessageUnit::sms(2, "S2").with_delay(48),
        ];

        let flow = SequenceComposer::new().compose(&plan(CampaignType::CartAbandonment), &emails, &sms);

        let order: Vec<(Channel, u32)> = flow
            .steps
            .iter()
            .map(|s| (s.channel, s.message.sequence))
            .collect();
        assert_eq!(
            order,
            vec![
                (Channel::Email, 1),
                (Channel::Sms, 1),
                (Channel::Email, 2),
                (Channel::Sms, 2),
            ]
        );
    }

    #[test]
    fn test_no_loss_no_duplication() {
        let emails: Vec<MessageUnit> = (1..=3)
            .map(|i| MessageUnit::email(i, format!("E{}", i), "body").with_delay(i * 10))
            .collect();
        let sms: Vec<MessageUnit> = (1..=2)
            .map(|i| MessageUnit::sms(i, format!("S{}", i)).with_delay(i * 10 + 5))
            .collect();

        let flow = SequenceComposer::new().compose(&plan(CampaignType::WelcomeSeries), &emails, &sms);

        assert_eq!(flow.step_count(), 5);
        let mut seen: Vec<(Channel, u32)> = flow
            .steps
            .iter()
            .map(|s| (s.channel, s.message.sequence))
            .collect();
        seen.sort_by_key(|(c, n)| (c.merge_rank(), *n));
        assert_eq!(
            seen,
            vec![
                (Channel::Email, 1),
                (Channel::Email, 2),
                (Channel::Email, 3),
                (Channel::Sms, 1),
                (Channel::Sms, 2),
            ]
        );
    }

    #[test]
    fn test_step_ids_and_next_step_wiring() {
        let emails = vec![
            MessageUnit::email(1, "E1", "body").with_delay(1),
            MessageUnit::email(2, "E2", "body").with_delay(24),
        ];
        let flow = SequenceComposer::new().compose(&plan(CampaignType::PostPurchase), &emails, &[]);

        assert_eq!(flow.steps[0].id, "step_1");
        assert_eq!(flow.steps[0].next_step.as_deref(), Some("step_2"));
        assert_eq!(flow.steps[1].id, "step_2");
        assert!(flow.steps[1].next_step.is_none());
        assert_eq!(flow.steps[1].next_step_label(), END_FLOW);
    }

    #[test]
    fn test_default_delays_applied_when_unspecified() {
        let emails = vec![MessageUnit::email(1, "E1", "body")];
        let sms = vec![MessageUnit::sms(1, "S1")];
        let flow = SequenceComposer::new().compose(&plan(CampaignType::Custom), &emails, &sms);

        assert_eq!(flow.steps[0].delay_hours, 24);
        assert_eq!(flow.steps[0].channel, Channel::Email);
        assert_eq!(flow.steps[1].delay_hours, 48);
        assert_eq!(flow.steps[1].channel, Channel::Sms);
    }

    #[test]
    fn test_empty_inputs_yield_empty_flow() {
        let flow = SequenceComposer::new().compose(&plan(CampaignType::WinBack), &[], &[]);
        assert_eq!(flow.step_count(), 0);
        assert_eq!(flow.exit_triggers.len(), 3);
        assert_eq!(flow.entry_trigger.trigger_type, "user_inactive");
    }

    #[test]
    fn test_trigger_resolution_per_campaign_type() {
        let cases = [
            (CampaignType::CartAbandonment, "cart_abandonment"),
            (CampaignType::WelcomeSeries, "user_signup"),
            (CampaignType::PostPurchase, "purchase_completed"),
            (CampaignType::WinBack, "user_inactive"),
            (CampaignType::Custom, "custom_event"),
        ];
        for (campaign_type, expected) in cases {
            let flow = SequenceComposer::new().compose(&plan(campaign_type), &[], &[]);
            assert_eq!(flow.entry_trigger.trigger_type, expected);
        }
    }

    #[test]
    fn test_segmentation_for_cart_abandonment() {
        let flow = SequenceComposer::new().compose(&plan(CampaignType::CartAbandonment), &[], &[]);
        let target = &flow.segmentation.target_segments[0];
        assert!(target.conditions.contains(&"has_cart_items".to_string()));
        assert!(target
            .conditions
            .contains(&"email_address_exists".to_string()));
        assert_eq!(flow.segmentation.exclusion_segments.len(), 2);
        assert_eq!(flow.segmentation.exclusion_segments[0].name, "Recent Converters");
    }

    #[test]
    fn test_sms_steps_carry_consent_condition() {
        let sms = vec![MessageUnit::sms(1, "S1")];
        let flow = SequenceComposer::new().compose(&plan(CampaignType::WelcomeSeries), &[], &sms);
        let kinds: Vec<&str> = flow.steps[0]
            .conditions
            .iter()
            .map(|c| c.kind.as_str())
            .collect();
        assert!(kinds.contains(&"sms_consent"));
    }

    #[test]
    fn test_personalization_tags_collected_sorted() {
        let mut email = MessageUnit::email(1, "E1", "Hi {{first_name}}").with_delay(1);
        email.personalization = vec!["first_name".to_string(), "cart_items".to_string()];
        let mut text = MessageUnit::sms(1, "Hey {{first_name}}").with_delay(2);
        text.personalization = vec!["first_name".to_string()];

        let flow =
            SequenceComposer::new().compose(&plan(CampaignType::CartAbandonment), &[email], &[text]);
        assert_eq!(flow.personalization.tags_used, vec!["cart_items", "first_name"]);
        assert_eq!(
            flow.personalization.fallback_values["{{first_name}}"],
            "there"
        );
    }

    #[test]
    fn test_flow_id_shape() {
        let flow = SequenceComposer::new().compose(&plan(CampaignType::CartAbandonment), &[], &[]);
        assert!(flow.flow_id.starts_with("cart_abandonment_flow_"));
        assert_eq!(flow.status, "draft");
        assert_eq!(flow.name, "Acme - Cart Abandonment Campaign");
    }
}
