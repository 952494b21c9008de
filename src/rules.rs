use chrono::TimeZone;
use rrule::{RRule, Tz, Unvalidated};
use tracing::debug;

use crate::model::{Item, ItemAttrs, Notification, NotificationRule};
use crate::time::{days_before, to_date};
use crate::{AppError, AppResult};

/// A schedulable point in an item's lifecycle that rules can latch onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Event name as referenced by `NotificationRule::event`.
    pub event: &'static str,
    pub at: i64,
}

/// The dated milestones an item currently carries, by kind.
pub fn lifecycle_events(item: &Item) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    let mut push = |event: &'static str, at: Option<i64>| {
        if let Some(at) = at {
            events.push(LifecycleEvent { event, at });
        }
    };
    match &item.attrs {
        ItemAttrs::Household(a) => {
            push("warranty_expiry", a.warranty_expiry_date);
            push("maintenance_due", a.next_maintenance_date);
        }
        ItemAttrs::Pet(a) => {
            push("vet_visit", a.next_vet_visit);
            push("vaccination_due", a.next_vaccination_date);
        }
        ItemAttrs::Plant(a) => {
            push("watering_due", a.next_watering_date);
            push("fertilizing_due", a.next_fertilizing_date);
        }
        ItemAttrs::Document(a) => {
            push("expiry", a.expiry_date);
        }
        ItemAttrs::Vehicle(a) => {
            push("insurance_expiry", a.insurance_expiry_date);
            push("registration_expiry", a.registration_expiry_date);
            push("service_due", a.next_service_date);
        }
    }
    events
}

/// Fill `{name}`, `{kind}`, `{location}` and `{event_date}` placeholders.
pub fn render_template(template: &str, item: &Item, event_at: i64) -> String {
    template
        .replace("{name}", &item.name)
        .replace("{kind}", item.kind().as_str())
        .replace("{location}", item.location.as_deref().unwrap_or(""))
        .replace(
            "{event_date}",
            &to_date(event_at).format("%Y-%m-%d").to_string(),
        )
}

fn rule_applies(rule: &NotificationRule, item: &Item) -> bool {
    if !rule.is_active {
        return false;
    }
    if let Some(kind) = rule.item_kind {
        if kind != item.kind() {
            return false;
        }
    }
    if let Some(category_id) = &rule.category_id {
        if item.category_id.as_ref() != Some(category_id) {
            return false;
        }
    }
    true
}

/// Evaluate the rule set against one item and produce the notifications it
/// calls for. Triggers land `days_in_advance` whole days before the event.
pub fn apply_rules(rules: &[NotificationRule], item: &Item) -> Vec<Notification> {
    let events = lifecycle_events(item);
    let mut out = Vec::new();
    for rule in rules {
        if !rule_applies(rule, item) {
            continue;
        }
        for event in events.iter().filter(|e| e.event == rule.event) {
            debug!(
                target = "burrow",
                event = "rule_fired",
                rule = %rule.name,
                item = %item.id,
                lifecycle_event = %event.event
            );
            out.push(Notification {
                id: String::new(),
                user_id: item.user_id.clone(),
                title: render_template(&rule.title, item, event.at),
                message: Some(render_template(&rule.message, item, event.at)),
                item_id: Some(item.id.clone()),
                item_kind: Some(item.kind()),
                trigger_at: days_before(event.at, rule.days_in_advance),
                priority: rule.priority,
                sent: false,
                read: false,
                kind: rule.event.clone(),
                recurrence: None,
                data: None,
                created_at: 0,
                updated_at: 0,
            });
        }
    }
    out
}

/// Check an iCalendar RRULE string against a start instant.
pub fn validate_recurrence(raw: &str, dtstart_ms: i64) -> AppResult<()> {
    let naive = chrono::DateTime::from_timestamp_millis(dtstart_ms)
        .ok_or_else(|| {
            AppError::new("TIME/INVALID_TIMESTAMP", "Invalid recurrence start timestamp")
                .with_context("dtstart_ms", dtstart_ms.to_string())
        })?
        .naive_utc();
    let dtstart = Tz::UTC.from_utc_datetime(&naive);
    let parsed: RRule<Unvalidated> = raw
        .parse()
        .map_err(|e| AppError::new("RULE/INVALID_RRULE", format!("{e}")))?;
    parsed
        .validate(dtstart)
        .map_err(|e| AppError::new("RULE/INVALID_RRULE", format!("{e}")))?;
    Ok(())
}
