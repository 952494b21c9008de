use tracing::warn;

use super::{blank_to_none, parse_i64_or, SaveState, SaveStatus};
use crate::model::{Activity, Item, ItemAttrs, ItemStatus, Notification, PlantAttrs};
use crate::rules::validate_recurrence;
use crate::store::{EntityStore, SaveBundle};
use crate::time::{days_after, now_ms, to_date};
use crate::AppError;

const DEFAULT_WATERING_DAYS: i64 = 7;
const DEFAULT_FERTILIZING_DAYS: i64 = 30;

/// Field state for the "add plant" screen.
#[derive(Debug, Default)]
pub struct PlantForm {
    pub user_id: String,
    pub name: String,
    pub species: String,
    pub location: String,
    pub category_id: String,
    pub planting_date: Option<i64>,
    /// Raw text inputs; parsed on save with the usual care defaults.
    pub watering_interval_days: String,
    pub fertilizing_interval_days: String,
    pub last_watering_date: Option<i64>,
    pub last_fertilizing_date: Option<i64>,
    pub sunlight: String,
    pub soil_type: String,
    pub notes: String,
    pub image_ref: Option<String>,
    status: SaveStatus,
    saved_item_id: Option<String>,
}

impl PlantForm {
    pub fn new(user_id: impl Into<String>) -> Self {
        PlantForm {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Required: name, species and location.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.species.trim().is_empty()
            && !self.location.trim().is_empty()
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn saved_item_id(&self) -> Option<&str> {
        self.saved_item_id.as_deref()
    }

    fn build_item(&self, now: i64) -> Item {
        let watering_days = parse_i64_or(&self.watering_interval_days, DEFAULT_WATERING_DAYS);
        let fertilizing_days =
            parse_i64_or(&self.fertilizing_interval_days, DEFAULT_FERTILIZING_DAYS);
        let last_watering = self.last_watering_date.unwrap_or(now);
        let last_fertilizing = self.last_fertilizing_date.unwrap_or(now);
        Item {
            id: String::new(),
            user_id: self.user_id.clone(),
            name: self.name.trim().to_string(),
            description: None,
            category_id: blank_to_none(&self.category_id),
            location: blank_to_none(&self.location),
            image_ref: self.image_ref.clone(),
            status: ItemStatus::Active,
            tags: Vec::new(),
            quantity: 1,
            attrs: ItemAttrs::Plant(PlantAttrs {
                species: blank_to_none(&self.species),
                planting_date: self.planting_date,
                watering_interval_days: Some(watering_days),
                last_watering_date: Some(last_watering),
                next_watering_date: Some(days_after(last_watering, watering_days)),
                fertilizing_interval_days: Some(fertilizing_days),
                last_fertilizing_date: Some(last_fertilizing),
                next_fertilizing_date: Some(days_after(last_fertilizing, fertilizing_days)),
                sunlight: blank_to_none(&self.sunlight),
                soil_type: blank_to_none(&self.soil_type),
                notes: blank_to_none(&self.notes),
            }),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Recurring watering reminder starting at the next watering date.
    fn watering_reminder(&self, item: &Item) -> Option<Notification> {
        let ItemAttrs::Plant(attrs) = &item.attrs else {
            return None;
        };
        let next = attrs.next_watering_date?;
        let interval = attrs.watering_interval_days.unwrap_or(DEFAULT_WATERING_DAYS);
        let rule = format!("FREQ=DAILY;INTERVAL={interval}");
        let recurrence = match validate_recurrence(&rule, next) {
            Ok(()) => Some(rule),
            Err(err) => {
                warn!(target = "burrow", event = "recurrence_rejected", error = %err);
                None
            }
        };
        Some(Notification {
            id: String::new(),
            user_id: self.user_id.clone(),
            title: format!("Water {}", item.name),
            message: Some(format!(
                "{} is due for watering on {}",
                item.name,
                to_date(next).format("%Y-%m-%d")
            )),
            item_id: None,
            item_kind: None,
            trigger_at: next,
            priority: 0,
            sent: false,
            read: false,
            kind: "care_reminder".into(),
            recurrence,
            data: None,
            created_at: 0,
            updated_at: 0,
        })
    }

    fn creation_activity(&self, item: &Item) -> Activity {
        Activity {
            id: String::new(),
            user_id: self.user_id.clone(),
            action: "create".into(),
            item_id: None,
            item_kind: None,
            description: Some(format!("Added plant: {}", item.name)),
            occurred_at: now_ms(),
            details: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// No-op unless the form is valid and no save is in flight.
    pub async fn save(&mut self, store: &EntityStore) -> SaveState {
        if !self.is_valid() || self.status.is_saving() {
            return self.status.state();
        }
        let item = self.build_item(now_ms());
        let bundle = SaveBundle {
            activity: Some(self.creation_activity(&item)),
            notifications: self.watering_reminder(&item).into_iter().collect(),
            item,
        };

        let guard = self.status.begin();
        match store.create_item_bundle(bundle).await {
            Ok(saved) => {
                self.saved_item_id = Some(saved.id);
                guard.succeed();
            }
            Err(err) => {
                let err = AppError::from(err);
                warn!(target = "burrow", event = "form_save_failed", form = "plant", error = %err);
                guard.fail(err);
            }
        }
        self.status.state()
    }
}
