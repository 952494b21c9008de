use tracing::warn;

use super::{blank_to_none, parse_f64_or, SaveState, SaveStatus};
use crate::model::{Activity, Item, ItemAttrs, ItemStatus, Notification, PetAttrs};
use crate::store::{EntityStore, SaveBundle};
use crate::time::{days_before, now_ms, to_date};
use crate::AppError;

/// Field state for the "add pet" screen.
#[derive(Debug, Default)]
pub struct PetForm {
    pub user_id: String,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub gender: String,
    pub category_id: String,
    pub birth_date: Option<i64>,
    /// Raw text input; parsed on save, no weight when unparsable.
    pub weight: String,
    pub next_vet_visit: Option<i64>,
    pub next_vaccination_date: Option<i64>,
    pub food_preferences: String,
    pub medical_conditions: String,
    pub image_ref: Option<String>,
    status: SaveStatus,
    saved_item_id: Option<String>,
}

impl PetForm {
    pub fn new(user_id: impl Into<String>) -> Self {
        PetForm {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Required: name and species.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.species.trim().is_empty()
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn saved_item_id(&self) -> Option<&str> {
        self.saved_item_id.as_deref()
    }

    fn build_item(&self) -> Item {
        let weight = parse_f64_or(&self.weight, f64::NAN);
        Item {
            id: String::new(),
            user_id: self.user_id.clone(),
            name: self.name.trim().to_string(),
            description: None,
            category_id: blank_to_none(&self.category_id),
            location: None,
            image_ref: self.image_ref.clone(),
            status: ItemStatus::Active,
            tags: Vec::new(),
            quantity: 1,
            attrs: ItemAttrs::Pet(PetAttrs {
                species: blank_to_none(&self.species),
                breed: blank_to_none(&self.breed),
                gender: blank_to_none(&self.gender),
                birth_date: self.birth_date,
                weight_kg: weight.is_finite().then_some(weight),
                next_vet_visit: self.next_vet_visit,
                next_vaccination_date: self.next_vaccination_date,
                food_preferences: blank_to_none(&self.food_preferences),
                medical_conditions: blank_to_none(&self.medical_conditions),
                ..Default::default()
            }),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// One care reminder per upcoming appointment, the day before.
    fn reminders(&self, item: &Item) -> Vec<Notification> {
        let mut out = Vec::new();
        let mut remind = |label: &str, at: Option<i64>| {
            let Some(at) = at else { return };
            out.push(Notification {
                id: String::new(),
                user_id: self.user_id.clone(),
                title: format!("{label} for {}", item.name),
                message: Some(format!(
                    "{label} for {} on {}",
                    item.name,
                    to_date(at).format("%Y-%m-%d")
                )),
                item_id: None,
                item_kind: None,
                trigger_at: days_before(at, 1),
                priority: 0,
                sent: false,
                read: false,
                kind: "care_reminder".into(),
                recurrence: None,
                data: None,
                created_at: 0,
                updated_at: 0,
            });
        };
        remind("Vet visit", self.next_vet_visit);
        remind("Vaccination", self.next_vaccination_date);
        out
    }

    fn creation_activity(&self, item: &Item) -> Activity {
        Activity {
            id: String::new(),
            user_id: self.user_id.clone(),
            action: "create".into(),
            item_id: None,
            item_kind: None,
            description: Some(format!("Added pet: {}", item.name)),
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
        let item = self.build_item();
        let bundle = SaveBundle {
            activity: Some(self.creation_activity(&item)),
            notifications: self.reminders(&item),
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
                warn!(target = "burrow", event = "form_save_failed", form = "pet", error = %err);
                guard.fail(err);
            }
        }
        self.status.state()
    }
}
