use tracing::warn;

use super::{blank_to_none, parse_f64_or, parse_i64_or, SaveState, SaveStatus, EXPIRY_LEAD_DAYS};
use crate::model::{Activity, HouseholdAttrs, Item, ItemAttrs, ItemStatus, Notification};
use crate::store::{EntityStore, SaveBundle};
use crate::time::{days_before, now_ms, to_date};
use crate::AppError;

/// Field state for the "add household item" screen.
#[derive(Debug, Default)]
pub struct HouseholdItemForm {
    pub user_id: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub category_id: String,
    pub location: String,
    /// Raw text input; parsed on save with a 0.0 fallback.
    pub price: String,
    /// Raw text input; parsed on save with a fallback of 1.
    pub quantity: String,
    pub purchase_date: Option<i64>,
    pub warranty_expiry_date: Option<i64>,
    pub image_ref: Option<String>,
    status: SaveStatus,
    saved_item_id: Option<String>,
}

impl HouseholdItemForm {
    pub fn new(user_id: impl Into<String>) -> Self {
        HouseholdItemForm {
            user_id: user_id.into(),
            quantity: "1".into(),
            ..Default::default()
        }
    }

    /// Required: name, category and location.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.category_id.trim().is_empty()
            && !self.location.trim().is_empty()
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn saved_item_id(&self) -> Option<&str> {
        self.saved_item_id.as_deref()
    }

    fn build_item(&self) -> Item {
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
            quantity: parse_i64_or(&self.quantity, 1),
            attrs: ItemAttrs::Household(HouseholdAttrs {
                brand: blank_to_none(&self.brand),
                model: blank_to_none(&self.model),
                serial_number: blank_to_none(&self.serial_number),
                purchase_date: self.purchase_date,
                warranty_expiry_date: self.warranty_expiry_date,
                purchase_price: Some(parse_f64_or(&self.price, 0.0)),
                ..Default::default()
            }),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn warranty_notification(&self, item: &Item) -> Option<Notification> {
        let expiry = self.warranty_expiry_date?;
        Some(Notification {
            id: String::new(),
            user_id: self.user_id.clone(),
            title: "Warranty expiring soon".into(),
            message: Some(format!(
                "Warranty for {} ends {}",
                item.name,
                to_date(expiry).format("%Y-%m-%d")
            )),
            item_id: None,
            item_kind: None,
            trigger_at: days_before(expiry, EXPIRY_LEAD_DAYS),
            priority: 0,
            sent: false,
            read: false,
            kind: "warranty_expiry".into(),
            recurrence: None,
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
            description: Some(format!("Added household item: {}", item.name)),
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
            notifications: self.warranty_notification(&item).into_iter().collect(),
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
                warn!(target = "burrow", event = "form_save_failed", form = "household", error = %err);
                guard.fail(err);
            }
        }
        self.status.state()
    }
}
