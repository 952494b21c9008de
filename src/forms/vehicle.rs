use tracing::warn;

use super::{blank_to_none, parse_f64_or, SaveState, SaveStatus, EXPIRY_LEAD_DAYS};
use crate::model::{Activity, Item, ItemAttrs, ItemStatus, Notification, VehicleAttrs};
use crate::store::{EntityStore, SaveBundle};
use crate::time::{days_before, now_ms, to_date};
use crate::AppError;

/// Field state for the "add vehicle" screen.
#[derive(Debug, Default)]
pub struct VehicleForm {
    pub user_id: String,
    pub name: String,
    pub vehicle_type: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub license_plate: String,
    pub vin: String,
    pub color: String,
    pub category_id: String,
    pub location: String,
    pub purchase_date: Option<i64>,
    pub purchase_price: String,
    pub odometer: String,
    pub insurance_expiry_date: Option<i64>,
    pub registration_expiry_date: Option<i64>,
    pub image_ref: Option<String>,
    status: SaveStatus,
    saved_item_id: Option<String>,
}

impl VehicleForm {
    pub fn new(user_id: impl Into<String>) -> Self {
        VehicleForm {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Required: name and vehicle type.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.vehicle_type.trim().is_empty()
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn saved_item_id(&self) -> Option<&str> {
        self.saved_item_id.as_deref()
    }

    fn build_item(&self) -> Item {
        let year = self.year.trim().parse::<i64>().ok();
        let odometer = self.odometer.trim().parse::<f64>().ok();
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
            attrs: ItemAttrs::Vehicle(VehicleAttrs {
                vehicle_type: blank_to_none(&self.vehicle_type),
                make: blank_to_none(&self.make),
                model: blank_to_none(&self.model),
                year,
                license_plate: blank_to_none(&self.license_plate),
                vin: blank_to_none(&self.vin),
                color: blank_to_none(&self.color),
                purchase_date: self.purchase_date,
                purchase_price: Some(parse_f64_or(&self.purchase_price, 0.0)),
                odometer,
                insurance_expiry_date: self.insurance_expiry_date,
                registration_expiry_date: self.registration_expiry_date,
                last_service_date: None,
                next_service_date: None,
                service_interval_days: None,
                fuel_type: None,
                storage_location: None,
            }),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn expiry_warning(&self, item: &Item, label: &str, expires_at: i64) -> Notification {
        Notification {
            id: String::new(),
            user_id: self.user_id.clone(),
            title: format!("{label} expiring for {}", item.name),
            message: Some(format!(
                "{label} for {} expires on {}",
                item.name,
                to_date(expires_at).format("%Y-%m-%d")
            )),
            item_id: None,
            item_kind: None,
            trigger_at: days_before(expires_at, EXPIRY_LEAD_DAYS),
            priority: 1,
            sent: false,
            read: false,
            kind: "expiry_warning".into(),
            recurrence: None,
            data: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn expiry_warnings(&self, item: &Item) -> Vec<Notification> {
        let ItemAttrs::Vehicle(attrs) = &item.attrs else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(at) = attrs.insurance_expiry_date {
            out.push(self.expiry_warning(item, "Insurance", at));
        }
        if let Some(at) = attrs.registration_expiry_date {
            out.push(self.expiry_warning(item, "Registration", at));
        }
        out
    }

    fn creation_activity(&self, item: &Item) -> Activity {
        Activity {
            id: String::new(),
            user_id: self.user_id.clone(),
            action: "create".into(),
            item_id: None,
            item_kind: None,
            description: Some(format!("Added vehicle: {}", item.name)),
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
            notifications: self.expiry_warnings(&item),
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
                warn!(target = "burrow", event = "form_save_failed", form = "vehicle", error = %err);
                guard.fail(err);
            }
        }
        self.status.state()
    }
}
