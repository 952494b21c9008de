use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row};
use std::fmt;
use std::str::FromStr;

use crate::{AppError, AppResult};

/// Every persisted collection, one per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Categories,
    Items,
    CareRecords,
    Notifications,
    Activities,
    Tasks,
    NotificationRules,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Users,
        Collection::Categories,
        Collection::Items,
        Collection::CareRecords,
        Collection::Notifications,
        Collection::Activities,
        Collection::Tasks,
        Collection::NotificationRules,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Categories => "categories",
            Collection::Items => "items",
            Collection::CareRecords => "care_records",
            Collection::Notifications => "notifications",
            Collection::Activities => "activities",
            Collection::Tasks => "tasks",
            Collection::NotificationRules => "notification_rules",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Discriminator selecting which specialized attribute set an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Household,
    Pet,
    Plant,
    Document,
    Vehicle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Household => "household",
            ItemKind::Pet => "pet",
            ItemKind::Plant => "plant",
            ItemKind::Document => "document",
            ItemKind::Vehicle => "vehicle",
        }
    }
}

impl FromStr for ItemKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "household" => Ok(ItemKind::Household),
            "pet" => Ok(ItemKind::Pet),
            "plant" => Ok(ItemKind::Plant),
            "document" => Ok(ItemKind::Document),
            "vehicle" => Ok(ItemKind::Vehicle),
            other => Err(AppError::new("ITEM/UNKNOWN_KIND", "Unknown item kind")
                .with_context("kind", other.to_string())),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    Archived,
    Disposed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Archived => "archived",
            ItemStatus::Disposed => "disposed",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ItemStatus::Active),
            "archived" => Ok(ItemStatus::Archived),
            "disposed" => Ok(ItemStatus::Disposed),
            other => Err(AppError::new("ITEM/UNKNOWN_STATUS", "Unknown item status")
                .with_context("status", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HouseholdAttrs {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<i64>,
    #[serde(default)]
    pub warranty_expiry_date: Option<i64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub maintenance_interval_days: Option<i64>,
    #[serde(default)]
    pub last_maintenance_date: Option<i64>,
    #[serde(default)]
    pub next_maintenance_date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PetAttrs {
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birth_date: Option<i64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub last_vet_visit: Option<i64>,
    #[serde(default)]
    pub next_vet_visit: Option<i64>,
    #[serde(default)]
    pub last_vaccination_date: Option<i64>,
    #[serde(default)]
    pub next_vaccination_date: Option<i64>,
    #[serde(default)]
    pub food_preferences: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlantAttrs {
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub planting_date: Option<i64>,
    #[serde(default)]
    pub watering_interval_days: Option<i64>,
    #[serde(default)]
    pub last_watering_date: Option<i64>,
    #[serde(default)]
    pub next_watering_date: Option<i64>,
    #[serde(default)]
    pub fertilizing_interval_days: Option<i64>,
    #[serde(default)]
    pub last_fertilizing_date: Option<i64>,
    #[serde(default)]
    pub next_fertilizing_date: Option<i64>,
    #[serde(default)]
    pub sunlight: Option<String>,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentAttrs {
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<i64>,
    #[serde(default)]
    pub expiry_date: Option<i64>,
    #[serde(default)]
    pub issuing_authority: Option<String>,
    #[serde(default)]
    pub file_ref: Option<String>,
    #[serde(default)]
    pub reminder_days: Option<i64>,
    #[serde(default)]
    pub is_confidential: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VehicleAttrs {
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<i64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub insurance_expiry_date: Option<i64>,
    #[serde(default)]
    pub registration_expiry_date: Option<i64>,
    #[serde(default)]
    pub last_service_date: Option<i64>,
    #[serde(default)]
    pub next_service_date: Option<i64>,
    #[serde(default)]
    pub service_interval_days: Option<i64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
}

/// Kind-specific payload. The serialized form carries the `kind` tag so the
/// `attrs` column is self-describing; the `kind` table column must agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemAttrs {
    Household(HouseholdAttrs),
    Pet(PetAttrs),
    Plant(PlantAttrs),
    Document(DocumentAttrs),
    Vehicle(VehicleAttrs),
}

impl ItemAttrs {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemAttrs::Household(_) => ItemKind::Household,
            ItemAttrs::Pet(_) => ItemKind::Pet,
            ItemAttrs::Plant(_) => ItemKind::Plant,
            ItemAttrs::Document(_) => ItemKind::Document,
            ItemAttrs::Vehicle(_) => ItemKind::Vehicle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Opaque preference blob; the UI owns its shape.
    #[serde(default)]
    pub preferences: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub attrs: ItemAttrs,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_quantity() -> i64 {
    1
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.attrs.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareRecord {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub item_kind: ItemKind,
    pub care_type: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    pub occurred_at: i64,
    #[serde(default)]
    pub next_care_at: Option<i64>,
    #[serde(default)]
    pub photo_refs: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_kind: Option<ItemKind>,
    pub trigger_at: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub sent: bool,
    #[serde(default)]
    pub read: bool,
    /// expiry_warning, care_reminder, service_due, ...
    pub kind: String,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub action: String,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_kind: Option<ItemKind>,
    #[serde(default)]
    pub description: Option<String>,
    pub occurred_at: i64,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(AppError::new("TASK/UNKNOWN_STATUS", "Unknown task status")
                .with_context("status", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub reminder_at: Option<i64>,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_kind: Option<ItemKind>,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRule {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub item_kind: Option<ItemKind>,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Lifecycle event the rule listens for: expiry, service_due, ...
    pub event: String,
    #[serde(default = "default_lead_days")]
    pub days_in_advance: i64,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_lead_days() -> i64 {
    3
}

fn default_active() -> bool {
    true
}

/// A persisted record: maps to one row of its collection's table.
pub trait Entity: Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn created_at(&self) -> i64;
    fn stamp_created(&mut self, now: i64);
    fn stamp_updated(&mut self, now: i64);
    fn to_row(&self) -> AppResult<Map<String, Value>>;
    fn from_row(row: &SqliteRow) -> AppResult<Self>;

    /// Veto for whole-record overwrites. Called with the stored record
    /// before an update is written.
    fn validate_update(&self, _prior: &Self) -> AppResult<()> {
        Ok(())
    }
}

fn opt_str(v: &Option<String>) -> Value {
    v.clone().map(Value::String).unwrap_or(Value::Null)
}

fn opt_num(v: Option<i64>) -> Value {
    v.map(Value::from).unwrap_or(Value::Null)
}

fn opt_float(v: Option<f64>) -> Value {
    v.map(Value::from).unwrap_or(Value::Null)
}

fn json_text<T: Serialize>(v: &T) -> AppResult<Value> {
    Ok(Value::String(serde_json::to_string(v)?))
}

fn col_str(row: &SqliteRow, col: &str) -> AppResult<String> {
    row.try_get(col).map_err(AppError::from)
}

fn col_opt_str(row: &SqliteRow, col: &str) -> AppResult<Option<String>> {
    row.try_get::<Option<String>, _>(col).map_err(AppError::from)
}

fn col_i64(row: &SqliteRow, col: &str) -> AppResult<i64> {
    row.try_get(col).map_err(AppError::from)
}

fn col_opt_i64(row: &SqliteRow, col: &str) -> AppResult<Option<i64>> {
    row.try_get::<Option<i64>, _>(col).map_err(AppError::from)
}

fn col_opt_f64(row: &SqliteRow, col: &str) -> AppResult<Option<f64>> {
    row.try_get::<Option<f64>, _>(col).map_err(AppError::from)
}

fn col_bool(row: &SqliteRow, col: &str) -> AppResult<bool> {
    Ok(row.try_get::<i64, _>(col).map_err(AppError::from)? != 0)
}

fn col_json<T: DeserializeOwned>(row: &SqliteRow, col: &str) -> AppResult<T> {
    let raw: String = row.try_get(col).map_err(AppError::from)?;
    serde_json::from_str(&raw).map_err(AppError::from)
}

fn col_opt_kind(row: &SqliteRow, col: &str) -> AppResult<Option<ItemKind>> {
    col_opt_str(row, col)?
        .map(|raw| raw.parse::<ItemKind>())
        .transpose()
}

impl Entity for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("full_name".into(), Value::String(self.full_name.clone()));
        map.insert("email".into(), opt_str(&self.email));
        map.insert("phone".into(), opt_str(&self.phone));
        map.insert("password_hash".into(), opt_str(&self.password_hash));
        map.insert("preferences".into(), opt_str(&self.preferences));
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(User {
            id: col_str(row, "id")?,
            full_name: col_str(row, "full_name")?,
            email: col_opt_str(row, "email")?,
            phone: col_opt_str(row, "phone")?,
            password_hash: col_opt_str(row, "password_hash")?,
            preferences: col_opt_str(row, "preferences")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("icon".into(), opt_str(&self.icon));
        map.insert("color".into(), opt_str(&self.color));
        map.insert("parent_id".into(), opt_str(&self.parent_id));
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Category {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            name: col_str(row, "name")?,
            icon: col_opt_str(row, "icon")?,
            color: col_opt_str(row, "color")?,
            parent_id: col_opt_str(row, "parent_id")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for Item {
    const COLLECTION: Collection = Collection::Items;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("description".into(), opt_str(&self.description));
        map.insert("category_id".into(), opt_str(&self.category_id));
        map.insert("location".into(), opt_str(&self.location));
        map.insert("image_ref".into(), opt_str(&self.image_ref));
        map.insert(
            "status".into(),
            Value::String(self.status.as_str().to_string()),
        );
        map.insert("tags".into(), json_text(&self.tags)?);
        map.insert("quantity".into(), Value::from(self.quantity));
        map.insert(
            "kind".into(),
            Value::String(self.kind().as_str().to_string()),
        );
        map.insert("attrs".into(), json_text(&self.attrs)?);
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        let attrs: ItemAttrs = col_json(row, "attrs")?;
        let kind_col: String = col_str(row, "kind")?;
        if kind_col != attrs.kind().as_str() {
            return Err(AppError::new(
                "ITEM/KIND_MISMATCH",
                "Item kind column disagrees with its attrs payload",
            )
            .with_context("id", col_str(row, "id")?)
            .with_context("kind_column", kind_col)
            .with_context("attrs_kind", attrs.kind().to_string()));
        }
        Ok(Item {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            name: col_str(row, "name")?,
            description: col_opt_str(row, "description")?,
            category_id: col_opt_str(row, "category_id")?,
            location: col_opt_str(row, "location")?,
            image_ref: col_opt_str(row, "image_ref")?,
            status: col_str(row, "status")?.parse()?,
            tags: col_json(row, "tags")?,
            quantity: col_i64(row, "quantity")?,
            attrs,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }

    // An item id denotes exactly one concrete kind for its whole life.
    fn validate_update(&self, prior: &Self) -> AppResult<()> {
        if self.kind() != prior.kind() {
            return Err(AppError::new(
                "ITEM/KIND_CHANGED",
                "An item cannot change its kind",
            )
            .with_context("id", prior.id.clone())
            .with_context("from", prior.kind().to_string())
            .with_context("to", self.kind().to_string()));
        }
        Ok(())
    }
}

impl Entity for CareRecord {
    const COLLECTION: Collection = Collection::CareRecords;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("item_id".into(), Value::String(self.item_id.clone()));
        map.insert(
            "item_kind".into(),
            Value::String(self.item_kind.as_str().to_string()),
        );
        map.insert("care_type".into(), Value::String(self.care_type.clone()));
        map.insert("notes".into(), opt_str(&self.notes));
        map.insert("cost".into(), opt_float(self.cost));
        map.insert("occurred_at".into(), Value::from(self.occurred_at));
        map.insert("next_care_at".into(), opt_num(self.next_care_at));
        map.insert("photo_refs".into(), json_text(&self.photo_refs)?);
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(CareRecord {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            item_id: col_str(row, "item_id")?,
            item_kind: col_str(row, "item_kind")?.parse()?,
            care_type: col_str(row, "care_type")?,
            notes: col_opt_str(row, "notes")?,
            cost: col_opt_f64(row, "cost")?,
            occurred_at: col_i64(row, "occurred_at")?,
            next_care_at: col_opt_i64(row, "next_care_at")?,
            photo_refs: col_json(row, "photo_refs")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for Notification {
    const COLLECTION: Collection = Collection::Notifications;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("message".into(), opt_str(&self.message));
        map.insert("item_id".into(), opt_str(&self.item_id));
        map.insert(
            "item_kind".into(),
            self.item_kind
                .map(|k| Value::String(k.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert("trigger_at".into(), Value::from(self.trigger_at));
        map.insert("priority".into(), Value::from(self.priority));
        map.insert("sent".into(), Value::from(self.sent as i64));
        map.insert("read".into(), Value::from(self.read as i64));
        map.insert("kind".into(), Value::String(self.kind.clone()));
        map.insert("recurrence".into(), opt_str(&self.recurrence));
        map.insert("data".into(), opt_str(&self.data));
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Notification {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            title: col_str(row, "title")?,
            message: col_opt_str(row, "message")?,
            item_id: col_opt_str(row, "item_id")?,
            item_kind: col_opt_kind(row, "item_kind")?,
            trigger_at: col_i64(row, "trigger_at")?,
            priority: col_i64(row, "priority")?,
            sent: col_bool(row, "sent")?,
            read: col_bool(row, "read")?,
            kind: col_str(row, "kind")?,
            recurrence: col_opt_str(row, "recurrence")?,
            data: col_opt_str(row, "data")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for Activity {
    const COLLECTION: Collection = Collection::Activities;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("action".into(), Value::String(self.action.clone()));
        map.insert("item_id".into(), opt_str(&self.item_id));
        map.insert(
            "item_kind".into(),
            self.item_kind
                .map(|k| Value::String(k.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert("description".into(), opt_str(&self.description));
        map.insert("occurred_at".into(), Value::from(self.occurred_at));
        map.insert("details".into(), opt_str(&self.details));
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Activity {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            action: col_str(row, "action")?,
            item_id: col_opt_str(row, "item_id")?,
            item_kind: col_opt_kind(row, "item_kind")?,
            description: col_opt_str(row, "description")?,
            occurred_at: col_i64(row, "occurred_at")?,
            details: col_opt_str(row, "details")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("description".into(), opt_str(&self.description));
        map.insert("due_at".into(), opt_num(self.due_at));
        map.insert("reminder_at".into(), opt_num(self.reminder_at));
        map.insert("completed_at".into(), opt_num(self.completed_at));
        map.insert("priority".into(), Value::from(self.priority));
        map.insert(
            "status".into(),
            Value::String(self.status.as_str().to_string()),
        );
        map.insert("item_id".into(), opt_str(&self.item_id));
        map.insert(
            "item_kind".into(),
            self.item_kind
                .map(|k| Value::String(k.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert("recurrence".into(), opt_str(&self.recurrence));
        map.insert("tags".into(), json_text(&self.tags)?);
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Task {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            title: col_str(row, "title")?,
            description: col_opt_str(row, "description")?,
            due_at: col_opt_i64(row, "due_at")?,
            reminder_at: col_opt_i64(row, "reminder_at")?,
            completed_at: col_opt_i64(row, "completed_at")?,
            priority: col_i64(row, "priority")?,
            status: col_str(row, "status")?.parse()?,
            item_id: col_opt_str(row, "item_id")?,
            item_kind: col_opt_kind(row, "item_kind")?,
            recurrence: col_opt_str(row, "recurrence")?,
            tags: col_json(row, "tags")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}

impl Entity for NotificationRule {
    const COLLECTION: Collection = Collection::NotificationRules;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }

    fn stamp_updated(&mut self, now: i64) {
        self.updated_at = now;
    }

    fn to_row(&self) -> AppResult<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert("user_id".into(), Value::String(self.user_id.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert(
            "item_kind".into(),
            self.item_kind
                .map(|k| Value::String(k.as_str().to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert("category_id".into(), opt_str(&self.category_id));
        map.insert("event".into(), Value::String(self.event.clone()));
        map.insert("days_in_advance".into(), Value::from(self.days_in_advance));
        map.insert("title".into(), Value::String(self.title.clone()));
        map.insert("message".into(), Value::String(self.message.clone()));
        map.insert("priority".into(), Value::from(self.priority));
        map.insert("is_active".into(), Value::from(self.is_active as i64));
        map.insert("created_at".into(), Value::from(self.created_at));
        map.insert("updated_at".into(), Value::from(self.updated_at));
        Ok(map)
    }

    fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(NotificationRule {
            id: col_str(row, "id")?,
            user_id: col_str(row, "user_id")?,
            name: col_str(row, "name")?,
            item_kind: col_opt_kind(row, "item_kind")?,
            category_id: col_opt_str(row, "category_id")?,
            event: col_str(row, "event")?,
            days_in_advance: col_i64(row, "days_in_advance")?,
            title: col_str(row, "title")?,
            message: col_str(row, "message")?,
            priority: col_i64(row, "priority")?,
            is_active: col_bool(row, "is_active")?,
            created_at: col_i64(row, "created_at")?,
            updated_at: col_i64(row, "updated_at")?,
        })
    }
}
