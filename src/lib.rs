//! Burrow: a local-first belongings tracker built on SQLite.
//!
//! The crate has three layers. [`store::EntityStore`] owns the connection
//! pool and runs every write in a transaction, broadcasting one
//! [`store::ChangeEvent`] per touched collection after commit.
//! [`changes::Watcher`] sits on the consumer side and coalesces those
//! events with a trailing debounce. The [`forms`] module holds the add-record
//! view-models that bundle an item with its derived activity and reminders
//! into a single committed write.

pub mod categories;
pub mod changes;
pub mod db;
pub mod error;
pub mod forms;
pub mod id;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod rules;
pub mod store;
pub mod time;

pub use changes::{Watcher, DEFAULT_DEBOUNCE};
pub use error::{AppError, AppResult};
pub use model::{
    Activity, CareRecord, Category, Collection, Item, ItemAttrs, ItemKind, ItemStatus,
    Notification, NotificationRule, Task, TaskStatus, User,
};
pub use store::{ChangeEvent, EntityStore, SaveBundle, StoreError};
