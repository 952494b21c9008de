#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use anyhow::Result;
use burrow_lib::model::{HouseholdAttrs, Item, ItemAttrs, ItemStatus, User};
use burrow_lib::{migrate, EntityStore};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query("PRAGMA foreign_keys=ON;")
        .execute(&pool)
        .await?;
    migrate::apply_migrations(&pool).await?;
    Ok(pool)
}

pub async fn memory_store() -> Result<EntityStore> {
    Ok(EntityStore::with_pool(memory_pool().await?))
}

/// A persisted owner for records that carry a `user_id` foreign key.
pub async fn seed_user(store: &EntityStore) -> Result<User> {
    let user = store
        .create(User {
            id: String::new(),
            full_name: "Test Owner".into(),
            email: Some("owner@example.com".into()),
            phone: None,
            password_hash: None,
            preferences: None,
            created_at: 0,
            updated_at: 0,
        })
        .await?;
    Ok(user)
}

pub fn household_item(user_id: &str, name: &str) -> Item {
    Item {
        id: String::new(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: None,
        category_id: None,
        location: Some("Kitchen".into()),
        image_ref: None,
        status: ItemStatus::Active,
        tags: Vec::new(),
        quantity: 1,
        attrs: ItemAttrs::Household(HouseholdAttrs::default()),
        created_at: 0,
        updated_at: 0,
    }
}
