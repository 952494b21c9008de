use anyhow::Result;
use burrow_lib::model::{ItemAttrs, ItemKind, ItemStatus, PetAttrs};
use burrow_lib::{AppError, EntityStore, Item, StoreError};
use tempfile::tempdir;

#[path = "util.rs"]
mod util;

#[tokio::test]
async fn open_creates_and_migrates_a_file_database() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("data").join("burrow.sqlite3");
    let store = EntityStore::open(&db_path).await?;

    assert!(db_path.exists());
    let all: Vec<Item> = store.snapshot().await?;
    assert!(all.is_empty());
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn create_assigns_id_and_timestamps() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let saved = store
        .create(util::household_item(&user.id, "Toaster"))
        .await?;
    assert!(!saved.id.is_empty());
    assert!(saved.created_at > 0);
    assert_eq!(saved.created_at, saved.updated_at);

    let loaded: Item = store.get(&saved.id).await?.expect("item present");
    assert_eq!(loaded, saved);
    Ok(())
}

#[tokio::test]
async fn records_must_belong_to_a_known_user() -> Result<()> {
    let store = util::memory_store().await?;

    let err = store
        .create(util::household_item("no-such-user", "Orphan"))
        .await
        .expect_err("unknown owner");
    assert!(matches!(err, StoreError::Write(_)));

    let all: Vec<Item> = store.snapshot().await?;
    assert!(all.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_clamps_a_future_creation_stamp() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let far_future = burrow_lib::time::now_ms() + 86_400_000;
    let mut item = util::household_item(&user.id, "Time capsule");
    item.created_at = far_future;

    let saved = store.create(item).await?;
    assert!(saved.created_at < far_future);
    assert_eq!(saved.created_at, saved.updated_at);
    Ok(())
}

#[tokio::test]
async fn create_respects_caller_supplied_id() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let mut item = util::household_item(&user.id, "Kettle");
    item.id = "fixed-id".into();
    let saved = store.create(item).await?;
    assert_eq!(saved.id, "fixed-id");
    Ok(())
}

#[tokio::test]
async fn update_mutates_and_bumps_updated_at() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store.create(util::household_item(&user.id, "Lamp")).await?;

    let updated: Item = store
        .update(&saved.id, |item: &mut Item| {
            item.name = "Desk lamp".into();
            item.status = ItemStatus::Archived;
        })
        .await?;
    assert_eq!(updated.name, "Desk lamp");
    assert_eq!(updated.status, ItemStatus::Archived);
    assert_eq!(updated.created_at, saved.created_at);
    assert!(updated.updated_at >= saved.updated_at);

    let loaded: Item = store.get(&saved.id).await?.expect("item present");
    assert_eq!(loaded.name, "Desk lamp");
    Ok(())
}

#[tokio::test]
async fn update_keeps_the_stored_creation_stamp() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store.create(util::household_item(&user.id, "Clock")).await?;

    let updated: Item = store
        .update(&saved.id, |item: &mut Item| {
            item.created_at = 999;
            item.name = "Wall clock".into();
        })
        .await?;
    assert_eq!(updated.created_at, saved.created_at);

    let loaded: Item = store.get(&saved.id).await?.expect("item present");
    assert_eq!(loaded, updated);
    Ok(())
}

#[tokio::test]
async fn update_missing_record_is_not_found_and_creates_nothing() -> Result<()> {
    let store = util::memory_store().await?;

    let err = store
        .update("no-such-id", |item: &mut Item| item.name = "ghost".into())
        .await
        .expect_err("update of absent record");
    assert!(matches!(err, StoreError::NotFound { .. }));

    let all: Vec<Item> = store.snapshot().await?;
    assert!(all.is_empty());
    Ok(())
}

#[tokio::test]
async fn update_cannot_switch_item_kind() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store
        .create(util::household_item(&user.id, "Blender"))
        .await?;

    let err = store
        .update(&saved.id, |item: &mut Item| {
            item.attrs = ItemAttrs::Pet(PetAttrs::default());
        })
        .await
        .map(|_: Item| ())
        .expect_err("kind change rejected");
    let app: AppError = err.into();
    assert_eq!(app.code(), "ITEM/KIND_CHANGED");

    let loaded: Item = store.get(&saved.id).await?.expect("item still present");
    assert_eq!(loaded.kind(), ItemKind::Household);
    Ok(())
}

#[tokio::test]
async fn update_cannot_change_primary_key() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store.create(util::household_item(&user.id, "Fan")).await?;

    let updated: Item = store
        .update(&saved.id, |item: &mut Item| {
            item.id = "something-else".into();
            item.name = "Ceiling fan".into();
        })
        .await?;
    assert_eq!(updated.id, saved.id);
    assert!(store.get::<Item>("something-else").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store.create(util::household_item(&user.id, "Mug")).await?;

    assert!(store.delete::<Item>(&saved.id).await?);
    assert!(store.get::<Item>(&saved.id).await?.is_none());
    // Second delete is an Ok no-op.
    assert!(!store.delete::<Item>(&saved.id).await?);
    Ok(())
}

#[tokio::test]
async fn snapshot_is_oldest_first() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let mut first = util::household_item(&user.id, "First");
    first.created_at = 1_000;
    let mut second = util::household_item(&user.id, "Second");
    second.created_at = 2_000;

    // Insert newest first to prove ordering comes from created_at.
    store.create(second).await?;
    store.create(first).await?;

    let all: Vec<Item> = store.snapshot().await?;
    let names: Vec<&str> = all.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["First", "Second"]);
    Ok(())
}

#[tokio::test]
async fn attrs_survive_a_round_trip_through_the_row() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;

    let mut item = util::household_item(&user.id, "Goldfish");
    item.attrs = ItemAttrs::Pet(PetAttrs {
        species: Some("goldfish".into()),
        breed: None,
        ..Default::default()
    });
    item.tags = vec!["aquarium".into(), "pet".into()];

    let saved = store.create(item).await?;
    let loaded: Item = store.get(&saved.id).await?.expect("item present");
    assert_eq!(loaded.kind(), ItemKind::Pet);
    assert_eq!(loaded.attrs, saved.attrs);
    assert_eq!(loaded.tags, vec!["aquarium", "pet"]);
    Ok(())
}
