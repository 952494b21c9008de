use anyhow::Result;
use burrow_lib::model::{Activity, CareRecord, Collection, ItemKind, Notification, Task, TaskStatus};
use burrow_lib::store::SaveBundle;
use burrow_lib::{ChangeEvent, Item, Watcher};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

#[path = "util.rs"]
mod util;

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ChangeEvent>) -> Vec<Collection> {
    let mut seen = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(ev) => seen.push(ev.collection),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return seen,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
}

#[tokio::test]
async fn one_event_per_touched_collection_per_commit() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let mut rx = store.subscribe();

    store.create(util::household_item(&user.id, "Sofa")).await?;
    assert_eq!(drain(&mut rx), vec![Collection::Items]);

    let saved = store.create(util::household_item(&user.id, "Rug")).await?;
    store
        .update(&saved.id, |item: &mut Item| item.name = "Red rug".into())
        .await?;
    assert_eq!(drain(&mut rx), vec![Collection::Items, Collection::Items]);
    Ok(())
}

#[tokio::test]
async fn reads_and_failed_writes_emit_nothing() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let saved = store.create(util::household_item(&user.id, "Desk")).await?;

    let mut rx = store.subscribe();
    let _: Option<Item> = store.get(&saved.id).await?;
    let _: Vec<Item> = store.snapshot().await?;
    let _ = store
        .update("missing", |item: &mut Item| item.name = "x".into())
        .await;
    assert!(!store.delete::<Item>("missing").await?);

    assert!(drain(&mut rx).is_empty());
    Ok(())
}

#[tokio::test]
async fn bundle_commit_signals_each_collection_once() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let mut rx = store.subscribe();

    let item = util::household_item(&user.id, "Fridge");
    let activity = Activity {
        id: String::new(),
        user_id: user.id.clone(),
        action: "create".into(),
        item_id: None,
        item_kind: None,
        description: Some("Added household item: Fridge".into()),
        occurred_at: 1_735_000_000_000,
        details: None,
        created_at: 0,
        updated_at: 0,
    };
    let notification = Notification {
        id: String::new(),
        user_id: user.id.clone(),
        title: "Warranty expiring".into(),
        message: None,
        item_id: None,
        item_kind: None,
        trigger_at: 1_735_084_800_000,
        priority: 1,
        sent: false,
        read: false,
        kind: "warranty_expiry".into(),
        recurrence: None,
        data: None,
        created_at: 0,
        updated_at: 0,
    };

    let saved = store
        .create_item_bundle(SaveBundle {
            item,
            activity: Some(activity),
            notifications: vec![notification],
        })
        .await?;

    let seen = drain(&mut rx);
    assert_eq!(
        seen,
        vec![
            Collection::Items,
            Collection::Activities,
            Collection::Notifications
        ]
    );

    // Derived records point back at the saved item.
    let activities: Vec<Activity> = store.snapshot().await?;
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].item_id.as_deref(), Some(saved.id.as_str()));
    assert_eq!(activities[0].item_kind, Some(ItemKind::Household));

    let notifications: Vec<Notification> = store.snapshot().await?;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].item_id.as_deref(), Some(saved.id.as_str()));
    Ok(())
}

#[tokio::test]
async fn item_delete_cascades_and_reports_touched_collections() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let item = store.create(util::household_item(&user.id, "Bike")).await?;

    store
        .create(CareRecord {
            id: String::new(),
            user_id: user.id.clone(),
            item_id: item.id.clone(),
            item_kind: ItemKind::Household,
            care_type: "maintenance".into(),
            notes: None,
            cost: Some(25.0),
            occurred_at: 1_735_000_000_000,
            next_care_at: None,
            photo_refs: Vec::new(),
            created_at: 0,
            updated_at: 0,
        })
        .await?;
    let task = store
        .create(Task {
            id: String::new(),
            user_id: user.id.clone(),
            title: "Pump tyres".into(),
            description: None,
            due_at: None,
            reminder_at: None,
            completed_at: None,
            priority: 0,
            status: TaskStatus::Pending,
            item_id: Some(item.id.clone()),
            item_kind: Some(ItemKind::Household),
            recurrence: None,
            tags: Vec::new(),
            created_at: 0,
            updated_at: 0,
        })
        .await?;

    let mut rx = store.subscribe();
    assert!(store.delete::<Item>(&item.id).await?);

    let seen = drain(&mut rx);
    assert!(seen.contains(&Collection::Items));
    assert!(seen.contains(&Collection::CareRecords));
    assert!(seen.contains(&Collection::Tasks));
    assert!(!seen.contains(&Collection::Notifications));

    // Care records go with the item; tasks survive with the link nulled.
    let care: Vec<CareRecord> = store.snapshot().await?;
    assert!(care.is_empty());
    let kept: Task = store.get(&task.id).await?.expect("task survives");
    assert_eq!(kept.item_id, None);
    Ok(())
}

// Real time here: start_paused auto-advances the clock while sqlx-sqlite
// connects on a background thread, which trips the pool's acquire timeout.
#[tokio::test]
async fn watcher_coalesces_a_write_burst() -> Result<()> {
    let store = util::memory_store().await?;
    let user = util::seed_user(&store).await?;
    let mut watcher = Watcher::new(store.subscribe())
        .for_collection(Collection::Items)
        .with_window(Duration::from_millis(500));

    let first = store.create(util::household_item(&user.id, "Pan")).await?;
    store
        .update(&first.id, |item: &mut Item| item.name = "Frying pan".into())
        .await?;
    store.create(util::household_item(&user.id, "Pot")).await?;

    assert_eq!(watcher.changed().await, Some(()));
    drop(store);
    assert_eq!(watcher.changed().await, None);
    Ok(())
}
