use futures::FutureExt;
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::id::new_uuid_v7;
use crate::model::{Activity, Collection, Entity, Item, Notification};
use crate::time::now_ms;
use crate::AppError;

/// Invalidation signal: the named collection changed after a committed
/// transaction. Consumers reload the collections they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: String },
    #[error(transparent)]
    Write(#[from] sqlx::Error),
    #[error(transparent)]
    Invalid(#[from] AppError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::new("STORE/NOT_FOUND", "Record not found")
                    .with_context("collection", collection.to_string())
                    .with_context("id", id)
            }
            StoreError::Write(e) => AppError::from(e),
            StoreError::Invalid(e) => e,
        }
    }
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Single point of transactional access to all persisted records.
///
/// Explicitly constructed and passed to consumers; holds the pool for the
/// process lifetime and a broadcast channel carrying [`ChangeEvent`]s.
/// Writes are all-or-nothing; events are sent only after commit, once per
/// touched collection per transaction.
#[derive(Clone)]
pub struct EntityStore {
    pool: SqlitePool,
    changes: broadcast::Sender<ChangeEvent>,
}

impl EntityStore {
    /// Open the database file, run pending migrations and wrap the pool.
    pub async fn open(db_path: &Path) -> anyhow::Result<Self> {
        let pool = crate::db::open_sqlite_pool(db_path).await?;
        crate::migrate::apply_migrations(&pool).await?;
        Ok(Self::with_pool(pool))
    }

    /// Wrap an already-migrated pool (tests, tooling).
    pub fn with_pool(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        EntityStore { pool, changes }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Subscribe to post-commit change events. The subscription only sees
    /// changes committed after this call; reading a snapshot never signals.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    fn notify(&self, collections: &[Collection]) {
        for &collection in collections {
            debug!(target = "burrow", event = "store_change", collection = %collection);
            // Send fails only when nobody is subscribed.
            let _ = self.changes.send(ChangeEvent { collection });
        }
    }

    /// Insert a new record inside a transaction. Assigns an id when the
    /// record carries none and stamps both timestamps.
    pub async fn create<E: Entity>(&self, mut record: E) -> Result<E, StoreError> {
        if record.id().is_empty() {
            record.set_id(new_uuid_v7());
        }
        let now = now_ms();
        // A caller-supplied creation stamp is honoured for backfills, but a
        // stamp from the future would leave updated_at behind created_at.
        if record.created_at() == 0 || record.created_at() > now {
            record.stamp_created(now);
        } else {
            record.stamp_updated(now);
        }

        let row = record.to_row()?;
        crate::db::run_in_tx::<_, StoreError, _>(&self.pool, move |conn| {
            async move {
                insert_row(conn, E::COLLECTION.table(), &row)
                    .await
                    .map_err(StoreError::from)
            }
            .boxed()
        })
        .await?;

        self.notify(&[E::COLLECTION]);
        Ok(record)
    }

    /// Load a record, apply a caller-supplied mutation, stamp `updated_at`
    /// and overwrite the whole row. The mutation runs on the stored state;
    /// conflicting writers are last-commit-wins.
    pub async fn update<E, F>(&self, id: &str, mutate: F) -> Result<E, StoreError>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        let table = E::COLLECTION.table();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!("SELECT * FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound {
                collection: E::COLLECTION,
                id: id.to_string(),
            });
        };
        let prior = E::from_row(&row)?;

        let mut record = prior.clone();
        mutate(&mut record);
        // Neither the primary key nor the creation stamp is a mutable
        // field; the returned record must agree with the committed row.
        record.set_id(id.to_string());
        record.validate_update(&prior)?;
        record.stamp_created(prior.created_at());
        record.stamp_updated(now_ms());

        let data = record.to_row()?;
        update_row(&mut tx, table, id, &data).await?;
        tx.commit().await?;

        self.notify(&[E::COLLECTION]);
        Ok(record)
    }

    /// Remove a record. Idempotent: deleting an absent record is an Ok
    /// no-op that returns `false` and emits no change event.
    ///
    /// Item deletes cascade to care records and notifications and null the
    /// item reference on tasks and activities (schema FK actions); events
    /// are reported for every collection the cascade touched.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<bool, StoreError> {
        let table = E::COLLECTION.table();
        let mut tx = self.pool.begin().await?;

        let mut touched = vec![E::COLLECTION];
        if E::COLLECTION == Collection::Items {
            for dependent in [
                Collection::CareRecords,
                Collection::Notifications,
                Collection::Tasks,
                Collection::Activities,
            ] {
                let n: i64 = sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM {} WHERE item_id = ?",
                    dependent.table()
                ))
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                if n > 0 {
                    touched.push(dependent);
                }
            }
        }

        let res = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            // Already gone; dropping the tx rolls back.
            return Ok(false);
        }
        tx.commit().await?;

        self.notify(&touched);
        Ok(true)
    }

    /// Single-record read; `None` when absent. Never signals a change.
    pub async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        let table = E::COLLECTION.table();
        let row = sqlx::query(&format!("SELECT * FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(E::from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Current contents of a collection, oldest first. Filtering by owner
    /// or kind is the consumer's job. Never signals a change.
    pub async fn snapshot<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        let table = E::COLLECTION.table();
        let rows = sqlx::query(&format!("SELECT * FROM {table} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| E::from_row(row).map_err(StoreError::from))
            .collect()
    }

    /// A form save: the item plus its derived records, committed as one
    /// transaction. Exactly one event per touched collection on success.
    pub async fn create_item_bundle(&self, bundle: SaveBundle) -> Result<Item, StoreError> {
        let SaveBundle {
            mut item,
            activity,
            notifications,
        } = bundle;

        let now = now_ms();
        if item.id.is_empty() {
            item.set_id(new_uuid_v7());
        }
        item.stamp_created(now);

        let mut touched = vec![Collection::Items];
        let mut tx = self.pool.begin().await?;
        insert_row(&mut tx, Collection::Items.table(), &item.to_row()?).await?;

        if let Some(mut activity) = activity {
            if activity.id.is_empty() {
                activity.set_id(new_uuid_v7());
            }
            activity.item_id.get_or_insert_with(|| item.id.clone());
            activity.item_kind.get_or_insert(item.kind());
            activity.stamp_created(now);
            insert_row(&mut tx, Collection::Activities.table(), &activity.to_row()?).await?;
            touched.push(Collection::Activities);
        }

        if !notifications.is_empty() {
            for mut notification in notifications {
                if notification.id.is_empty() {
                    notification.set_id(new_uuid_v7());
                }
                notification.item_id.get_or_insert_with(|| item.id.clone());
                notification.item_kind.get_or_insert(item.kind());
                notification.stamp_created(now);
                insert_row(
                    &mut tx,
                    Collection::Notifications.table(),
                    &notification.to_row()?,
                )
                .await?;
            }
            touched.push(Collection::Notifications);
        }

        tx.commit().await?;
        self.notify(&touched);
        Ok(item)
    }
}

/// What one form save persists atomically.
pub struct SaveBundle {
    pub item: Item,
    pub activity: Option<Activity>,
    pub notifications: Vec<Notification>,
}

async fn insert_row(
    conn: &mut SqliteConnection,
    table: &str,
    data: &Map<String, Value>,
) -> Result<(), sqlx::Error> {
    let cols: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders: Vec<&str> = cols.iter().map(|_| "?").collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        cols.join(","),
        placeholders.join(",")
    );
    let mut query = sqlx::query(&sql);
    for col in &cols {
        query = bind_value(query, &data[*col]);
    }
    query.execute(conn).await?;
    Ok(())
}

async fn update_row(
    conn: &mut SqliteConnection,
    table: &str,
    id: &str,
    data: &Map<String, Value>,
) -> Result<u64, sqlx::Error> {
    let cols: Vec<&str> = data
        .keys()
        .map(String::as_str)
        .filter(|c| *c != "id" && *c != "created_at")
        .collect();
    let set_clause: Vec<String> = cols.iter().map(|c| format!("{c} = ?")).collect();
    let sql = format!("UPDATE {table} SET {} WHERE id = ?", set_clause.join(","));
    let mut query = sqlx::query(&sql);
    for col in &cols {
        query = bind_value(query, &data[*col]);
    }
    query = query.bind(id.to_string());
    let res = query.execute(conn).await?;
    Ok(res.rows_affected())
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    v: &Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match v {
        Value::Null => q.bind(Option::<i64>::None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(Option::<i64>::None)
            }
        }
        Value::Bool(b) => q.bind(*b as i64),
        Value::String(s) => q.bind(s.clone()),
        _ => q.bind(v.to_string()),
    }
}
