use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlx::{Executor, Row, SqlitePool};
use std::collections::HashMap;

use crate::time::now_ms;
use tracing::{error, info};

fn preview(sql: &str) -> String {
    let one_line = sql.replace(['\n', '\t'], " ");
    let trimmed = one_line.trim();
    if trimmed.len() > 160 {
        format!("{}…", &trimmed[..160])
    } else {
        trimmed.to_string()
    }
}

static MIGRATIONS: &[(&str, &str)] = &[
    (
        "202608251200_initial.sql",
        include_str!("../migrations/202608251200_initial.sql"),
    ),
    (
        "202608251300_care_and_alerts.sql",
        include_str!("../migrations/202608251300_care_and_alerts.sql"),
    ),
    (
        "202608251400_tasks_and_rules.sql",
        include_str!("../migrations/202608251400_tasks_and_rules.sql"),
    ),
    (
        "202608251500_indexes.sql",
        include_str!("../migrations/202608251500_indexes.sql"),
    ),
];

/// The embedded migration set, in application order.
pub fn all_migrations() -> &'static [(&'static str, &'static str)] {
    MIGRATIONS
}

fn strip_comments(raw_sql: &str) -> String {
    raw_sql
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.is_empty() || t.starts_with("--"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn checksum_of(raw_sql: &str) -> String {
    format!("{:x}", Sha256::digest(strip_comments(raw_sql).as_bytes()))
}

/// Versions already recorded in `schema_migrations`, if the table exists.
pub async fn applied_versions(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let exists: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
    )
    .fetch_optional(pool)
    .await?;
    if exists.is_none() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|r| r.try_get::<String, _>("version").ok())
        .collect())
}

pub async fn apply_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    apply_migrations_up_to(pool, None).await
}

/// Apply pending migrations, stopping after `up_to` (inclusive) when given.
pub async fn apply_migrations_up_to(
    pool: &SqlitePool,
    up_to: Option<&str>,
) -> anyhow::Result<()> {
    pool.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
           version   TEXT PRIMARY KEY,\
           applied_at INTEGER NOT NULL,\
           checksum TEXT NOT NULL\
         )",
    )
    .await?;

    let rows = sqlx::query("SELECT version, checksum FROM schema_migrations")
        .fetch_all(pool)
        .await?;
    let mut applied: HashMap<String, String> = HashMap::new();
    for r in rows {
        if let (Ok(v), Ok(c)) = (
            r.try_get::<String, _>("version"),
            r.try_get::<String, _>("checksum"),
        ) {
            applied.insert(v, c);
        }
    }
    static ADD_COL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^ALTER\s+TABLE\s+(\w+)\s+ADD\s+COLUMN\s+(\w+)").expect("valid regex")
    });

    for (filename, raw_sql) in MIGRATIONS {
        let cleaned = strip_comments(raw_sql);
        let checksum = format!("{:x}", Sha256::digest(cleaned.as_bytes()));

        if let Some(stored) = applied.get(*filename) {
            if stored != &checksum {
                anyhow::bail!("migration {} edited after application", filename);
            }
            info!(target = "burrow", event = "migration_skip_file", file = %filename);
            if up_to == Some(*filename) {
                break;
            }
            continue;
        }

        let mut tx = pool.begin().await?;
        for stmt in cleaned.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            let upper = s.to_ascii_uppercase();
            if upper == "BEGIN" || upper == "COMMIT" {
                continue;
            }
            if let Some(caps) = ADD_COL_RE.captures(s) {
                let table = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let col = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                let existing: Option<i64> = sqlx::query_scalar(&format!(
                    "SELECT 1 FROM pragma_table_info('{table}') WHERE name='{col}'"
                ))
                .fetch_optional(&mut *tx)
                .await?;
                if existing.is_some() {
                    info!(target = "burrow", event = "migration_stmt_skip", file = %filename, sql = %preview(s));
                    continue;
                }
            }
            info!(target = "burrow", event = "migration_stmt", file = %filename, sql = %preview(s));
            if let Err(e) = sqlx::query(s).execute(&mut *tx).await {
                error!(target = "burrow", event = "migration_stmt_error", file = %filename, sql = %preview(s), error = %e);
                return Err(e.into());
            }
        }

        sqlx::query(
            "INSERT INTO schema_migrations (version, applied_at, checksum) VALUES (?, ?, ?)",
        )
        .bind(*filename)
        .bind(now_ms())
        .bind(&checksum)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(target = "burrow", event = "migration_file_applied", file = %filename);

        if up_to == Some(*filename) {
            break;
        }
    }

    Ok(())
}
