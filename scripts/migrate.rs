#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{anyhow, Result};
use burrow_lib::db::open_sqlite_pool;
use burrow_lib::migrate::{all_migrations, applied_versions, apply_migrations_up_to, checksum_of};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "migrate", about = "Burrow migration helper")]
struct Cli {
    /// Optional explicit DB path
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Print SQL without executing for up
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List migrations and show applied/pending
    List,
    /// Show current migration status
    Status,
    /// Apply pending migrations (optionally up to a target version)
    Up {
        /// Target version (inclusive)
        #[arg(long, value_name = "VERSION")]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    burrow_lib::logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.map(Ok).unwrap_or_else(default_db_path)?;

    match cli.cmd {
        Cmd::List => list(&db_path).await,
        Cmd::Status => status(&db_path).await,
        Cmd::Up { to } => up(&db_path, cli.dry_run, to.as_deref()).await,
    }
}

fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().unwrap_or(std::env::current_dir()?);
    Ok(base.join("burrow").join("burrow.sqlite3"))
}

async fn list(db_path: &PathBuf) -> Result<()> {
    let pool = open_sqlite_pool(db_path).await?;
    let applied: HashSet<String> = applied_versions(&pool).await?.into_iter().collect();
    for (version, sql) in all_migrations() {
        let mark = if applied.contains(*version) {
            "applied"
        } else {
            "pending"
        };
        println!("{mark}  {version}  {}", checksum_of(sql));
    }
    pool.close().await;
    Ok(())
}

async fn status(db_path: &PathBuf) -> Result<()> {
    let pool = open_sqlite_pool(db_path).await?;
    let applied = applied_versions(&pool).await?;
    let total = all_migrations().len();
    let current = applied.last().cloned().unwrap_or_else(|| "(none)".into());
    println!("db: {}", db_path.display());
    println!("applied: {}/{total}", applied.len());
    println!("current: {current}");
    pool.close().await;
    Ok(())
}

async fn up(db_path: &PathBuf, dry_run: bool, to: Option<&str>) -> Result<()> {
    if let Some(target) = to {
        if !all_migrations().iter().any(|(v, _)| *v == target) {
            return Err(anyhow!("unknown migration version: {target}"));
        }
    }
    if dry_run {
        let pool = open_sqlite_pool(db_path).await?;
        let applied: HashSet<String> = applied_versions(&pool).await?.into_iter().collect();
        pool.close().await;
        for (version, sql) in all_migrations() {
            if !applied.contains(*version) {
                println!("-- {version}");
                println!("{sql}");
            }
            if to == Some(*version) {
                break;
            }
        }
        return Ok(());
    }
    let pool = open_sqlite_pool(db_path).await?;
    apply_migrations_up_to(&pool, to).await?;
    let applied = applied_versions(&pool).await?;
    println!("applied: {}/{}", applied.len(), all_migrations().len());
    pool.close().await;
    Ok(())
}
