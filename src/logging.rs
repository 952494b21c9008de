use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "burrow=info,sqlx=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("BURROW_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the stdout subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .try_init();
}

/// Install the stdout subscriber plus a daily-rotated JSON file sink under
/// `log_dir`. The returned guard must be held for the process lifetime or
/// buffered lines are dropped on exit.
pub fn init_with_file(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "burrow.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::rfc_3339()),
        )
        .try_init();

    Ok(guard)
}
