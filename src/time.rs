use chrono::{DateTime, Duration, Utc};

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn to_date(ms: i64) -> DateTime<Utc> {
    // from_timestamp_millis returns Option<DateTime<Utc>>
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap())
}

/// Reminder triggers are "N days before the deadline", as whole days.
pub fn days_before(ms: i64, days: i64) -> i64 {
    ms - Duration::days(days).num_milliseconds()
}

/// Care schedules are "N days after the last action".
pub fn days_after(ms: i64, days: i64) -> i64 {
    ms + Duration::days(days).num_milliseconds()
}
