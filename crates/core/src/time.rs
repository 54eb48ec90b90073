//! Wall-clock timestamps as stored on documents (`created`, `paymentDate`).

use chrono::Utc;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}
