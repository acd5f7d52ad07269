//! Domain records for the person store.
//!
//! # Invariants
//! - `Person::model_id` is the only key shared with the remote CRM.
//! - Timestamps are Unix epoch milliseconds.

pub mod metadata;
pub mod person;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before the epoch collapse to `0` instead of failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
