//! Sync metadata singleton.
//!
//! One record per tracked model type. It is provisioned outside the sync
//! path and only ever advanced by a successful reconciliation.

use serde::{Deserialize, Serialize};

/// Default `model_id` for the person metadata record.
pub const PERSON_METADATA_MODEL_ID: &str = "person";

/// Last-successful-sync marker for one model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Record identifier used as the replace filter.
    pub id: String,
    /// Which model type this record tracks.
    pub model_id: String,
    /// Unix epoch milliseconds of the last successful sync.
    pub last_modified: i64,
}

impl MetaData {
    /// Returns a copy stamped with `now`, never moving backwards in time.
    pub fn advanced_to(&self, now: i64) -> Self {
        Self {
            last_modified: self.last_modified.max(now),
            ..self.clone()
        }
    }
}
