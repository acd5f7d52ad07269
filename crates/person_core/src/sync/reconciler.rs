//! Presence-only set reconciliation keyed by `model_id`.
//!
//! After `reconcile` returns `Ok`, the local `model_id` set equals the remote
//! one. Records present on both sides are left untouched; no field-level
//! diff is performed. Both sides are indexed by hash set, so a pass costs
//! O(local + remote) lookups.

use crate::model::person::{Person, RemoteContact};
use crate::repo::person_repo::PersonStore;
use crate::sync::SyncResult;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// Counts of what one reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl ReconcileReport {
    /// True when neither pass wrote anything.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

/// Converges the store onto `remote`, stamping new records with `now`.
///
/// Duplicate keys in `remote` produce one local record.
pub fn reconcile<S>(store: &S, remote: &[RemoteContact], now: i64) -> SyncResult<ReconcileReport>
where
    S: PersonStore + ?Sized,
{
    let local = store.find_all()?;
    let local_keys: HashSet<&str> = local.iter().map(|p| p.model_id.as_str()).collect();
    let remote_keys: HashSet<&str> = remote.iter().map(RemoteContact::key).collect();
    let mut report = ReconcileReport::default();

    let mut inserted_keys = HashSet::new();
    for contact in remote {
        let key = contact.key();
        if local_keys.contains(key) || !inserted_keys.insert(key) {
            continue;
        }
        store.insert_one(&Person::from_remote(contact, now))?;
        report.inserted += 1;
    }

    let mut deleted_keys = HashSet::new();
    for person in &local {
        let key = person.model_id.as_str();
        if remote_keys.contains(key) {
            report.unchanged += 1;
            continue;
        }
        if deleted_keys.insert(key) {
            let outcome = store.delete_by_model_id(key)?;
            report.deleted += outcome.count as usize;
        }
    }

    debug!(
        "event=reconcile module=sync status=ok local={} remote={} inserted={} deleted={} unchanged={}",
        local.len(),
        remote.len(),
        report.inserted,
        report.deleted,
        report.unchanged
    );
    Ok(report)
}
