//! Ordered schema migrations for the person store.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - Pending migrations apply inside one transaction; `PRAGMA user_version`
//!   is bumped after each step, so a failure leaves the old version intact.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "persons",
        sql: include_str!("0001_persons.sql"),
    },
    Migration {
        version: 2,
        name: "sync_metadata",
        sql: include_str!("0002_sync_metadata.sql"),
    },
];

/// Schema version written by the newest migration in this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Brings the connection's schema up to `latest_version()`.
///
/// Returns the schema version in effect afterwards.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let schema_version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();
    if schema_version > supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: schema_version,
            latest_supported: supported,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > schema_version)
        .collect();
    if pending.is_empty() {
        return Ok(schema_version);
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(supported)
}
