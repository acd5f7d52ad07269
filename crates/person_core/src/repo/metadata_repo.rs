//! Sync metadata store contract and SQLite implementation.
//!
//! # Invariants
//! - The sync path only reads and replaces; it never inserts or deletes.
//! - `replace_one` is scoped by record `id` and reports the match count.

use crate::model::metadata::MetaData;
use crate::repo::person_repo::{RepoError, RepoResult, WriteOutcome};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// Storage for per-model sync metadata records.
pub trait MetadataStore {
    fn find_by_model_id(&self, model_id: &str) -> RepoResult<Option<MetaData>>;
    /// Replaces the record whose id equals `metadata.id`.
    fn replace_one(&self, metadata: &MetaData) -> RepoResult<WriteOutcome>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for &T {
    fn find_by_model_id(&self, model_id: &str) -> RepoResult<Option<MetaData>> {
        (**self).find_by_model_id(model_id)
    }

    fn replace_one(&self, metadata: &MetaData) -> RepoResult<WriteOutcome> {
        (**self).replace_one(metadata)
    }
}

/// SQLite-backed metadata store.
pub struct SqliteMetadataRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetadataRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Provisions the metadata record for `model_id` if it does not exist.
    ///
    /// Used by deployment tooling; the sync path never calls this.
    pub fn ensure_metadata(&self, model_id: &str) -> RepoResult<MetaData> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(RepoError::InvalidData(
                "metadata model_id must not be blank".to_string(),
            ));
        }
        if let Some(existing) = self.find_by_model_id(model_id)? {
            return Ok(existing);
        }

        let metadata = MetaData {
            id: Uuid::new_v4().to_string(),
            model_id: model_id.to_string(),
            last_modified: 0,
        };
        self.conn.execute(
            "INSERT INTO sync_metadata (id, model_id, last_modified) VALUES (?1, ?2, ?3);",
            params![metadata.id, metadata.model_id, metadata.last_modified],
        )?;
        info!(
            "event=metadata_provision module=repo status=ok model_id={}",
            metadata.model_id
        );
        Ok(metadata)
    }
}

impl MetadataStore for SqliteMetadataRepository<'_> {
    fn find_by_model_id(&self, model_id: &str) -> RepoResult<Option<MetaData>> {
        let metadata = self
            .conn
            .query_row(
                "SELECT id, model_id, last_modified FROM sync_metadata WHERE model_id = ?1;",
                [model_id],
                |row| {
                    Ok(MetaData {
                        id: row.get(0)?,
                        model_id: row.get(1)?,
                        last_modified: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(metadata)
    }

    fn replace_one(&self, metadata: &MetaData) -> RepoResult<WriteOutcome> {
        let changed = self.conn.execute(
            "UPDATE sync_metadata SET model_id = ?1, last_modified = ?2 WHERE id = ?3;",
            params![metadata.model_id, metadata.last_modified, metadata.id],
        )?;
        Ok(WriteOutcome::acknowledged(changed))
    }
}
