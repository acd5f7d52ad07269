//! Person repository facade.
//!
//! # Responsibility
//! - Single-document CRUD over the person store.
//! - Run CRM synchronization (`update_repository`) and commit its timestamp.
//! - Serve the cached last-sync time.
//!
//! # Invariants
//! - Malformed identifiers and absent payloads fail with `InvalidArgument`.
//! - Update/delete report `false` unless exactly one document was affected.
//! - At most one `update_repository` runs per facade at a time.
//! - The cached metadata only advances after a confirmed single-record commit.

use crate::model::metadata::MetaData;
use crate::model::now_epoch_ms;
use crate::model::person::{Person, PersonId, PersonInput};
use crate::repo::metadata_repo::MetadataStore;
use crate::repo::person_repo::{PersonStore, RepoError};
use crate::sync::reconciler::{reconcile, ReconcileReport};
use crate::sync::remote_source::RemoteSource;
use crate::sync::SyncError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Facade-level error.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed identifier or missing payload; a client error.
    InvalidArgument(String),
    /// No metadata record is provisioned for the tracked model.
    MetadataNotFound(String),
    Repo(RepoError),
    Sync(SyncError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::MetadataNotFound(model_id) => {
                write!(f, "sync metadata not found for model `{model_id}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::InvalidArgument(_) | Self::MetadataNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SyncError> for ServiceError {
    fn from(value: SyncError) -> Self {
        match value {
            SyncError::Repo(err) => Self::Repo(err),
            other => Self::Sync(other),
        }
    }
}

impl ServiceError {
    /// True for the metadata commit guard failure.
    pub fn is_concurrency_failure(&self) -> bool {
        matches!(self, Self::Sync(SyncError::ConcurrencyFailure { .. }))
    }
}

/// What a call to `update_repository` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote had nothing to offer; nothing was touched.
    Skipped,
    /// Reconciliation ran and the metadata commit succeeded.
    Applied(ReconcileReport),
}

/// Repository facade over a person store, its sync metadata and the CRM.
pub struct PersonService<S, M, R> {
    persons: S,
    metadata_store: M,
    remote: R,
    metadata: Mutex<MetaData>,
    sync_guard: Mutex<()>,
}

impl<S, M, R> PersonService<S, M, R>
where
    S: PersonStore,
    M: MetadataStore,
    R: RemoteSource,
{
    /// Builds the facade and loads the metadata record for `metadata_model_id`.
    ///
    /// # Errors
    /// - `MetadataNotFound` when the record has not been provisioned.
    pub fn new(
        persons: S,
        metadata_store: M,
        remote: R,
        metadata_model_id: &str,
    ) -> ServiceResult<Self> {
        let metadata = metadata_store
            .find_by_model_id(metadata_model_id)?
            .ok_or_else(|| ServiceError::MetadataNotFound(metadata_model_id.to_string()))?;
        info!(
            "event=service_init module=service status=ok metadata_id={} last_modified={}",
            metadata.id, metadata.last_modified
        );
        Ok(Self {
            persons,
            metadata_store,
            remote,
            metadata: Mutex::new(metadata),
            sync_guard: Mutex::new(()),
        })
    }

    pub fn get_all(&self) -> ServiceResult<Vec<Person>> {
        Ok(self.persons.find_all()?)
    }

    pub fn get_by_id(&self, id: &str) -> ServiceResult<Option<Person>> {
        let id = parse_person_id(id)?;
        Ok(self.persons.find_by_id(id)?)
    }

    /// Stores a new person with a fresh id and the current timestamp.
    pub fn create(&self, model: Option<PersonInput>) -> ServiceResult<Person> {
        let input = require_model(model)?;
        let person = Person::from_input(input, now_epoch_ms());
        self.persons.insert_one(&person)?;
        Ok(person)
    }

    /// Replaces the contact fields of one person.
    ///
    /// The stored `model_id` is kept so the record stays correlated with its
    /// CRM contact.
    pub fn update_by_id(&self, id: &str, model: Option<PersonInput>) -> ServiceResult<bool> {
        let id = parse_person_id(id)?;
        let input = require_model(model)?;

        let Some(existing) = self.persons.find_by_id(id)? else {
            return Ok(false);
        };
        let mut person = Person::with_id_from_input(id, input, now_epoch_ms());
        person.model_id = existing.model_id;

        Ok(self.persons.replace_one(&person)?.is_single())
    }

    pub fn delete_by_id(&self, id: &str) -> ServiceResult<bool> {
        let id = parse_person_id(id)?;
        Ok(self.persons.delete_one(id)?.is_single())
    }

    /// Pulls the CRM contact list, reconciles the store and commits the
    /// sync timestamp.
    ///
    /// # Errors
    /// - `Sync(Decode | InvalidRecord)` for a malformed remote payload.
    /// - `Sync(ConcurrencyFailure)` when the metadata commit does not touch
    ///   exactly one record; the store may then be reconciled without a
    ///   recorded sync time.
    pub fn update_repository(&self) -> ServiceResult<SyncOutcome> {
        let _running = self
            .sync_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started_at = Instant::now();
        info!("event=sync_run module=service status=start");

        let contacts = match self.remote.fetch_all() {
            Ok(Some(contacts)) => contacts,
            Ok(None) => {
                info!(
                    "event=sync_run module=service status=skipped reason=remote_unavailable duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(SyncOutcome::Skipped);
            }
            Err(err) => {
                error!(
                    "event=sync_run module=service status=error stage=fetch duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(err.into());
            }
        };

        let report = reconcile(&self.persons, &contacts, now_epoch_ms()).map_err(|err| {
            error!(
                "event=sync_run module=service status=error stage=reconcile duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            ServiceError::from(err)
        })?;

        self.commit_sync_time().map_err(|err| {
            error!(
                "event=sync_run module=service status=error stage=commit duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            err
        })?;

        info!(
            "event=sync_run module=service status=ok inserted={} deleted={} unchanged={} duration_ms={}",
            report.inserted,
            report.deleted,
            report.unchanged,
            started_at.elapsed().as_millis()
        );
        Ok(SyncOutcome::Applied(report))
    }

    /// Last successful sync time known to this instance (epoch ms).
    ///
    /// Served from the value loaded at construction and advanced by this
    /// instance's own syncs; see `reload_metadata` for the persisted value.
    pub fn last_global_update_time(&self) -> i64 {
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_modified
    }

    /// Re-reads the metadata record so the cache reflects other instances.
    pub fn reload_metadata(&self) -> ServiceResult<i64> {
        let mut cached = self.metadata.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = self
            .metadata_store
            .find_by_model_id(&cached.model_id)?
            .ok_or_else(|| ServiceError::MetadataNotFound(cached.model_id.clone()))?;
        *cached = fresh;
        Ok(cached.last_modified)
    }

    fn commit_sync_time(&self) -> ServiceResult<()> {
        let mut cached = self.metadata.lock().unwrap_or_else(PoisonError::into_inner);
        let next = cached.advanced_to(now_epoch_ms());
        let outcome = self.metadata_store.replace_one(&next)?;
        if !outcome.is_single() {
            warn!(
                "event=metadata_commit module=service status=conflict metadata_id={} acknowledged={} modified={}",
                next.id, outcome.acknowledged, outcome.count
            );
            return Err(SyncError::ConcurrencyFailure {
                metadata_id: next.id,
                outcome,
            }
            .into());
        }
        *cached = next;
        Ok(())
    }
}

fn parse_person_id(raw: &str) -> ServiceResult<PersonId> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::InvalidArgument(format!("invalid person id `{raw}`")))
}

fn require_model(model: Option<PersonInput>) -> ServiceResult<PersonInput> {
    model.ok_or_else(|| ServiceError::InvalidArgument("person payload is required".to_string()))
}
