//! Person store with CRM contact synchronization.
//!
//! The crate owns the person records, the sync metadata singleton and the
//! reconciliation that converges local persons onto the CRM contact list.
//! Outer layers (HTTP handlers, schedulers, the CLI) talk to `PersonService`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, LogConfig, RemoteSourceConfig, ServiceConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::metadata::{MetaData, PERSON_METADATA_MODEL_ID};
pub use model::person::{
    Address, Person, PersonId, PersonInput, PersonValidationError, RemoteContact,
};
pub use repo::metadata_repo::{MetadataStore, SqliteMetadataRepository};
pub use repo::person_repo::{
    PersonStore, RepoError, RepoResult, SqlitePersonRepository, WriteOutcome,
};
pub use service::person_service::{PersonService, ServiceError, ServiceResult, SyncOutcome};
pub use sync::reconciler::{reconcile, ReconcileReport};
pub use sync::remote_source::{decode_contacts, HttpRemoteSource, RemoteSource};
pub use sync::{SyncError, SyncResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
