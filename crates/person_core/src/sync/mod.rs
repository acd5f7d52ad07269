//! CRM contact synchronization.
//!
//! # Responsibility
//! - Fetch the full contact list from the CRM (`remote_source`).
//! - Converge the local person set onto it by `model_id` (`reconciler`).
//!
//! # Invariants
//! - An unavailable remote is a soft no-op, never an error.
//! - A malformed remote payload aborts the attempt before any local write.

use crate::repo::person_repo::{RepoError, WriteOutcome};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod reconciler;
pub mod remote_source;

pub type SyncResult<T> = Result<T, SyncError>;

/// Fatal failures of one synchronization attempt.
#[derive(Debug)]
pub enum SyncError {
    /// The HTTP client could not be constructed from configuration.
    ClientSetup(reqwest::Error),
    /// The response body is not a JSON array of contacts.
    Decode(serde_json::Error),
    /// A decoded contact breaks a record invariant.
    InvalidRecord { index: usize, reason: String },
    Repo(RepoError),
    /// The metadata commit did not touch exactly one acknowledged record.
    ConcurrencyFailure {
        metadata_id: String,
        outcome: WriteOutcome,
    },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientSetup(err) => write!(f, "remote client setup failed: {err}"),
            Self::Decode(err) => write!(f, "remote contact payload is malformed: {err}"),
            Self::InvalidRecord { index, reason } => {
                write!(f, "remote contact #{index} is invalid: {reason}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::ConcurrencyFailure {
                metadata_id,
                outcome,
            } => write!(
                f,
                "global sync time not updated for metadata `{metadata_id}` (acknowledged={}, modified={})",
                outcome.acknowledged, outcome.count
            ),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ClientSetup(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidRecord { .. } | Self::ConcurrencyFailure { .. } => None,
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
