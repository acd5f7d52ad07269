//! CRM contact source.
//!
//! # Responsibility
//! - Issue one GET against the configured endpoint per fetch.
//! - Decode a JSON array of contacts from a successful response.
//!
//! # Invariants
//! - Non-2xx status, transport failure, blank body and JSON `null` all mean
//!   "no update available" (`Ok(None)`).
//! - A body that is not a contact array is a `SyncError::Decode`.
//! - No retries and no pagination.

use crate::config::RemoteSourceConfig;
use crate::model::person::RemoteContact;
use crate::sync::{SyncError, SyncResult};
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::{Duration, Instant};

/// Source of the authoritative contact list.
pub trait RemoteSource {
    /// Returns the full current contact list, or `None` when unavailable.
    fn fetch_all(&self) -> SyncResult<Option<Vec<RemoteContact>>>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &T {
    fn fetch_all(&self) -> SyncResult<Option<Vec<RemoteContact>>> {
        (**self).fetch_all()
    }
}

/// Blocking HTTP client for the CRM contact endpoint.
pub struct HttpRemoteSource {
    base_url: String,
    client: Client,
}

impl HttpRemoteSource {
    /// Builds a client from configuration.
    pub fn new(config: &RemoteSourceConfig) -> SyncResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(SyncError::ClientSetup)?;
        Ok(Self::with_client(config.base_url.clone(), client))
    }

    /// Wraps a preconfigured client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RemoteSource for HttpRemoteSource {
    fn fetch_all(&self) -> SyncResult<Option<Vec<RemoteContact>>> {
        let started_at = Instant::now();
        let response = match self
            .client
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .send()
        {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "event=remote_fetch module=sync status=unavailable duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            info!(
                "event=remote_fetch module=sync status=unavailable http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Ok(None);
        }

        let body = match response.bytes() {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    "event=remote_fetch module=sync status=unavailable duration_ms={} error_code=body_read_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                return Ok(None);
            }
        };

        let contacts = decode_contacts(&body)?;
        info!(
            "event=remote_fetch module=sync status=ok http_status={} contacts={} duration_ms={}",
            status.as_u16(),
            contacts.as_ref().map_or(0, Vec::len),
            started_at.elapsed().as_millis()
        );
        Ok(contacts)
    }
}

/// Decodes a raw contact-list response body.
///
/// Blank bodies and JSON `null` decode to `None`; `[]` decodes to an empty
/// list, which is a real (empty) remote set. Bytes that are not valid UTF-8
/// JSON are a `SyncError::Decode`.
pub fn decode_contacts(body: impl AsRef<[u8]>) -> SyncResult<Option<Vec<RemoteContact>>> {
    let body = body.as_ref();
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let contacts: Option<Vec<RemoteContact>> =
        serde_json::from_slice(body).map_err(SyncError::Decode)?;
    if let Some(contacts) = contacts.as_ref() {
        for (index, contact) in contacts.iter().enumerate() {
            if contact.key().is_empty() {
                return Err(SyncError::InvalidRecord {
                    index,
                    reason: "modelId must not be blank".to_string(),
                });
            }
        }
    }
    Ok(contacts)
}
