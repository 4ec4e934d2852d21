//! Sync layer: in-memory document state ↔ remote records.
//!
//! # Rules
//! - No credential means no call: `on_unauthenticated` fires and the operation fails.
//! - A 401 from the store also fires `on_unauthenticated`.
//! - Save creates on the first save of a session and updates afterwards.
//! - Delete removes the row from the listing first; if the remote delete fails the
//!   row goes back at its original index and the error is returned.
//! - At most one delete per id is in flight. A refresh while it runs keeps the row hidden,
//!   and a rollback never inserts a row the listing already holds.
//! - Every remote call is bounded by the configured timeout. No retries.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::model::{EditingSession, ResumeDocument, UuidIds};
use crate::sync::auth::AuthProvider;
use crate::sync::codec::{decode_document, encode_document, record_title};
use crate::sync::store::{RecordPayload, RemoteRecord, ResumeStore, ResumeSummary, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Delete of resume '{0}' is already in progress")]
    DeleteInProgress(String),

    #[error("Could not encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct SyncLayer {
    store: Arc<dyn ResumeStore>,
    auth: Arc<dyn AuthProvider>,
    timeout: Duration,
    listing: Mutex<Vec<ResumeSummary>>,
    deleting: Mutex<HashSet<String>>,
}

/// Releases a per-id delete slot when dropped.
struct DeleteSlot<'a> {
    deleting: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for DeleteSlot<'_> {
    fn drop(&mut self) {
        lock(self.deleting).remove(&self.id);
    }
}

/// The guarded data stays consistent under panic, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SyncLayer {
    pub fn new(store: Arc<dyn ResumeStore>, auth: Arc<dyn AuthProvider>, timeout: Duration) -> Self {
        Self {
            store,
            auth,
            timeout,
            listing: Mutex::new(Vec::new()),
            deleting: Mutex::new(HashSet::new()),
        }
    }

    /// Snapshot of the in-memory listing.
    pub fn listing(&self) -> Vec<ResumeSummary> {
        lock(&self.listing).clone()
    }

    fn token(&self) -> Result<String, SyncError> {
        match self.auth.get_token() {
            Some(token) => Ok(token),
            None => {
                warn!("No credential available; redirecting to sign-in");
                self.auth.on_unauthenticated();
                Err(SyncError::Unauthenticated)
            }
        }
    }

    /// Runs one store call under the timeout and maps a rejected credential.
    async fn call<T, F>(&self, fut: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };
        match result {
            Ok(value) => Ok(value),
            Err(StoreError::Unauthorized) => {
                warn!("Remote store rejected the credential");
                self.auth.on_unauthenticated();
                Err(SyncError::Unauthenticated)
            }
            Err(e) => Err(SyncError::Store(e)),
        }
    }

    /// Replaces the in-memory listing with the store's.
    pub async fn refresh_listing(&self) -> Result<Vec<ResumeSummary>, SyncError> {
        let token = self.token()?;
        let mut rows = self.call(self.store.list(&token)).await?;
        {
            let deleting = lock(&self.deleting);
            rows.retain(|row| !deleting.contains(&row.id));
        }
        info!(count = rows.len(), "Listing refreshed");
        *lock(&self.listing) = rows.clone();
        Ok(rows)
    }

    /// Saves `doc`: update when `record_id` is set, create otherwise.
    pub async fn save(
        &self,
        doc: &ResumeDocument,
        record_id: Option<&str>,
    ) -> Result<RemoteRecord, SyncError> {
        let token = self.token()?;
        let payload = RecordPayload {
            title: record_title(doc.personal_info()),
            content: encode_document(doc)?,
        };

        let record = match record_id {
            Some(id) => self.call(self.store.update(&token, id, &payload)).await?,
            None => self.call(self.store.create(&token, &payload)).await?,
        };
        info!(
            id = %record.id,
            title = %record.title,
            created = record_id.is_none(),
            "Resume saved"
        );

        let summary = record.summary();
        let mut listing = lock(&self.listing);
        match listing.iter_mut().find(|row| row.id == summary.id) {
            Some(row) => *row = summary,
            None => listing.insert(0, summary),
        }
        Ok(record)
    }

    /// Saves the session's document and binds the session to the saved record.
    pub async fn save_session(&self, session: &mut EditingSession) -> Result<RemoteRecord, SyncError> {
        let record = self.save(&session.document, session.record_id.as_deref()).await?;
        session.record_id = Some(record.id.clone());
        Ok(record)
    }

    /// Fetches a record and decodes its content, defaulting whatever is missing.
    pub async fn load(&self, id: &str) -> Result<ResumeDocument, SyncError> {
        let token = self.token()?;
        let record = self.call(self.store.fetch(&token, id)).await?;
        let doc = decode_document(&record.content, &mut UuidIds);
        info!(id = %record.id, template = %doc.template(), "Resume loaded");
        Ok(doc)
    }

    /// Loads a record into a fresh editing session bound to it.
    pub async fn open(&self, id: &str) -> Result<EditingSession, SyncError> {
        let doc = self.load(id).await?;
        Ok(EditingSession::from_record(id, doc))
    }

    /// Optimistic delete with rollback on remote failure.
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let _slot = {
            let mut deleting = lock(&self.deleting);
            if !deleting.insert(id.to_string()) {
                warn!(%id, "Delete already in progress");
                return Err(SyncError::DeleteInProgress(id.to_string()));
            }
            DeleteSlot {
                deleting: &self.deleting,
                id: id.to_string(),
            }
        };

        let token = self.token()?;

        let removed = {
            let mut listing = lock(&self.listing);
            listing
                .iter()
                .position(|row| row.id == id)
                .map(|idx| (idx, listing.remove(idx)))
        };

        match self.call(self.store.delete(&token, id)).await {
            Ok(()) => {
                info!(%id, "Resume deleted");
                Ok(())
            }
            Err(e) => {
                if let Some((idx, row)) = removed {
                    let mut listing = lock(&self.listing);
                    if !listing.iter().any(|r| r.id == row.id) {
                        let idx = idx.min(listing.len());
                        listing.insert(idx, row);
                    }
                }
                error!(%id, "Delete failed, listing restored: {e}");
                Err(e)
            }
        }
    }
}
