use thiserror::Error;

use crate::export::ExportError;
use crate::model::DocumentError;
use crate::sync::{StoreError, SyncError};

/// Application-level error type.
/// Every operation boundary (save, load, delete, export, edit) converts into this
/// and the front end shows `user_message()`; internal detail goes to the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document file: {0}")]
    InvalidFile(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Sync(SyncError::Store(e))
    }
}

impl AppError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Document(DocumentError::IdCollision { .. }) => "ID_COLLISION",
            AppError::Document(_) => "VALIDATION_ERROR",
            AppError::Export(ExportError::ContentTooLarge { .. }) => "CONTENT_TOO_LARGE",
            AppError::Export(ExportError::Timeout(_)) => "EXPORT_TIMEOUT",
            AppError::Export(ExportError::Settings(_)) => "CONFIG_ERROR",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Sync(SyncError::Unauthenticated) => "UNAUTHORIZED",
            AppError::Sync(SyncError::DeleteInProgress(_)) => "DELETE_IN_PROGRESS",
            AppError::Sync(SyncError::Encode(_)) => "ENCODE_ERROR",
            AppError::Sync(SyncError::Store(StoreError::NotFound(_))) => "NOT_FOUND",
            AppError::Sync(SyncError::Store(StoreError::Unauthorized)) => "UNAUTHORIZED",
            AppError::Sync(SyncError::Store(StoreError::Timeout(_))) => "NETWORK_TIMEOUT",
            AppError::Sync(SyncError::Store(_)) => "NETWORK_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::InvalidFile(_) => "INVALID_FILE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the user. Logs internal detail where it is hidden.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Document(e) => e.to_string(),
            AppError::Export(ExportError::ContentTooLarge { .. }) => {
                "The resume is too long to export as an image-based PDF".to_string()
            }
            AppError::Export(ExportError::Timeout(d)) => {
                format!("Export took longer than {}s and was cancelled", d.as_secs())
            }
            AppError::Export(ExportError::Settings(msg)) => msg.clone(),
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                "The PDF could not be generated".to_string()
            }
            AppError::Sync(SyncError::Unauthenticated)
            | AppError::Sync(SyncError::Store(StoreError::Unauthorized)) => {
                "Please sign in again".to_string()
            }
            AppError::Sync(SyncError::DeleteInProgress(id)) => {
                format!("Resume {id} is already being deleted")
            }
            AppError::Sync(SyncError::Store(StoreError::NotFound(id))) => {
                format!("Resume {id} was not found")
            }
            AppError::Sync(SyncError::Store(StoreError::Api { message, .. })) => message.clone(),
            AppError::Sync(SyncError::Store(StoreError::Timeout(_))) => {
                "The server did not respond in time".to_string()
            }
            AppError::Sync(e) => {
                tracing::error!("Sync error: {e}");
                "Could not reach the resume server".to_string()
            }
            AppError::Io(e) => e.to_string(),
            AppError::InvalidFile(msg) => msg.clone(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal error occurred".to_string()
            }
        }
    }
}
