// Sync layer: content-blob codec, auth capability, remote store client, and the
// layer that keeps the in-memory listing consistent with the store.

pub mod auth;
pub mod codec;
pub mod http;
pub mod layer;
pub mod store;

pub use auth::{AuthProvider, StaticTokenProvider};
pub use codec::{decode_document, encode_document, record_title, UNTITLED};
pub use http::HttpResumeStore;
pub use layer::{SyncError, SyncLayer};
pub use store::{RecordPayload, RemoteRecord, ResumeStore, ResumeSummary, StoreError};
