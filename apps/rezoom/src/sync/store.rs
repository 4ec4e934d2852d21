//! Remote store contract and its wire types.
//!
//! The backend wraps some responses (`{"resumes": [...]}`, `{"resume": {...}}`)
//! and spells model fields `ID` / `UpdatedAt`; both shapes are accepted.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::document::null_as_default;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Resume '{0}' not found")]
    NotFound(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// One row of the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSummary {
    #[serde(alias = "ID", deserialize_with = "wire_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        rename = "updatedAt",
        alias = "UpdatedAt",
        alias = "updated_at",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A persisted résumé with its opaque content blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    #[serde(alias = "ID", deserialize_with = "wire_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(
        rename = "updatedAt",
        alias = "UpdatedAt",
        alias = "updated_at",
        default,
        deserialize_with = "lenient_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteRecord {
    pub fn summary(&self) -> ResumeSummary {
        ResumeSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordPayload {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope {
    Wrapped {
        #[serde(default, deserialize_with = "null_as_default")]
        resumes: Vec<ResumeSummary>,
    },
    Bare(Vec<ResumeSummary>),
}

impl ListEnvelope {
    pub(crate) fn into_inner(self) -> Vec<ResumeSummary> {
        match self {
            ListEnvelope::Wrapped { resumes } => resumes,
            ListEnvelope::Bare(resumes) => resumes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordEnvelope {
    Wrapped { resume: RemoteRecord },
    Bare(RemoteRecord),
}

impl RecordEnvelope {
    pub(crate) fn into_inner(self) -> RemoteRecord {
        match self {
            RecordEnvelope::Wrapped { resume } => resume,
            RecordEnvelope::Bare(resume) => resume,
        }
    }
}

/// Ids arrive as strings or as numeric database keys.
fn wire_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// RFC 3339 timestamps; anything else is treated as unknown.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Store contract
// ────────────────────────────────────────────────────────────────────────────

/// The persistence backend. Every call carries the bearer credential.
/// Implementations do not retry.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn list(&self, token: &str) -> Result<Vec<ResumeSummary>, StoreError>;

    async fn fetch(&self, token: &str, id: &str) -> Result<RemoteRecord, StoreError>;

    async fn create(&self, token: &str, payload: &RecordPayload)
        -> Result<RemoteRecord, StoreError>;

    async fn update(
        &self,
        token: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, StoreError>;

    async fn delete(&self, token: &str, id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_accepts_wrapped_and_bare() {
        let wrapped = r#"{"resumes":[{"ID":7,"title":"A","UpdatedAt":"2024-03-01T10:00:00Z"}]}"#;
        let bare = r#"[{"id":"7","title":"A","updatedAt":"2024-03-01T10:00:00Z"}]"#;

        let a = serde_json::from_str::<ListEnvelope>(wrapped).unwrap().into_inner();
        let b = serde_json::from_str::<ListEnvelope>(bare).unwrap().into_inner();
        assert_eq!(a, b);
        assert_eq!(a[0].id, "7");
        assert!(a[0].updated_at.is_some());
    }

    #[test]
    fn test_null_resume_list_is_empty() {
        let list = serde_json::from_str::<ListEnvelope>(r#"{"resumes":null}"#)
            .unwrap()
            .into_inner();
        assert!(list.is_empty());
    }

    #[test]
    fn test_record_accepts_wrapped_and_bare() {
        let wrapped = r#"{"message":"Resume created successfully","resume":{"ID":3,"title":"T","content":"{}","user_id":1}}"#;
        let record = serde_json::from_str::<RecordEnvelope>(wrapped)
            .unwrap()
            .into_inner();
        assert_eq!(record.id, "3");
        assert_eq!(record.content, "{}");

        let bare = r#"{"id":"3","title":"T","content":null,"updatedAt":"not a date"}"#;
        let record = serde_json::from_str::<RecordEnvelope>(bare).unwrap().into_inner();
        assert_eq!(record.content, "");
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = ResumeSummary {
            id: "1".into(),
            title: "T".into(),
            updated_at: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("updatedAt").is_some());
    }
}
