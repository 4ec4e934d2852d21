//! HTTP client for the résumé backend.
//!
//! Endpoints, relative to the configured base URL:
//! ```text
//!   GET    /resumes        → listing
//!   GET    /resumes/{id}   → record
//!   POST   /resumes        → create
//!   PUT    /resumes/{id}   → update
//!   DELETE /resumes/{id}   → delete
//! ```
//!
//! No retries: a failed call surfaces its error to the sync layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::sync::store::{
    ListEnvelope, RecordEnvelope, RecordPayload, RemoteRecord, ResumeStore, ResumeSummary,
    StoreError,
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Value,
}

#[derive(Clone)]
pub struct HttpResumeStore {
    client: Client,
    base_url: String,
}

impl HttpResumeStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Remote store request");
        self.client.request(method, url).bearer_auth(token)
    }

    async fn send(&self, builder: RequestBuilder, id: Option<&str>) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match (status.as_u16(), id) {
            (401, _) => Err(StoreError::Unauthorized),
            (404, Some(id)) => Err(StoreError::NotFound(id.to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Api {
                    status: status.as_u16(),
                    message: error_message(&body, status),
                })
            }
        }
    }
}

/// Pulls the message out of `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn error_message(body: &str, status: StatusCode) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| match b.error {
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });
    match parsed {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

async fn read_record(response: Response) -> Result<RemoteRecord, StoreError> {
    let text = response.text().await?;
    serde_json::from_str::<RecordEnvelope>(&text)
        .map(RecordEnvelope::into_inner)
        .map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl ResumeStore for HttpResumeStore {
    async fn list(&self, token: &str) -> Result<Vec<ResumeSummary>, StoreError> {
        let response = self
            .send(self.request(Method::GET, "/resumes", token), None)
            .await?;
        let text = response.text().await?;
        serde_json::from_str::<ListEnvelope>(&text)
            .map(ListEnvelope::into_inner)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch(&self, token: &str, id: &str) -> Result<RemoteRecord, StoreError> {
        let path = format!("/resumes/{id}");
        let response = self
            .send(self.request(Method::GET, &path, token), Some(id))
            .await?;
        read_record(response).await
    }

    async fn create(
        &self,
        token: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, StoreError> {
        let response = self
            .send(self.request(Method::POST, "/resumes", token).json(payload), None)
            .await?;
        read_record(response).await
    }

    async fn update(
        &self,
        token: &str,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, StoreError> {
        let path = format!("/resumes/{id}");
        let response = self
            .send(self.request(Method::PUT, &path, token).json(payload), Some(id))
            .await?;
        // Some backends answer an update with only a status message.
        let text = response.text().await?;
        Ok(serde_json::from_str::<RecordEnvelope>(&text)
            .map(RecordEnvelope::into_inner)
            .unwrap_or_else(|_| RemoteRecord {
                id: id.to_string(),
                title: payload.title.clone(),
                content: payload.content.clone(),
                updated_at: None,
            }))
    }

    async fn delete(&self, token: &str, id: &str) -> Result<(), StoreError> {
        let path = format!("/resumes/{id}");
        self.send(self.request(Method::DELETE, &path, token), Some(id))
            .await?;
        Ok(())
    }
}
