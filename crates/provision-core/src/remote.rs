//! The seam between the orchestrator and the remote workspace platform.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("request timed out")]
    Timeout,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RemoteError {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Timeout => "timeout",
            RemoteError::Unauthorized(_) => "unauthorized",
            RemoteError::NotFound(_) => "not_found",
            RemoteError::RateLimited { .. } => "rate_limited",
            RemoteError::Rejected(_) => "rejected",
            RemoteError::Internal(_) => "internal",
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who the remote platform thinks we are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

/// Create one database-equivalent collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RecordParent {
    Database(RemoteId),
    Page(RemoteId),
}

/// Create one page, either a record inside a database or a free page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordParent>,
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Paragraphs of body text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchObject {
    Database,
    Page,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<SearchObject>,
}

// ---------------------------------------------------------------------------
// RemoteApi
// ---------------------------------------------------------------------------

/// Operations the orchestrator needs from the platform. Each call owns its
/// own timeout.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn identity_probe(&self) -> Result<Identity, RemoteError>;

    async fn create_resource(&self, request: &DatabaseRequest) -> Result<RemoteId, RemoteError>;

    async fn create_record(&self, request: &RecordRequest) -> Result<RemoteId, RemoteError>;

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<RemoteId>, RemoteError>;
}
