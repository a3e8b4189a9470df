//! Uploaded update packages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use metra_core::{UpdateId, UpdateType, UserId};

/// A stored update with its uploader's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Update {
    pub id: UpdateId,
    pub title: String,
    pub update_type: UpdateType,
    pub description: String,
    pub file: String,
    pub version: String,
    pub uploaded_by: Option<UserId>,
    pub uploaded_by_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Fields of an update taken from the multipart form.
#[derive(Debug, Clone)]
pub struct NewUpdate {
    pub title: String,
    pub update_type: UpdateType,
    pub description: String,
    pub version: String,
    /// Path relative to the upload directory.
    pub file: String,
    pub uploaded_by: UserId,
}
