//! Users as seen by the admin API.

use serde::Serialize;

use metra_core::UserId;

/// The caller resolved from an API token.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StaffUser {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
}

/// Public fields of a newly registered admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
}
