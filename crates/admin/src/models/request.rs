//! Customer requests (support, returns, inquiries, complaints).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use metra_core::analytics::response_time_hours;
use metra_core::{CustomerRequestId, RequestStatus, RequestType, UserId};

/// A request joined with the user who raised it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRequest {
    pub id: CustomerRequestId,
    pub user_id: UserId,
    pub username: String,
    pub user_email: String,
    pub request_type: RequestType,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// JSON view of a request. `response_time` is set once completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRequestView {
    pub id: CustomerRequestId,
    pub user: UserId,
    pub username: String,
    pub user_email: String,
    pub request_type: RequestType,
    pub subject: String,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub response_time: Option<Decimal>,
}

impl From<CustomerRequest> for CustomerRequestView {
    fn from(request: CustomerRequest) -> Self {
        let response_time = (request.status == RequestStatus::Completed)
            .then(|| response_time_hours(request.created_at, request.updated_at));
        Self {
            id: request.id,
            user: request.user_id,
            username: request.username,
            user_email: request.user_email,
            request_type: request.request_type,
            subject: request.subject,
            message: request.message,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
            response_time,
        }
    }
}

/// Body of `POST`/`PUT /api/dashboard/requests/`. `user` defaults to the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestPayload {
    #[serde(default)]
    pub user: Option<UserId>,
    pub request_type: RequestType,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub status: RequestStatus,
}

impl RequestPayload {
    /// # Errors
    ///
    /// Returns a user-facing message for a blank subject or message.
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err("Subject is required.".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("Message is required.".to_string());
        }
        Ok(())
    }
}

/// Body of `PATCH /api/dashboard/requests/{id}/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestPatch {
    pub user: Option<UserId>,
    pub request_type: Option<RequestType>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: Option<RequestStatus>,
}

impl RequestPatch {
    #[must_use]
    pub fn apply(self, current: CustomerRequestView) -> RequestPayload {
        RequestPayload {
            user: Some(self.user.unwrap_or(current.user)),
            request_type: self.request_type.unwrap_or(current.request_type),
            subject: self.subject.unwrap_or(current.subject),
            message: self.message.unwrap_or(current.message),
            status: self.status.unwrap_or(current.status),
        }
    }
}
