//! Response bodies the client reads from the admin API.
//!
//! Only the fields the terminal views use are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use metra_core::{
    AnalyticsId, CustomerRequestId, RequestStatus, RequestType, Trend, UpdateId, UpdateType,
};

pub use metra_admin::models::{SalesReport, TopProduct};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// One row of `GET /api/dashboard/requests/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestSummary {
    pub id: CustomerRequestId,
    pub username: String,
    pub request_type: RequestType,
    pub subject: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub response_time: Option<Decimal>,
}

/// One row of `GET /api/dashboard/analytics/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductAnalytics {
    pub id: AnalyticsId,
    pub product_name: String,
    pub category: String,
    pub views: i64,
    pub cart_additions: i64,
    pub purchases: i64,
    pub conversion_rate: Decimal,
    pub trend: Trend,
    pub performance_score: Decimal,
}

/// Text fields sent with an update upload.
#[derive(Debug, Clone)]
pub struct UploadDetails {
    pub title: String,
    pub update_type: UpdateType,
    pub description: String,
    pub version: String,
}

/// The record created by an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedUpdate {
    pub id: UpdateId,
    pub title: String,
    pub version: String,
    pub file: String,
}
