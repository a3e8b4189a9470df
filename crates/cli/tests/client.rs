//! `ApiClient` against a `wiremock` server.
//!
//! Each test stands up its own mock admin API, so no real server or
//! database is needed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metra_cli::client::UploadDetails;
use metra_cli::{ApiClient, ClientError};
use metra_core::{RequestStatus, RequestType, Trend, UpdateType};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(
        &server.uri(),
        Some(SecretString::from("test-token".to_owned())),
    )
    .expect("failed to build test ApiClient")
}

async fn mount_status(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/dashboard/requests/"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({"username": "alice", "password": "hunter22hunter"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let token = client.login("alice", "hunter22hunter").await.unwrap();

    assert_eq!(token.expose_secret(), "abc123");
}

#[tokio::test]
async fn login_with_blank_fields_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let err = client.login("  ", "secret").await.unwrap_err();

    assert!(matches!(err, ClientError::MissingCredentials));
}

#[tokio::test]
async fn login_surfaces_server_message_for_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "Unable to log in with provided credentials."})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let err = client.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Unable to log in with provided credentials.");
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_is_distinct() {
    let server = MockServer::start().await;
    mount_status(&server, 404, json!({"error": "Not found"})).await;

    let err = client(&server).requests().await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
    assert_eq!(err.to_string(), "Server endpoint not found.");
}

#[tokio::test]
async fn forbidden_is_distinct() {
    let server = MockServer::start().await;
    mount_status(&server, 403, json!({"error": "Forbidden"})).await;

    let err = client(&server).requests().await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden));
    assert_eq!(err.to_string(), "Permission denied. Check authentication.");
}

#[tokio::test]
async fn unauthorized_asks_for_login() {
    let server = MockServer::start().await;
    mount_status(&server, 401, json!({"error": "Invalid token."})).await;

    let err = client(&server).requests().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert_eq!(err.to_string(), "Authentication required. Log in first.");
}

#[tokio::test]
async fn internal_error_is_distinct() {
    let server = MockServer::start().await;
    mount_status(&server, 500, json!({"error": "Internal server error"})).await;

    let err = client(&server).requests().await.unwrap_err();
    assert!(matches!(err, ClientError::Server));
    assert_eq!(err.to_string(), "Internal server error. Check server logs.");
}

#[tokio::test]
async fn other_client_errors_carry_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/sales/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "days must be an integer"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).sales(30).await.unwrap_err();
    assert_eq!(err.to_string(), "days must be an integer");
}

#[tokio::test]
async fn connection_failure_is_reported() {
    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");

    let client = ApiClient::new(&uri, None).unwrap();
    let err = client.requests().await.unwrap_err();

    assert!(matches!(err, ClientError::Connection(_)), "got {err:?}");
    assert_eq!(
        err.to_string(),
        "Could not connect to server. Make sure the admin API is running."
    );
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sales_sends_token_and_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/sales/"))
        .and(query_param("days", "7"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_sales": "150.00",
            "orders_count": 3,
            "average_order_value": "50.00",
            "period": "Last 7 days",
            "sales_by_category": {"Audio": "150.00", "Cables": "0"},
            "top_products": [{"name": "Headphones", "sales": 2, "revenue": "150.00"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server).sales(7).await.unwrap();

    assert_eq!(report.total_sales, Decimal::new(15000, 2));
    assert_eq!(report.orders_count, 3);
    assert_eq!(report.sales_by_category.len(), 2);
    assert_eq!(report.top_products[0].name, "Headphones");
}

#[tokio::test]
async fn requests_parse_enums_and_response_time() {
    let server = MockServer::start().await;
    mount_status(
        &server,
        200,
        json!([{
            "id": 4,
            "user": 2,
            "username": "bob",
            "user_email": "bob@example.com",
            "request_type": "return",
            "subject": "Wrong size",
            "message": "Please swap for a medium",
            "status": "completed",
            "created_at": "2026-03-01T10:00:00Z",
            "updated_at": "2026-03-01T13:00:00Z",
            "response_time": "3.00"
        }]),
    )
    .await;

    let requests = client(&server).requests().await.unwrap();

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_type, RequestType::Return);
    assert_eq!(requests[0].status, RequestStatus::Completed);
    assert_eq!(requests[0].response_time, Some(Decimal::new(300, 2)));
}

#[tokio::test]
async fn analytics_parse_computed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/analytics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "product": 9,
            "product_name": "Headphones",
            "category": "Audio",
            "views": 200,
            "cart_additions": 40,
            "purchases": 10,
            "conversion_rate": "5.00",
            "trend": "increasing",
            "performance_score": "28.0",
            "last_updated": "2026-03-01T10:00:00Z"
        }])))
        .mount(&server)
        .await;

    let analytics = client(&server).analytics().await.unwrap();

    assert_eq!(analytics[0].conversion_rate, Decimal::new(5, 0));
    assert_eq!(analytics[0].trend, Trend::Increasing);
    assert_eq!(analytics[0].performance_score, Decimal::new(28, 0));
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

fn details() -> UploadDetails {
    UploadDetails {
        title: "Spring release".to_owned(),
        update_type: UpdateType::Product,
        description: "New catalog".to_owned(),
        version: "1.2.0".to_owned(),
    }
}

#[tokio::test]
async fn upload_of_missing_file_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let missing = std::env::temp_dir().join("metra-cli-test-does-not-exist.zip");
    let err = client(&server)
        .upload(&missing, &details())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MissingFile(_)));
    assert!(err.to_string().starts_with("File not found:"));
}

#[tokio::test]
async fn upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dashboard/updates/"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("Spring release"))
        .and(body_string_contains("filename=\"release.zip\""))
        .and(body_string_contains("PK-payload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "title": "Spring release",
            "update_type": "product",
            "description": "New catalog",
            "file": "0f3c_release.zip",
            "version": "1.2.0",
            "uploaded_by": 1,
            "uploaded_by_username": "alice",
            "created_at": "2026-03-01T10:00:00Z",
            "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join(format!("metra-cli-upload-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("release.zip");
    std::fs::write(&file, b"PK-payload").unwrap();

    let update = client(&server).upload(&file, &details()).await.unwrap();

    assert_eq!(update.title, "Spring release");
    assert_eq!(update.file, "0f3c_release.zip");
    std::fs::remove_dir_all(&dir).unwrap();
}
