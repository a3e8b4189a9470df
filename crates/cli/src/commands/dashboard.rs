//! Dashboard client commands.
//!
//! # Usage
//!
//! ```bash
//! metra-cli dashboard login -u alice -p 'a long passphrase'
//! export METRA_API_TOKEN=...
//! metra-cli dashboard overview --days 7
//! metra-cli dashboard requests
//! metra-cli dashboard analytics
//! metra-cli dashboard upload build.zip --update-type security --version 2.1.0
//! ```
//!
//! # Environment Variables
//!
//! - `METRA_API_URL` - admin API address (default: `http://localhost:8080`)
//! - `METRA_API_TOKEN` - token printed by `login`

use std::path::Path;

use chrono::Utc;
use secrecy::ExposeSecret;

use metra_cli::client::UploadDetails;
use metra_cli::{ApiClient, ClientError, render};
use metra_core::UpdateType;

/// Log in and return the token line to print.
///
/// # Errors
///
/// Returns the client's error for missing or rejected credentials.
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<String, ClientError> {
    let token = client.login(username, password).await?;
    tracing::info!(username, "Logged in");
    Ok(format!("export METRA_API_TOKEN={}", token.expose_secret()))
}

/// # Errors
///
/// Returns the client's error if the sales report cannot be fetched.
pub async fn overview(client: &ApiClient, days: i64) -> Result<String, ClientError> {
    let report = client.sales(days).await?;
    Ok(render::overview(&report))
}

/// # Errors
///
/// Returns the client's error if requests cannot be fetched.
pub async fn requests(client: &ApiClient) -> Result<String, ClientError> {
    let requests = client.requests().await?;
    if requests.is_empty() {
        return Ok("No customer requests.\n".to_owned());
    }
    Ok(render::requests_table(&requests))
}

/// # Errors
///
/// Returns the client's error if analytics cannot be fetched.
pub async fn analytics(client: &ApiClient) -> Result<String, ClientError> {
    let analytics = client.analytics().await?;
    if analytics.is_empty() {
        return Ok("No product analytics yet.\n".to_owned());
    }
    Ok(render::analytics_table(&analytics))
}

/// Options for [`upload`]; blank title or description get defaults.
pub struct UploadArgs<'a> {
    pub file: &'a Path,
    pub title: Option<String>,
    pub update_type: UpdateType,
    pub description: Option<String>,
    pub version: String,
}

/// # Errors
///
/// Returns `ClientError::MissingFile` before any request if the file does
/// not exist, or the server's error.
pub async fn upload(client: &ApiClient, args: UploadArgs<'_>) -> Result<String, ClientError> {
    let details = UploadDetails {
        title: args
            .title
            .unwrap_or_else(|| format!("Update {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))),
        update_type: args.update_type,
        description: args
            .description
            .unwrap_or_else(|| "System update uploaded via admin dashboard".to_owned()),
        version: args.version,
    };

    let update = client.upload(args.file, &details).await?;
    tracing::info!(id = %update.id, file = %update.file, "Update uploaded");
    Ok(format!(
        "File uploaded successfully! Update #{} \"{}\" (version {})\n",
        update.id, update.title, update.version
    ))
}
