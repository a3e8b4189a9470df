//! Error types for the dashboard client.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`ApiClient`](super::ApiClient).
///
/// The `Display` text of each variant is what the user sees.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not connect to server. Make sure the admin API is running.")]
    Connection(#[source] reqwest::Error),

    #[error("Server endpoint not found.")]
    NotFound,

    #[error("Permission denied. Check authentication.")]
    Forbidden,

    #[error("Authentication required. Log in first.")]
    Unauthorized,

    #[error("Internal server error. Check server logs.")]
    Server,

    /// Any other 4xx, carrying the server's `error` message.
    #[error("{0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Please enter both username and password.")]
    MissingCredentials,

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}
