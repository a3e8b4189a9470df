//! HTTP client for the Metra admin API.
//!
//! Wraps `reqwest` with token authentication and maps every failure to a
//! [`ClientError`] whose message can be shown to the user as is. Use
//! [`ApiClient::new`] with the URL of a running admin API, or a mock
//! server's URI in tests.

mod error;
mod types;

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

pub use error::ClientError;
pub use types::{
    ProductAnalytics, RequestSummary, SalesReport, TopProduct, UploadDetails, UploadedUpdate,
};
use types::{ErrorBody, TokenResponse};

/// Admin API address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Client for the admin REST API.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` is not an http(s)
    /// URL, or [`ClientError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url.to_owned()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("metra-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_owned(),
            token,
        })
    }

    /// Use `token` for subsequent requests.
    pub fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, endpoint: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and classify the outcome.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::Connection(e)
            } else {
                ClientError::Request(e)
            }
        })?;

        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "Admin API response");

        match status {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            s if s.is_client_error() => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .map_or_else(|_| s.to_string(), |body| body.error);
                Err(ClientError::Api(message))
            }
            _ => Err(ClientError::Server),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let response = self
            .send(self.request(reqwest::Method::GET, endpoint))
            .await?;
        response.json().await.map_err(ClientError::Decode)
    }

    /// Exchange credentials for an API token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingCredentials`] without sending anything
    /// if either field is blank, [`ClientError::Api`] with the server's
    /// message for bad credentials, or any transport error.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SecretString, ClientError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self
            .send(self.request(reqwest::Method::POST, "/api/token/").json(&body))
            .await?;
        let token: TokenResponse = response.json().await.map_err(ClientError::Decode)?;
        Ok(SecretString::from(token.token))
    }

    /// Sales report for the trailing `days`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] for transport failures or error statuses.
    pub async fn sales(&self, days: i64) -> Result<SalesReport, ClientError> {
        self.get_json(&format!("/api/dashboard/sales/?days={days}"))
            .await
    }

    /// All customer requests.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] for transport failures or error statuses.
    pub async fn requests(&self) -> Result<Vec<RequestSummary>, ClientError> {
        self.get_json("/api/dashboard/requests/").await
    }

    /// All product analytics rows.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] for transport failures or error statuses.
    pub async fn analytics(&self) -> Result<Vec<ProductAnalytics>, ClientError> {
        self.get_json("/api/dashboard/analytics/").await
    }

    /// Upload an update file with its details.
    ///
    /// The file is read before anything is sent, so a missing file never
    /// reaches the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingFile`] if `path` does not exist,
    /// [`ClientError::File`] if it cannot be read, or a transport error.
    pub async fn upload(
        &self,
        path: &Path,
        details: &UploadDetails,
    ) -> Result<UploadedUpdate, ClientError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::MissingFile(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());

        let form = Form::new()
            .text("title", details.title.clone())
            .text("update_type", details.update_type.as_str())
            .text("description", details.description.clone())
            .text("version", details.version.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .send(
                self.request(reqwest::Method::POST, "/api/dashboard/updates/")
                    .multipart(form),
            )
            .await?;
        response.json().await.map_err(ClientError::Decode)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/api/token/"), "http://localhost:8080/api/token/");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let err = ApiClient::new("localhost:8080", None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client =
            ApiClient::new(DEFAULT_API_URL, Some(SecretString::from("abc123".to_owned()))).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("[REDACTED]"));
    }
}
