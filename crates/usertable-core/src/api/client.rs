//! HTTP client for the user service.
//!
//! Talks to three endpoints: `GET /user/all`, `PUT /user/{id}` and
//! `DELETE /user/{id}`, all exchanging JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApiError, RemoteStore};
use crate::models::{DeleteResponse, FieldPatch, RemoteUser, UserResponse, UsersResponse};

/// HTTP client for the user service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the service rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "User service returned an error status");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn fetch_all(&self) -> Result<Vec<RemoteUser>, ApiError> {
        let url = self.url("user/all");
        debug!(url = %url, "Fetching users");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body: UsersResponse = Self::parse(response, &url).await?;
        Ok(body.users)
    }

    async fn update(&self, remote_id: i64, patch: &FieldPatch) -> Result<RemoteUser, ApiError> {
        let url = self.url(&format!("user/{}", remote_id));
        debug!(url = %url, "Updating user");

        let response = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .json(patch)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body: UserResponse = Self::parse(response, &url).await?;
        Ok(body.user)
    }

    async fn delete(&self, remote_id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self.url(&format!("user/{}", remote_id));
        debug!(url = %url, "Deleting user");

        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        Self::parse(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8080/api/", Duration::from_secs(5))
            .expect("Failed to build test client")
    }

    #[test]
    fn test_url_joining() {
        let api = client();
        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(api.url("user/all"), "http://localhost:8080/api/user/all");
        assert_eq!(api.url("/user/7"), "http://localhost:8080/api/user/7");
    }

    #[test]
    fn test_auth_headers() {
        let api = client();
        assert!(api.auth_headers().unwrap().is_empty());

        let api = api.with_token("abc".to_string());
        let headers = api.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");

        let mut api = client();
        api.set_token("bad\ntoken".to_string());
        assert!(matches!(api.auth_headers(), Err(ApiError::InvalidToken)));
    }
}
