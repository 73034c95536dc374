//! HTTP client for the SIGESDA backend.
//!
//! Provides a small client with bearer-token auth, generic JSON helpers that
//! turn backend failures into [`AppError`], and an implementation of
//! [`sigesda_core::ReservationSource`] over the reservation and room
//! collections (see [`api`]). The CLI uses this client directly.

pub mod api;

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sigesda_core::{AppError, AppResult, Config};
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// No credentials, for local development backends
    Anonymous,
}

impl Auth {
    fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) => Auth::Bearer(token),
            None => Auth::Anonymous,
        }
    }
}

/// HTTP client for the SIGESDA API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, api_version: &str, auth: Auth, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: format!("/api/{}", api_version),
            auth,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.api_url.clone(),
            &config.api_version,
            Auth::from_token(config.api_token.clone()),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Create client from environment: SIGESDA_API_URL (or API_URL),
    /// SIGESDA_API_TOKEN, SIGESDA_API_VERSION, SIGESDA_HTTP_TIMEOUT_SECS.
    pub fn from_env() -> AppResult<Self> {
        let config = Config::from_env().map_err(|e| AppError::Configuration(e.to_string()))?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API version prefix, e.g. "/api/v1"
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Anonymous => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .context("Failed to send request")?;

        let response = check_status(response).await?;
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        serde_json::from_str(&text).map_err(|e| {
            AppError::Internal(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let url = self.build_url(path);
        tracing::debug!(%url, "GET");
        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send(request).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.build_url(path);
        tracing::debug!(%url, "POST");
        self.send(self.client.post(&url).json(body)).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.build_url(path);
        tracing::debug!(%url, "PUT");
        self.send(self.client.put(&url).json(body)).await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.build_url(path);
        tracing::debug!(%url, "PATCH");
        self.send(self.client.patch(&url).json(body)).await
    }
}

/// Map a non-2xx response to an [`AppError`], keeping the body as message.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    tracing::warn!(status = status.as_u16(), %url, "API request failed");

    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("{}: {}", url, error_text)));
    }

    Err(AppError::Api {
        status: status.as_u16(),
        message: error_text,
    })
}
