//! HTTP client for the storefront REST API.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode, Url};
use tracing::debug;

use super::{ApiError, RemoteSource};
use crate::entity::Entity;

/// HTTP request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for a storefront backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client rooted at `base_url`, e.g. `https://shop.example.com/api/`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// `{base}/{collection}` or `{base}/{collection}/{id}`, with `id` percent-encoded.
    fn url(&self, collection: &str, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<reqwest::Response, ApiError> {
        debug!(method = %method, url = %url, "Sending request");
        let mut request = self.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        let response = request.send().await?;
        debug!(method = %method, url = %url, status = response.status().as_u16(), "Received response");
        Self::check_response(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response, url: &Url) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    fn encode<E: Entity>(entity: &E) -> Result<String, ApiError> {
        serde_json::to_string(entity)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode {}: {}", E::COLLECTION, e)))
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        let url = self.url(E::COLLECTION, None)?;
        let response = self.send(Method::GET, url.clone(), None).await?;
        Self::decode(response, &url).await
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, ApiError> {
        let url = self.url(E::COLLECTION, Some(id))?;
        match self.send(Method::GET, url.clone(), None).await {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => Ok(None),
            Ok(response) => Self::decode(response, &url).await.map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        let url = self.url(E::COLLECTION, None)?;
        self.send(Method::POST, url, Some(Self::encode(entity)?)).await?;
        Ok(())
    }

    async fn replace<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        let url = self.url(E::COLLECTION, Some(entity.id()))?;
        self.send(Method::PUT, url, Some(Self::encode(entity)?)).await?;
        Ok(())
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(E::COLLECTION, Some(id))?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }
}
