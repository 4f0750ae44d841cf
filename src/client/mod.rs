//! Backend REST Client
//!
//! A configured `reqwest` client with a base address and a request
//! interceptor that attaches `Authorization: Bearer <token>` whenever the
//! token source holds a token. The token is read on every call, so a login or
//! logout takes effect on the next request without any propagation.
//!
//! No retry, no backoff; a timeout only when configured.

mod endpoints;
mod error;

pub use error::{ApiError, ApiResult, FieldMessage};

use crate::config::ApiConfig;
use crate::models::ListEnvelope;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Supplies the bearer token for outgoing requests
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token source for anonymous calls (registration, reference data)
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Backend REST API client
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    prefix: String,
    list_limit: u32,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a new client for the configured backend
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        let mut builder = Client::builder().user_agent(concat!("capstone/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.normalized_base_url(),
            prefix: config.normalized_prefix(),
            list_limit: config.list_limit,
            tokens,
        })
    }

    /// Backend address without the path prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API prefix
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}{}/{}", self.base_url, self.prefix, path)
    }

    /// Start a request with the bearer token and a request id attached
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header("X-Request-Id", &request_id);

        if let Some(token) = self.tokens.bearer_token() {
            builder = builder.bearer_auth(token);
        }

        (builder, request_id)
    }

    /// Send a request and decode the response body
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        request_id: &str,
        method: &Method,
        path: &str,
    ) -> ApiResult<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(request_id, %method, path, error = %e, "request failed without response");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(request_id, %method, path, status = status.as_u16(), "response received");

        let body = response.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (builder, request_id) = self.request(Method::GET, path);
        self.send(builder, &request_id, &Method::GET, path).await
    }

    /// GET a collection, accepting both a bare array and a `{data: [...]}` body
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let (builder, request_id) = self.request(Method::GET, path);
        let builder = builder.query(&[("limit", self.list_limit)]);
        let envelope: ListEnvelope<T> = self.send(builder, &request_id, &Method::GET, path).await?;
        Ok(envelope.into_vec())
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let (builder, request_id) = self.request(Method::POST, path);
        self.send(builder.json(body), &request_id, &Method::POST, path).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let (builder, request_id) = self.request(Method::PATCH, path);
        self.send(builder.json(body), &request_id, &Method::PATCH, path).await
    }

    /// PATCH a multipart form (file uploads)
    pub async fn patch_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<T> {
        let (builder, request_id) = self.request(Method::PATCH, path);
        self.send(builder.multipart(form), &request_id, &Method::PATCH, path).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let (builder, request_id) = self.request(Method::DELETE, path);
        let _: serde_json::Value = self.send(builder, &request_id, &Method::DELETE, path).await?;
        Ok(())
    }
}
