use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{RecommendRequest, ResultPayload};

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// The recommendation server as seen from the view.
#[async_trait]
pub trait RecommendationApi: Send + Sync {
    async fn recommend(&self, request: &RecommendRequest) -> Result<ResultPayload, RecommendError>;
}

#[derive(Clone)]
pub struct RecommendClient {
    http: Client,
    base_url: String,
}

impl RecommendClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // No timeout: the view stays in Loading for as long as the server takes.
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("unable to construct http client")?;

        Ok(Self::with_client(http, config.api_base_url()))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> Result<Url, RecommendError> {
        Url::parse(&format!("{}/recommend", self.base_url))
            .map_err(|err| RecommendError::InvalidEndpoint(err.to_string()))
    }
}

#[async_trait]
impl RecommendationApi for RecommendClient {
    async fn recommend(&self, request: &RecommendRequest) -> Result<ResultPayload, RecommendError> {
        let url = self.endpoint()?;

        let response = self.http.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| RecommendError::Parse(err.to_string()))
    }
}
