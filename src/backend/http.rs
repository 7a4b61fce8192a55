use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::ORIGIN, Client, Response};
use serde_json::Value;
use tracing::debug;

use super::{Backend, BackendError, BackendResult, OutboundRequest, CONFIG_PATH, HEALTH_PATH};
use crate::models::BackendHealth;

/// reqwest-backed client for the analytics proxy.
///
/// No request timeout is configured: a proxy that never answers leaves the
/// caller waiting, the same way the page's loading state would.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("traffic-lens/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client for the analytics backend")?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        path: &str,
        response: Response,
    ) -> BackendResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| BackendError::Transport {
            path: path.to_string(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        debug!("GET {}", self.url(path));
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                path: path.to_string(),
                source,
            })?;

        Self::decode(path, response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_readiness(&self) -> BackendResult<Value> {
        self.get(CONFIG_PATH).await
    }

    async fn send(&self, request: &OutboundRequest) -> BackendResult<Value> {
        debug!("POST {}", self.url(request.path));
        let mut builder = self.client.post(self.url(request.path)).json(&request.body);
        if let Some(ref origin) = request.origin {
            builder = builder.header(ORIGIN, origin);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                path: request.path.to_string(),
                source,
            })?;

        Self::decode(request.path, response).await
    }

    async fn health(&self) -> BackendResult<BackendHealth> {
        self.get(HEALTH_PATH).await
    }
}
