//! Access to the analytics proxy that sits in front of the upstream provider.
//!
//! The proxy is an external collaborator. Everything here only shapes
//! requests and hands back decoded JSON; interpreting the payload is the
//! pipeline's job.

pub mod http;
pub mod probe;

pub use http::HttpBackend;
pub use probe::ConfigProbe;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::BackendHealth;

pub const CONFIG_PATH: &str = "/api/config";
pub const ANALYZE_PATH: &str = "/api/traffic/analyze";
pub const PLAUSIBLE_PROXY_PATH: &str = "/api/traffic/proxy/plausible";
pub const HEALTH_PATH: &str = "/api/traffic/health";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered with status {status}")]
    Status { path: String, status: u16 },
    #[error("{path} returned an undecodable body: {reason}")]
    Decode { path: String, reason: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A single POST the pipeline wants to make
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub path: &'static str,
    pub body: Value,
    /// Sent as the `Origin` header when present
    pub origin: Option<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/config`
    async fn fetch_readiness(&self) -> BackendResult<Value>;

    /// POST the request body and return the decoded JSON response
    async fn send(&self, request: &OutboundRequest) -> BackendResult<Value>;

    /// `GET /api/traffic/health`
    async fn health(&self) -> BackendResult<BackendHealth>;
}
