use serde::{Deserialize, Serialize};

/// Body of `GET /api/config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessFlags {
    pub plausible_api_key_configured: bool,
}

/// Body of the backend's `GET /api/traffic/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub similarweb_api_configured: Option<bool>,
}
