use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub api_server: ServerConfig,
    pub readiness: ReadinessConfig,
    pub analysis: AnalysisConfig,
    pub frontend: FrontendConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the analytics proxy, without a trailing slash
    pub base_url: String,
    pub variant: BackendVariant,
    /// Value sent as the `Origin` header to the plausible proxy
    pub page_origin: String,
}

/// Which backend endpoint (and response shape) the pipeline talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendVariant {
    /// `POST /api/traffic/analyze`, nested metrics plus traffic sources
    Analyze,
    /// `POST /api/traffic/proxy/plausible`, upstream-shaped `results` array
    Plausible,
}

impl BackendVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "analyze" | "a" => Some(Self::Analyze),
            "plausible" | "proxy" | "b" => Some(Self::Plausible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeFailurePolicy {
    /// Leave the trigger enabled when the probe never answered
    Allow,
    /// Keep the trigger disabled until a successful probe says the key is set
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Whether the readiness flag gates the analyze action at all
    pub gate: bool,
    pub on_probe_failure: ProbeFailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Label shown as the data source when the backend does not report one
    pub data_source_label: String,
    pub normalize_domain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Path to directory containing static frontend files
    /// If None, uses embedded assets
    pub static_dir: Option<String>,
}

/// One analyzer is kept per browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Drop a session's analyzer after this long without a request
    pub idle_timeout_secs: u64,
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            max_sessions: 10_000,
        }
    }
}

impl AnalysisConfig {
    pub const DEFAULT_DATA_SOURCE_LABEL: &'static str = "Plausible Analytics";
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_source_label: Self::DEFAULT_DATA_SOURCE_LABEL.to_string(),
            normalize_domain: false,
        }
    }
}

impl ReadinessConfig {
    /// Only the plausible variant checks the upstream key before submitting.
    pub fn default_for(variant: BackendVariant) -> Self {
        Self {
            gate: matches!(variant, BackendVariant::Plausible),
            on_probe_failure: ProbeFailurePolicy::Allow,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("TRAFFIC_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
            .trim_end_matches('/')
            .to_string();

        let variant = match std::env::var("TRAFFIC_BACKEND_VARIANT") {
            Ok(raw) => BackendVariant::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown TRAFFIC_BACKEND_VARIANT '{raw}', falling back to 'analyze'. Supported values: analyze, plausible"
                );
                BackendVariant::Analyze
            }),
            Err(_) => BackendVariant::Analyze,
        };

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let page_origin = std::env::var("TRAFFIC_PAGE_ORIGIN")
            .unwrap_or_else(|_| format!("http://{api_host}:{api_port}"));

        let mut readiness = ReadinessConfig::default_for(variant);
        if let Ok(raw) = std::env::var("TRAFFIC_READINESS_GATE") {
            readiness.gate = parse_bool(&raw);
        }
        if let Ok(raw) = std::env::var("TRAFFIC_READINESS_ON_PROBE_FAILURE") {
            readiness.on_probe_failure = match raw.to_lowercase().as_str() {
                "allow" => ProbeFailurePolicy::Allow,
                "block" => ProbeFailurePolicy::Block,
                other => {
                    tracing::warn!(
                        "Unknown TRAFFIC_READINESS_ON_PROBE_FAILURE '{other}', falling back to 'allow'. Supported values: allow, block"
                    );
                    ProbeFailurePolicy::Allow
                }
            };
        }

        let data_source_label = std::env::var("TRAFFIC_DATA_SOURCE_LABEL")
            .unwrap_or_else(|_| AnalysisConfig::DEFAULT_DATA_SOURCE_LABEL.to_string());
        let normalize_domain = std::env::var("TRAFFIC_NORMALIZE_DOMAIN")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let frontend_static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();

        let session_defaults = SessionConfig::default();
        let idle_timeout_secs = std::env::var("SESSION_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(session_defaults.idle_timeout_secs);
        let max_sessions = std::env::var("SESSION_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(session_defaults.max_sessions);

        Ok(Config {
            backend: BackendConfig {
                base_url,
                variant,
                page_origin,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            readiness,
            analysis: AnalysisConfig {
                data_source_label,
                normalize_domain,
            },
            frontend: FrontendConfig {
                static_dir: frontend_static_dir,
            },
            session: SessionConfig {
                idle_timeout_secs,
                max_sessions,
            },
        })
    }
}
