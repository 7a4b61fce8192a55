//! Per-visitor page sessions
//!
//! Every browser gets its own [`Analyzer`], found through a random id kept in
//! a cookie. Ids the server never issued are not adopted; the visitor gets a
//! fresh session instead.

use axum::http::{header, HeaderMap};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::SessionConfig;
use crate::pipeline::Analyzer;

pub const SESSION_COOKIE: &str = "traffic_lens_session";

/// Builds the analyzer for a new session
pub type AnalyzerFactory = Arc<dyn Fn() -> Analyzer + Send + Sync>;

pub struct Sessions {
    analyzers: Cache<String, Arc<Analyzer>>,
    factory: AnalyzerFactory,
}

impl Sessions {
    pub fn new(factory: AnalyzerFactory, config: &SessionConfig) -> Self {
        let analyzers = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(Duration::from_secs(config.idle_timeout_secs))
            .build();

        Self { analyzers, factory }
    }

    /// Find the caller's analyzer, or start a new session for it.
    ///
    /// A new session runs its readiness probe before returning, so the first
    /// page it renders already reflects the gate.
    pub async fn resolve(&self, headers: &HeaderMap) -> (String, Arc<Analyzer>) {
        if let Some(id) = session_id(headers) {
            if let Some(analyzer) = self.analyzers.get(&id).await {
                return (id, analyzer);
            }
            debug!("Unknown or expired session, starting a new one");
        }

        let id = new_session_id();
        let analyzer = Arc::new((self.factory)());
        if analyzer.needs_probe() {
            analyzer.probe_readiness().await;
        }
        self.analyzers.insert(id.clone(), Arc::clone(&analyzer)).await;
        debug!("Started page session");

        (id, analyzer)
    }
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Value for the `Set-Cookie` header that pins a browser to its session
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, id)| id.to_string())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_id_is_read_from_any_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; traffic_lens_session=abc123; b=2"),
        );
        assert_eq!(session_id(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_cookie_has_no_session() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("traffic_lens_session="));
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn new_ids_are_unique_hex() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn cookie_is_scoped_to_the_site() {
        assert_eq!(
            session_cookie("abc"),
            "traffic_lens_session=abc; Path=/; HttpOnly; SameSite=Lax"
        );
    }
}
