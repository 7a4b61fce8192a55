//! Request shaping and response mapping for each backend variant

use serde_json::Value;

use super::error::AnalysisError;
use crate::backend::{OutboundRequest, ANALYZE_PATH, PLAUSIBLE_PROXY_PATH};
use crate::config::{BackendConfig, BackendVariant};
use crate::models::{AnalysisRequest, AnalyzeResponse, PlausibleQuery, PlausibleResponse, ViewModel};

pub trait AnalysisEndpoint: Send + Sync {
    fn build_request(&self, domain: &str) -> OutboundRequest;

    fn map_response(&self, domain: &str, raw: Value) -> Result<ViewModel, AnalysisError>;
}

/// Generic analyze endpoint: `{domain}` in, nested metrics and details out
pub struct AnalyzeEndpoint;

impl AnalysisEndpoint for AnalyzeEndpoint {
    fn build_request(&self, domain: &str) -> OutboundRequest {
        let body = AnalysisRequest {
            domain: domain.to_string(),
        };
        OutboundRequest {
            path: ANALYZE_PATH,
            body: serde_json::json!(body),
            origin: None,
        }
    }

    fn map_response(&self, _domain: &str, raw: Value) -> Result<ViewModel, AnalysisError> {
        let response: AnalyzeResponse = serde_json::from_value(raw)?;
        Ok(response.into())
    }
}

/// Plausible proxy: upstream-shaped query, `results` array back
pub struct PlausibleEndpoint {
    origin: String,
    data_source_label: String,
}

impl PlausibleEndpoint {
    pub fn new(origin: impl Into<String>, data_source_label: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data_source_label: data_source_label.into(),
        }
    }
}

impl AnalysisEndpoint for PlausibleEndpoint {
    fn build_request(&self, domain: &str) -> OutboundRequest {
        OutboundRequest {
            path: PLAUSIBLE_PROXY_PATH,
            body: serde_json::json!(PlausibleQuery::for_site(domain)),
            origin: Some(self.origin.clone()),
        }
    }

    fn map_response(&self, domain: &str, raw: Value) -> Result<ViewModel, AnalysisError> {
        let response: PlausibleResponse = serde_json::from_value(raw)?;
        response
            .into_view_model(domain, &self.data_source_label)
            .ok_or(AnalysisError::EmptyResults)
    }
}

/// Pick the endpoint strategy for the configured variant
pub fn endpoint_for(backend: &BackendConfig, data_source_label: &str) -> Box<dyn AnalysisEndpoint> {
    match backend.variant {
        BackendVariant::Analyze => Box::new(AnalyzeEndpoint),
        BackendVariant::Plausible => Box::new(PlausibleEndpoint::new(
            backend.page_origin.clone(),
            data_source_label,
        )),
    }
}
