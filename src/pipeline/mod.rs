//! Domain analysis pipeline
//!
//! [`Analyzer`] is the page's single UI component. It owns the view state
//! for the lifetime of the page and walks every submission through
//! validate → request → success/failure:
//!
//! - empty input never leaves the component,
//! - a submission while one is in flight (or while the readiness gate is
//!   closed) is ignored, the same as clicking a disabled button,
//! - entering the loading state clears the previous result and error,
//! - every failure collapses to [`GENERIC_FAILURE_MESSAGE`].

pub mod domain;
pub mod endpoint;
pub mod error;
pub mod format;

pub use endpoint::{endpoint_for, AnalysisEndpoint, AnalyzeEndpoint, PlausibleEndpoint};
pub use error::{AnalysisError, GENERIC_FAILURE_MESSAGE};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::backend::{Backend, ConfigProbe};
use crate::config::{Config, ProbeFailurePolicy, ReadinessConfig};
use crate::models::{ReadinessFlags, ViewModel};

/// What the page shows below the form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum ViewState {
    Idle,
    Loading,
    Failed(String),
    Ready(ViewModel),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn result(&self) -> Option<&ViewModel> {
        match self {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyDomain,
    InFlight,
    NotReady,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The submission never reached the backend; state is unchanged
    Ignored(IgnoreReason),
    Succeeded(ViewModel),
    Failed(&'static str),
}

/// Point-in-time copy of the component, for rendering
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub domain: String,
    pub view: ViewState,
    pub trigger_enabled: bool,
    pub readiness: Option<ReadinessFlags>,
}

struct ViewInner {
    domain: String,
    state: ViewState,
}

pub struct Analyzer {
    backend: Arc<dyn Backend>,
    endpoint: Box<dyn AnalysisEndpoint>,
    readiness_config: ReadinessConfig,
    normalize_domain: bool,
    probe_started: AtomicBool,
    /// Set once by the probe; the inner `None` records a failed probe
    readiness: OnceLock<Option<ReadinessFlags>>,
    view: Mutex<ViewInner>,
}

impl Analyzer {
    pub fn new(
        backend: Arc<dyn Backend>,
        endpoint: Box<dyn AnalysisEndpoint>,
        readiness_config: ReadinessConfig,
        normalize_domain: bool,
    ) -> Self {
        Self {
            backend,
            endpoint,
            readiness_config,
            normalize_domain,
            probe_started: AtomicBool::new(false),
            readiness: OnceLock::new(),
            view: Mutex::new(ViewInner {
                domain: String::new(),
                state: ViewState::Idle,
            }),
        }
    }

    pub fn from_config(config: &Config, backend: Arc<dyn Backend>) -> Self {
        let endpoint = endpoint_for(&config.backend, &config.analysis.data_source_label);
        Self::new(
            backend,
            endpoint,
            config.readiness.clone(),
            config.analysis.normalize_domain,
        )
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewInner> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run the readiness probe. Only the first call does anything.
    pub async fn probe_readiness(&self) {
        if self.probe_started.swap(true, Ordering::SeqCst) {
            debug!("Readiness probe already ran, skipping");
            return;
        }

        let flags = ConfigProbe::new(Arc::clone(&self.backend)).run().await;
        let _ = self.readiness.set(flags);
    }

    pub fn readiness(&self) -> Option<ReadinessFlags> {
        self.readiness.get().copied().flatten()
    }

    fn gate_open(&self) -> bool {
        if !self.readiness_config.gate {
            return true;
        }

        match self.readiness() {
            Some(flags) => flags.plausible_api_key_configured,
            None => matches!(
                self.readiness_config.on_probe_failure,
                ProbeFailurePolicy::Allow
            ),
        }
    }

    /// Whether this component gates on the readiness flag, and so wants a probe
    pub fn needs_probe(&self) -> bool {
        self.readiness_config.gate
    }

    fn trigger_enabled_for(&self, view: &ViewInner) -> bool {
        !view.state.is_loading() && self.gate_open()
    }

    /// Whether the analyze button is currently enabled
    pub fn trigger_enabled(&self) -> bool {
        let view = self.lock_view();
        self.trigger_enabled_for(&view)
    }

    pub fn snapshot(&self) -> Snapshot {
        let view = self.lock_view();
        Snapshot {
            domain: view.domain.clone(),
            view: view.state.clone(),
            trigger_enabled: self.trigger_enabled_for(&view),
            readiness: self.readiness(),
        }
    }

    pub async fn submit(&self, raw_domain: &str) -> SubmitOutcome {
        let Some(input) = domain::validate(raw_domain) else {
            debug!("Ignoring submission with empty domain");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyDomain);
        };

        let site = if self.normalize_domain {
            domain::normalize(input)
        } else {
            input.to_string()
        };
        if site.is_empty() {
            debug!("Ignoring submission that normalized to an empty domain");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyDomain);
        }

        {
            let mut view = self.lock_view();
            if view.state.is_loading() {
                debug!(domain = %site, "Analysis already in flight, ignoring submission");
                return SubmitOutcome::Ignored(IgnoreReason::InFlight);
            }
            if !self.gate_open() {
                debug!(domain = %site, "Upstream key not configured, ignoring submission");
                return SubmitOutcome::Ignored(IgnoreReason::NotReady);
            }
            view.domain = input.to_string();
            view.state = ViewState::Loading;
        }

        info!(domain = %site, "Analyzing domain");
        let result = self.request(&site).await;

        let mut view = self.lock_view();
        match result {
            Ok(model) => {
                view.state = ViewState::Ready(model.clone());
                SubmitOutcome::Succeeded(model)
            }
            Err(e) => {
                error!(domain = %site, "Analysis failed: {}", e);
                let message = e.user_message();
                view.state = ViewState::Failed(message.to_string());
                SubmitOutcome::Failed(message)
            }
        }
    }

    async fn request(&self, site: &str) -> Result<ViewModel, AnalysisError> {
        let request = self.endpoint.build_request(site);
        let raw = self.backend.send(&request).await?;
        self.endpoint.map_response(site, raw)
    }
}
