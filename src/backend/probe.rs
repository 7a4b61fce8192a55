use std::sync::Arc;

use tracing::{info, warn};

use super::Backend;
use crate::models::ReadinessFlags;

/// One-shot readiness check against `GET /api/config`
pub struct ConfigProbe {
    backend: Arc<dyn Backend>,
}

impl ConfigProbe {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Ask the backend whether the upstream key is configured.
    ///
    /// Failures are logged and reported as `None`; nothing is retried.
    pub async fn run(&self) -> Option<ReadinessFlags> {
        let raw = match self.backend.fetch_readiness().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Readiness probe failed: {}", e);
                return None;
            }
        };

        match serde_json::from_value::<ReadinessFlags>(raw) {
            Ok(flags) => {
                info!(
                    plausible_api_key_configured = flags.plausible_api_key_configured,
                    "Readiness probe completed"
                );
                Some(flags)
            }
            Err(e) => {
                warn!("Readiness probe returned an unexpected body: {}", e);
                None
            }
        }
    }
}
