use thiserror::Error;

use crate::backend::BackendError;

/// The single message users see for any failed analysis
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Could not retrieve data. Check that the domain is correct.";

/// Why an analysis failed. Only logged; users get [`GENERIC_FAILURE_MESSAGE`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("response did not match the expected shape: {0}")]
    Shape(String),
    #[error("response contained no result rows")]
    EmptyResults,
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Shape(e.to_string())
    }
}
