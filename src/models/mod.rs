pub mod analysis;
pub mod readiness;

pub use analysis::{
    AnalysisRequest, AnalyzeDetails, AnalyzeResponse, Count, MetricValue, MetricsBlock, PlausibleQuery,
    PlausibleResponse, TrafficSource, ViewModel, DEFAULT_DATE_RANGE, PLAUSIBLE_METRICS,
};
pub use readiness::{BackendHealth, ReadinessFlags};
