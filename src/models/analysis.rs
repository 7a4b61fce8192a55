use serde::{de, Deserialize, Deserializer, Serialize};

/// Metrics requested from the upstream provider, in display order
pub const PLAUSIBLE_METRICS: [&str; 4] = ["visitors", "pageviews", "bounce_rate", "visit_duration"];

pub const DEFAULT_DATE_RANGE: &str = "30d";

/// Body of `POST /api/traffic/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub domain: String,
}

/// Body of `POST /api/traffic/proxy/plausible`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlausibleQuery {
    pub site_id: String,
    pub metrics: Vec<String>,
    pub date_range: String,
}

impl PlausibleQuery {
    pub fn for_site(site_id: &str) -> Self {
        Self {
            site_id: site_id.to_string(),
            metrics: PLAUSIBLE_METRICS.iter().map(|m| m.to_string()).collect(),
            date_range: DEFAULT_DATE_RANGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue<T> {
    pub value: T,
}

/// A whole-number metric that accepts any JSON number.
///
/// Backends may send `1000.0` for `1000`; fractional parts are dropped and
/// negatives saturate to zero. Anything that is not a number is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Count(pub u64);

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        if let Some(value) = number.as_u64() {
            return Ok(Count(value));
        }
        match number.as_f64() {
            Some(value) if value.is_finite() => Ok(Count(value as u64)),
            _ => Err(de::Error::custom(format!("{number} is not a usable count"))),
        }
    }
}

/// The four headline metrics, shared by both response shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBlock {
    pub visitors: MetricValue<Count>,
    pub pageviews: MetricValue<Count>,
    pub bounce_rate: MetricValue<f64>,
    pub visit_duration: MetricValue<Count>,
}

/// One traffic channel; the backend may report shares with decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSource {
    pub channel: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeDetails {
    pub data_source: String,
    pub traffic_sources: Vec<TrafficSource>,
}

/// Response of the generic analyze endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub domain: String,
    pub metrics: MetricsBlock,
    pub details: AnalyzeDetails,
}

/// Response of the plausible proxy; only the first row is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlausibleResponse {
    pub results: Vec<MetricsBlock>,
}

/// Flattened, display-ready result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub domain: String,
    pub visitors: u64,
    pub pageviews: u64,
    /// Fraction in [0, 1] as reported by the backend
    pub bounce_rate: f64,
    /// Whole seconds
    pub visit_duration: u64,
    pub data_source: String,
    pub traffic_sources: Vec<TrafficSource>,
}

impl ViewModel {
    fn from_metrics(
        domain: String,
        metrics: MetricsBlock,
        data_source: String,
        traffic_sources: Vec<TrafficSource>,
    ) -> Self {
        Self {
            domain,
            visitors: metrics.visitors.value.0,
            pageviews: metrics.pageviews.value.0,
            bounce_rate: metrics.bounce_rate.value,
            visit_duration: metrics.visit_duration.value.0,
            data_source,
            traffic_sources,
        }
    }
}

impl From<AnalyzeResponse> for ViewModel {
    fn from(response: AnalyzeResponse) -> Self {
        Self::from_metrics(
            response.domain,
            response.metrics,
            response.details.data_source,
            response.details.traffic_sources,
        )
    }
}

impl PlausibleResponse {
    /// Returns `None` when the provider sent an empty `results` array.
    pub fn into_view_model(self, domain: &str, data_source: &str) -> Option<ViewModel> {
        let first = self.results.into_iter().next()?;
        Some(ViewModel::from_metrics(
            domain.to_string(),
            first,
            data_source.to_string(),
            Vec::new(),
        ))
    }
}
