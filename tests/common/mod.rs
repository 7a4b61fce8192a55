//! Shared helpers for the integration tests: an in-memory backend and the
//! canonical `example.com` response.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use traffic_lens::backend::{Backend, BackendError, BackendResult, OutboundRequest};
use traffic_lens::config::{ProbeFailurePolicy, ReadinessConfig};
use traffic_lens::models::BackendHealth;

/// Response body for `example.com` in the analyze-endpoint shape
pub fn example_analyze_body() -> Value {
    json!({
        "domain": "example.com",
        "metrics": {
            "visitors": {"value": 1000},
            "pageviews": {"value": 2500},
            "bounce_rate": {"value": 0.42},
            "visit_duration": {"value": 95}
        },
        "details": {
            "data_source": "X",
            "traffic_sources": [{"channel": "Direct", "value": 600}]
        }
    })
}

pub fn example_plausible_body() -> Value {
    json!({
        "results": [{
            "visitors": {"value": 321},
            "pageviews": {"value": 1234},
            "bounce_rate": {"value": 0.5},
            "visit_duration": {"value": 125}
        }]
    })
}

pub fn no_gate() -> ReadinessConfig {
    ReadinessConfig {
        gate: false,
        on_probe_failure: ProbeFailurePolicy::Allow,
    }
}

pub fn gate(on_probe_failure: ProbeFailurePolicy) -> ReadinessConfig {
    ReadinessConfig {
        gate: true,
        on_probe_failure,
    }
}

/// What the fake answers to an analysis POST
pub enum Reply {
    Json(Value),
    Status(u16),
}

/// In-memory backend that records every request it receives
pub struct FakeBackend {
    reply: Mutex<Reply>,
    readiness: Option<Value>,
    hold: Option<Arc<Notify>>,
    sent: Mutex<Vec<OutboundRequest>>,
    probes: AtomicUsize,
}

impl FakeBackend {
    pub fn replying(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            readiness: None,
            hold: None,
            sent: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::replying(Reply::Json(body))
    }

    /// Answer the readiness probe with this body (otherwise the probe fails)
    pub fn with_readiness(mut self, body: Value) -> Self {
        self.readiness = Some(body);
        self
    }

    /// Park every analysis request until `release` is notified
    pub fn held(mut self, release: Arc<Notify>) -> Self {
        self.hold = Some(release);
        self
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_readiness(&self) -> BackendResult<Value> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.readiness.clone().ok_or_else(|| BackendError::Status {
            path: "/api/config".to_string(),
            status: 503,
        })
    }

    async fn send(&self, request: &OutboundRequest) -> BackendResult<Value> {
        self.sent.lock().unwrap().push(request.clone());

        if let Some(ref release) = self.hold {
            release.notified().await;
        }

        match &*self.reply.lock().unwrap() {
            Reply::Json(body) => Ok(body.clone()),
            Reply::Status(status) => Err(BackendError::Status {
                path: request.path.to_string(),
                status: *status,
            }),
        }
    }

    async fn health(&self) -> BackendResult<BackendHealth> {
        Ok(BackendHealth {
            status: "healthy".to_string(),
            timestamp: None,
            version: Some("test".to_string()),
            similarweb_api_configured: Some(false),
        })
    }
}

/// Poll `condition` until it holds, failing the test after about two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition was not reached in time");
}
