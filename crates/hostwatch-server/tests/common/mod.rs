#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use hostwatch_collector::{CollectError, MetricSource, NetCounters, RawSample};
use hostwatch_common::types::EventSource;
use hostwatch_server::app;
use hostwatch_server::config::ServerConfig;
use hostwatch_server::sampler::Sampler;
use hostwatch_server::state::AppState;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
    pub state: AppState,
    pub app: axum::Router,
}

pub fn test_source() -> EventSource {
    EventSource {
        service: "hostwatch-test".to_string(),
        host: "test-host".to_string(),
        pid: 4321,
    }
}

/// Context with the built-in default configuration. The config path points
/// at a file that does not exist yet.
pub fn build_test_context() -> Result<TestContext> {
    build_test_context_with(ServerConfig::default())
}

pub fn build_test_context_with(config: ServerConfig) -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let config_path = temp_dir.path().join("hostwatch.toml");
    let state = AppState::new(config, Some(config_path.clone()), test_source());
    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        config_path,
        state,
        app,
    })
}

/// One scripted tick. `None` makes the matching read fail.
#[derive(Debug, Clone, Default)]
pub struct Reading {
    pub cpu: Option<f64>,
    pub mem: Option<f64>,
    pub disk: Option<f64>,
    pub net: Option<(u64, u64)>,
}

impl Reading {
    pub fn cpu(value: f64) -> Self {
        Self {
            cpu: Some(value),
            mem: Some(42.0),
            disk: Some(61.5),
            net: Some((0, 0)),
        }
    }

    pub fn with_net(mut self, recv: u64, sent: u64) -> Self {
        self.net = Some((recv, sent));
        self
    }

    pub fn without_net(mut self) -> Self {
        self.net = None;
        self
    }
}

/// Replays readings in order; the last one repeats once the script runs out.
pub struct ScriptedSource {
    readings: VecDeque<Reading>,
    last: Reading,
    baseline: Option<(u64, u64)>,
}

impl ScriptedSource {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self {
            readings: readings.into(),
            last: Reading::default(),
            baseline: None,
        }
    }

    pub fn with_baseline(mut self, recv: u64, sent: u64) -> Self {
        self.baseline = Some((recv, sent));
        self
    }
}

fn unavailable(metric: &'static str) -> CollectError {
    CollectError::Unavailable {
        metric,
        reason: "scripted failure".to_string(),
    }
}

impl MetricSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sample(&mut self) -> RawSample {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        let r = &self.last;
        RawSample {
            cpu: r.cpu.ok_or_else(|| unavailable("cpu")),
            mem: r.mem.ok_or_else(|| unavailable("mem")),
            disk: r.disk.ok_or_else(|| unavailable("disk")),
            net: r
                .net
                .map(|(recv_bytes, sent_bytes)| NetCounters {
                    recv_bytes,
                    sent_bytes,
                })
                .ok_or_else(|| unavailable("net")),
        }
    }

    fn net_counters(&mut self) -> hostwatch_collector::Result<NetCounters> {
        self.baseline
            .map(|(recv_bytes, sent_bytes)| NetCounters {
                recv_bytes,
                sent_bytes,
            })
            .ok_or_else(|| unavailable("net"))
    }
}

pub fn scripted_sampler(state: &AppState, source: ScriptedSource) -> Sampler {
    Sampler::new(Box::new(source), state.clone(), Duration::from_millis(10))
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let req_body = body.unwrap_or(Value::Null).to_string();
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(req_body))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, req).await
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub fn assert_ok_envelope(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::OK, "unexpected status, body: {body}");
    assert_eq!(body["err_code"], 0, "unexpected envelope: {body}");
    assert_eq!(body["err_msg"], "success");
}
