mod common;

use chrono::{Duration, Utc};
use common::{build_test_context, build_test_context_with, scripted_sampler, Reading, ScriptedSource};
use hostwatch_alert::{AlertSink, Comparator, Rule, RulesEngine, SinkError};
use hostwatch_common::types::{AlertEvent, Metric, Severity};
use hostwatch_server::config::ServerConfig;
use hostwatch_server::query::{self, HealthStatus};
use hostwatch_server::sampler::Sampler;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[test]
fn failed_read_degrades_to_absent() {
    let ctx = build_test_context().unwrap();
    let reading = Reading {
        disk: None,
        ..Reading::cpu(25.0)
    };
    let mut sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![reading]));

    let snapshot = sampler.tick(Utc::now());

    assert_eq!(snapshot.cpu, Some(25.0));
    assert_eq!(snapshot.disk, None);
    assert_eq!(snapshot.mem, Some(42.0));

    let history = ctx.state.history.lock().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.latest().unwrap(), snapshot);
}

#[test]
fn primed_sampler_reports_rates_on_first_tick() {
    let ctx = build_test_context().unwrap();
    let source = ScriptedSource::new(vec![Reading::cpu(1.0).with_net(1_125_000, 251_000)])
        .with_baseline(1_000, 1_000);
    let mut sampler = scripted_sampler(&ctx.state, source);
    let t0 = Utc::now();

    sampler.prime(t0);
    let snapshot = sampler.tick(t0 + Duration::seconds(1));

    assert!((snapshot.net_recv.unwrap() - 8.992).abs() < 1e-9);
    assert!((snapshot.net_sent.unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn unprimed_sampler_needs_one_tick_for_rates() {
    let ctx = build_test_context().unwrap();
    let source = ScriptedSource::new(vec![
        Reading::cpu(1.0).with_net(0, 0),
        Reading::cpu(1.0).with_net(125_000, 0),
    ]);
    let mut sampler = scripted_sampler(&ctx.state, source);
    let t0 = Utc::now();

    let first = sampler.tick(t0);
    let second = sampler.tick(t0 + Duration::seconds(1));

    assert_eq!(first.net_recv, None);
    assert!((second.net_recv.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(second.net_sent, Some(0.0));
}

#[test]
fn failed_counter_read_spans_the_gap() {
    let ctx = build_test_context().unwrap();
    let source = ScriptedSource::new(vec![
        Reading::cpu(1.0).without_net(),
        Reading::cpu(1.0).with_net(2_000_000, 0),
    ])
    .with_baseline(0, 0);
    let mut sampler = scripted_sampler(&ctx.state, source);
    let t0 = Utc::now();
    sampler.prime(t0);

    let failed = sampler.tick(t0 + Duration::seconds(1));
    let next = sampler.tick(t0 + Duration::seconds(2));

    assert_eq!(failed.net_recv, None);
    assert_eq!(failed.net_sent, None);
    assert!((next.net_recv.unwrap() - 8.0).abs() < 1e-9);
}

#[test]
fn counter_reset_yields_negative_rate() {
    let ctx = build_test_context().unwrap();
    let source = ScriptedSource::new(vec![Reading::cpu(1.0).with_net(0, 0)])
        .with_baseline(2_000_000, 0);
    let mut sampler = scripted_sampler(&ctx.state, source);
    let t0 = Utc::now();
    sampler.prime(t0);

    let snapshot = sampler.tick(t0 + Duration::seconds(2));

    assert!((snapshot.net_recv.unwrap() + 8.0).abs() < 1e-9);
}

#[test]
fn alert_carries_the_recorded_snapshot() {
    let config = ServerConfig {
        rules: vec![json!({"metric": "cpu", "threshold": 90, "consecutive": 2, "cooldown_sec": 10})],
        ..ServerConfig::default()
    };
    let ctx = build_test_context_with(config).unwrap();
    let mut sampler = scripted_sampler(
        &ctx.state,
        ScriptedSource::new(vec![Reading::cpu(95.0), Reading::cpu(96.0), Reading::cpu(97.0)]),
    );
    let t0 = Utc::now();

    sampler.tick(t0);
    assert_eq!(ctx.state.events.lock().unwrap().size(), 0);
    let snapshot = sampler.tick(t0 + Duration::seconds(1));
    sampler.tick(t0 + Duration::seconds(2));

    let events = ctx.state.events.lock().unwrap().recent(10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].metrics, snapshot);
    assert_eq!(events[0].rule.name, "cpu_rule");
    assert_eq!(events[0].timestamp, t0 + Duration::seconds(1));
}

#[test]
fn health_moves_from_init_to_ok_to_degraded() {
    let ctx = build_test_context().unwrap();
    let t0 = Utc::now();
    assert_eq!(query::health_at(&ctx.state, t0).status, HealthStatus::Init);

    let mut sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![Reading::cpu(5.0)]));
    sampler.tick(t0);

    let fresh = query::health_at(&ctx.state, t0 + Duration::milliseconds(500));
    assert_eq!(fresh.status, HealthStatus::Ok);
    assert_eq!(fresh.sampler_last_age_sec, Some(0.5));

    let boundary = query::health_at(&ctx.state, t0 + Duration::seconds(3));
    assert_eq!(boundary.status, HealthStatus::Degraded);

    let stale = query::health_at(&ctx.state, t0 + Duration::seconds(4));
    assert_eq!(stale.status, HealthStatus::Degraded);
    assert_eq!(stale.sampler_last_age_sec, Some(4.0));
}

#[tokio::test]
async fn run_stops_on_signal() {
    let ctx = build_test_context().unwrap();
    let sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![Reading::cpu(5.0)]));
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(sampler.run(stop_rx));
    tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    stop_tx.send(true).unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("sampler should stop")
        .unwrap();

    let ticks = ctx.state.history.lock().unwrap().len();
    assert!(ticks >= 1);
    assert!(ctx.state.liveness.last_sample_at().is_some());
}

#[tokio::test]
async fn run_stops_when_sender_dropped() {
    let ctx = build_test_context().unwrap();
    let sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![Reading::cpu(5.0)]));
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(sampler.run(stop_rx));
    drop(stop_tx);

    tokio::time::timeout(std::time::Duration::from_secs(2), handle)
        .await
        .expect("sampler should stop")
        .unwrap();
}

#[tokio::test]
async fn run_does_not_tick_when_already_stopped() {
    let ctx = build_test_context().unwrap();
    let sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![Reading::cpu(5.0)]));
    let (_stop_tx, stop_rx) = watch::channel(true);

    sampler.run(stop_rx).await;

    assert!(ctx.state.history.lock().unwrap().is_empty());
    assert_eq!(query::health_at(&ctx.state, Utc::now()).status, HealthStatus::Init);
}

#[tokio::test]
async fn first_run_tick_waits_one_period() {
    let ctx = build_test_context().unwrap();
    let period = std::time::Duration::from_millis(200);
    let source = ScriptedSource::new(vec![Reading::cpu(5.0).with_net(25_000, 0)]).with_baseline(0, 0);
    let mut sampler = Sampler::new(Box::new(source), ctx.state.clone(), period);
    let primed_at = Utc::now();
    sampler.prime(primed_at);
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(sampler.run(stop_rx));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(ctx.state.history.lock().unwrap().is_empty());

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    stop_tx.send(true).unwrap();
    handle.await.unwrap();

    let history = ctx.state.history.lock().unwrap().all();
    assert!(history.timestamps[0] - primed_at >= Duration::milliseconds(200));
    // 25 kB over at least 200 ms is at most 1 Mbps.
    assert!(history.net_recv[0].unwrap() <= 1.0);
}

/// Records whether the rules engine could be locked while publishing.
struct LockCheckingSink {
    rules: Arc<Mutex<RulesEngine>>,
    rules_free: Arc<Mutex<Vec<bool>>>,
}

impl AlertSink for LockCheckingSink {
    fn name(&self) -> &str {
        "lock-check"
    }

    fn publish(&self, _event: &AlertEvent) -> Result<(), SinkError> {
        let free = self.rules.try_lock().is_ok();
        self.rules_free.lock().unwrap().push(free);
        Ok(())
    }
}

#[test]
fn sinks_run_after_rules_lock_is_released() {
    let ctx = build_test_context().unwrap();
    let rules_free = Arc::new(Mutex::new(Vec::new()));
    let rule = Rule {
        name: "cpu_spike".to_string(),
        metric: Metric::Cpu,
        threshold: 80.0,
        comparator: Comparator::GreaterThan,
        severity: Severity::Critical,
        consecutive: 1,
        cooldown_sec: 0.0,
    };
    let sink = LockCheckingSink {
        rules: ctx.state.rules.clone(),
        rules_free: rules_free.clone(),
    };
    *ctx.state.rules.lock().unwrap() = RulesEngine::new(vec![rule], common::test_source(), Box::new(sink));

    let mut sampler = scripted_sampler(&ctx.state, ScriptedSource::new(vec![Reading::cpu(95.0)]));
    sampler.tick(Utc::now());

    assert_eq!(*rules_free.lock().unwrap(), vec![true]);
}
