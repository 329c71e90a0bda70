use crate::state::AppState;
use chrono::{DateTime, Utc};
use hostwatch_collector::rate::RateCalculator;
use hostwatch_alert::engine;
use hostwatch_collector::{CollectError, MetricSource};
use hostwatch_common::types::{Metric, MetricSnapshot};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic driver: reads the source, derives network rates, records the
/// snapshot, then runs the rules against it.
///
/// Only one sampler may run per [`AppState`]; it is the single writer of
/// the history store and the liveness timestamp.
pub struct Sampler {
    source: Box<dyn MetricSource>,
    state: AppState,
    period: Duration,
    recv: RateCalculator,
    sent: RateCalculator,
}

impl Sampler {
    pub fn new(source: Box<dyn MetricSource>, state: AppState, period: Duration) -> Self {
        Self {
            source,
            state,
            period,
            recv: RateCalculator::new(),
            sent: RateCalculator::new(),
        }
    }

    /// Reads the network counters once so the first tick already reports
    /// rates. Without it the first tick's rates are absent.
    pub fn prime(&mut self, now: DateTime<Utc>) {
        match self.source.net_counters() {
            Ok(counters) => {
                self.recv = RateCalculator::with_baseline(counters.recv_bytes, now);
                self.sent = RateCalculator::with_baseline(counters.sent_bytes, now);
            }
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "Failed to read initial network counters");
            }
        }
    }

    /// Runs one tick at `now` and returns the recorded snapshot.
    pub fn tick(&mut self, now: DateTime<Utc>) -> MetricSnapshot {
        let raw = self.source.sample();
        let mut snapshot = MetricSnapshot::empty(now);
        snapshot.cpu = self.reading(Metric::Cpu, raw.cpu);
        snapshot.mem = self.reading(Metric::Mem, raw.mem);
        snapshot.disk = self.reading(Metric::Disk, raw.disk);

        match raw.net {
            Ok(counters) => {
                snapshot.net_recv = rate(&mut self.recv, Metric::NetRecv, counters.recv_bytes, now);
                snapshot.net_sent = rate(&mut self.sent, Metric::NetSent, counters.sent_bytes, now);
            }
            // Keep the previous counters; the next good read spans the gap.
            Err(e) => {
                tracing::warn!(source = self.source.name(), error = %e, "Network counter read failed");
            }
        }

        self.state
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .append(&snapshot);
        self.state.liveness.record(now);

        // Rules lock covers the state machines only; sinks take the events
        // lock after it is released.
        let (fired, sink) = {
            let mut rules = self
                .state
                .rules
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            (rules.check(&snapshot), rules.sink())
        };
        let published = engine::publish(sink.as_ref(), &fired);
        if published > 0 {
            tracing::debug!(published, "Alert events published");
        }

        snapshot
    }

    /// Ticks every period until `stop` turns true or its sender is dropped.
    /// The first tick comes one full period after the call, so rates and
    /// CPU usage of a primed sampler span a whole interval. A tick in
    /// progress always completes.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut tick = interval_at(Instant::now() + self.period, self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            source = self.source.name(),
            interval_ms = self.period.as_millis() as u64,
            "Starting sampling loop"
        );

        if *stop.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.tick(Utc::now());
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Sampling loop stopped");
    }

    fn reading(&self, metric: Metric, value: Result<f64, CollectError>) -> Option<f64> {
        match value {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(source = self.source.name(), metric = %metric, error = %e, "Metric read failed");
                None
            }
        }
    }
}

fn rate(calc: &mut RateCalculator, metric: Metric, bytes: u64, now: DateTime<Utc>) -> Option<f64> {
    let mbps = calc.update(bytes, now)?;
    if mbps < 0.0 {
        tracing::warn!(metric = %metric, mbps, "Negative rate, byte counter went backwards");
    }
    Some(mbps)
}
