//! Read-side queries over the shared state. Each one takes its lock only
//! long enough to copy what it returns.

use crate::state::AppState;
use chrono::{DateTime, Utc};
use hostwatch_alert::Rule;
use hostwatch_common::types::{AlertEvent, Metric, MetricSnapshot};
use hostwatch_storage::{HistoryView, SeriesStats};
use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_EVENTS_LIMIT: usize = 50;

/// Latest values plus the full history window.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DataResponse {
    /// `null` until the first sample.
    pub latest: Option<MetricSnapshot>,
    pub history: HistoryView,
}

/// Window statistics per metric.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Snapshots currently held in the window.
    pub samples: usize,
    pub cpu: SeriesStats,
    pub mem: SeriesStats,
    pub disk: SeriesStats,
    pub net_recv: SeriesStats,
    pub net_sent: SeriesStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventsResponse {
    /// Newest first.
    pub items: Vec<AlertEvent>,
    /// Events currently buffered.
    pub total: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Init,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BufferUsage {
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Seconds since the last completed sample, `null` before the first one.
    pub sampler_last_age_sec: Option<f64>,
    pub uptime_sec: i64,
    pub events_buffer: BufferUsage,
}

pub fn data(state: &AppState) -> DataResponse {
    let history = state
        .history
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    DataResponse {
        latest: history.latest(),
        history: history.all(),
    }
}

pub fn stats(state: &AppState) -> StatsResponse {
    let history = state
        .history
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    StatsResponse {
        samples: history.len(),
        cpu: history.stats(Metric::Cpu),
        mem: history.stats(Metric::Mem),
        disk: history.stats(Metric::Disk),
        net_recv: history.stats(Metric::NetRecv),
        net_sent: history.stats(Metric::NetSent),
    }
}

/// Up to `limit` most recent events (default 50).
pub fn events(state: &AppState, limit: Option<usize>) -> EventsResponse {
    let limit = limit.unwrap_or(DEFAULT_EVENTS_LIMIT);
    let log = state
        .events
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    EventsResponse {
        items: log.recent(limit),
        total: log.size(),
        limit,
    }
}

pub fn health(state: &AppState) -> HealthReport {
    health_at(state, Utc::now())
}

/// Health as seen at `now`: `init` before the first sample, `ok` while the
/// last sample is younger than the staleness window, `degraded` after.
pub fn health_at(state: &AppState, now: DateTime<Utc>) -> HealthReport {
    let stale_after = state
        .config
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .sampler
        .stale_after_secs;

    let age = state
        .liveness
        .last_sample_at()
        .map(|at| (now - at).num_milliseconds() as f64 / 1000.0);
    let status = match age {
        None => HealthStatus::Init,
        Some(age) if age < stale_after => HealthStatus::Ok,
        Some(_) => HealthStatus::Degraded,
    };

    let events_buffer = {
        let log = state
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        BufferUsage {
            size: log.size(),
            capacity: log.capacity(),
        }
    };

    HealthReport {
        status,
        sampler_last_age_sec: age,
        uptime_sec: (now - state.start_time).num_seconds(),
        events_buffer,
    }
}

/// Active rule definitions, in evaluation order.
pub fn rules(state: &AppState) -> Vec<Rule> {
    state
        .rules
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .rules()
}
