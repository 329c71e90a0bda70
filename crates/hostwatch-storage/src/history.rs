use chrono::{DateTime, Utc};
use hostwatch_common::types::{Metric, MetricSnapshot};
use serde::Serialize;
use std::collections::VecDeque;
use utoipa::ToSchema;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Aggregates over one metric window. `avg` and `max` are absent when the
/// window holds no present value.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeriesStats {
    pub count: usize,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// Copy of every window, oldest first. All vectors have the same length.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryView {
    pub timestamps: Vec<DateTime<Utc>>,
    pub cpu: Vec<Option<f64>>,
    pub mem: Vec<Option<f64>>,
    pub disk: Vec<Option<f64>>,
    pub net_recv: Vec<Option<f64>>,
    pub net_sent: Vec<Option<f64>>,
}

impl HistoryView {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn series(&self, metric: Metric) -> &[Option<f64>] {
        match metric {
            Metric::Cpu => &self.cpu,
            Metric::Mem => &self.mem,
            Metric::Disk => &self.disk,
            Metric::NetRecv => &self.net_recv,
            Metric::NetSent => &self.net_sent,
        }
    }
}

/// Fixed-capacity rolling history of snapshots.
///
/// Each snapshot is split into one slot per metric plus a timestamp slot,
/// and every window is pushed and evicted together, so all windows always
/// have the same length.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use hostwatch_common::types::{Metric, MetricSnapshot};
/// use hostwatch_storage::HistoryStore;
///
/// let mut store = HistoryStore::new(2);
/// for cpu in [10.0, 20.0, 30.0] {
///     let mut snap = MetricSnapshot::empty(Utc::now());
///     snap.cpu = Some(cpu);
///     store.append(&snap);
/// }
/// assert_eq!(store.len(), 2);
/// assert_eq!(store.all().cpu, vec![Some(20.0), Some(30.0)]);
/// assert_eq!(store.stats(Metric::Cpu).max, Some(30.0));
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore {
    capacity: usize,
    timestamps: VecDeque<DateTime<Utc>>,
    series: [VecDeque<Option<f64>>; 5],
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// Creates an empty store. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            timestamps: VecDeque::with_capacity(capacity),
            series: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Records one snapshot, evicting the oldest one when full.
    pub fn append(&mut self, snapshot: &MetricSnapshot) {
        if self.timestamps.len() == self.capacity {
            self.timestamps.pop_front();
            for window in &mut self.series {
                window.pop_front();
            }
        }
        self.timestamps.push_back(snapshot.timestamp);
        for metric in Metric::ALL {
            self.series[metric.index()].push_back(snapshot.get(metric));
        }
    }

    /// Most recent snapshot, or `None` before the first append.
    pub fn latest(&self) -> Option<MetricSnapshot> {
        let timestamp = *self.timestamps.back()?;
        let mut snapshot = MetricSnapshot::empty(timestamp);
        for metric in Metric::ALL {
            let value = self.series[metric.index()].back().copied().flatten();
            snapshot.set(metric, value);
        }
        Some(snapshot)
    }

    pub fn all(&self) -> HistoryView {
        let copy = |metric: Metric| -> Vec<Option<f64>> {
            self.series[metric.index()].iter().copied().collect()
        };
        HistoryView {
            timestamps: self.timestamps.iter().copied().collect(),
            cpu: copy(Metric::Cpu),
            mem: copy(Metric::Mem),
            disk: copy(Metric::Disk),
            net_recv: copy(Metric::NetRecv),
            net_sent: copy(Metric::NetSent),
        }
    }

    /// Count, mean and maximum of the present values in one window.
    pub fn stats(&self, metric: Metric) -> SeriesStats {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max: Option<f64> = None;
        for value in self.series[metric.index()].iter().flatten() {
            count += 1;
            sum += value;
            max = Some(match max {
                Some(m) => m.max(*value),
                None => *value,
            });
        }
        SeriesStats {
            count,
            avg: (count > 0).then(|| sum / count as f64),
            max,
        }
    }
}
