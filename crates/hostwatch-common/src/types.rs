use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Event type tag carried by every threshold alert.
pub const EVENT_TYPE_METRIC_THRESHOLD: &str = "metric_threshold";

/// Version of the alert event contract.
pub const EVENT_VERSION: &str = "v1";

/// A sampled host metric series.
///
/// # Examples
///
/// ```
/// use hostwatch_common::types::Metric;
///
/// let metric: Metric = "net_recv".parse().unwrap();
/// assert_eq!(metric, Metric::NetRecv);
/// assert_eq!(metric.to_string(), "net_recv");
/// assert!("gpu".parse::<Metric>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpu,
    Mem,
    Disk,
    NetRecv,
    NetSent,
}

impl Metric {
    /// All series, in the order they are stored and reported.
    pub const ALL: [Metric; 5] = [
        Metric::Cpu,
        Metric::Mem,
        Metric::Disk,
        Metric::NetRecv,
        Metric::NetSent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Mem => "mem",
            Metric::Disk => "disk",
            Metric::NetRecv => "net_recv",
            Metric::NetSent => "net_sent",
        }
    }

    /// Position of this series in [`Metric::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Metric::Cpu => 0,
            Metric::Mem => 1,
            Metric::Disk => 2,
            Metric::NetRecv => 3,
            Metric::NetSent => 4,
        }
    }

    /// Unit the series is expressed in.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Cpu | Metric::Mem | Metric::Disk => "%",
            Metric::NetRecv | Metric::NetSent => "Mbps",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Metric::Cpu),
            "mem" | "memory" => Ok(Metric::Mem),
            "disk" => Ok(Metric::Disk),
            "net_recv" => Ok(Metric::NetRecv),
            "net_sent" => Ok(Metric::NetSent),
            _ => Err(format!("unknown metric: {s}")),
        }
    }
}

/// Readings produced by a single sampler tick.
///
/// Percentages for `cpu`/`mem`/`disk`, megabits per second for the network
/// rates. A metric that could not be read in this tick is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: Option<f64>,
    pub mem: Option<f64>,
    pub disk: Option<f64>,
    pub net_recv: Option<f64>,
    pub net_sent: Option<f64>,
}

impl MetricSnapshot {
    /// A snapshot with every metric absent.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu: None,
            mem: None,
            disk: None,
            net_recv: None,
            net_sent: None,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Mem => self.mem,
            Metric::Disk => self.disk,
            Metric::NetRecv => self.net_recv,
            Metric::NetSent => self.net_sent,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Cpu => self.cpu = value,
            Metric::Mem => self.mem = value,
            Metric::Disk => self.disk = value,
            Metric::NetRecv => self.net_recv = value,
            Metric::NetSent => self.net_sent = value,
        }
    }
}

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use hostwatch_common::types::Severity;
///
/// let sev: Severity = "critical".parse().unwrap();
/// assert_eq!(sev, Severity::Critical);
/// assert_eq!(sev.to_string(), "critical");
/// assert!(Severity::Critical > Severity::Warning);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" | "crit" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Process that emitted an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventSource {
    pub service: String,
    pub host: String,
    pub pid: u32,
}

/// The part of a rule definition copied into each alert it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RuleSummary {
    pub name: String,
    pub threshold: f64,
    pub severity: Severity,
}

/// An alert raised when a rule's debounced condition held.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlertEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    /// Always [`EVENT_TYPE_METRIC_THRESHOLD`] for rule-engine alerts.
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub source: EventSource,
    /// Every reading of the tick that fired the rule.
    pub metrics: MetricSnapshot,
    pub rule: RuleSummary,
    pub version: String,
}
