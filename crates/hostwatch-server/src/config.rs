use anyhow::Context;
use hostwatch_alert::{RuleDefaults, RulesConfig};
use hostwatch_storage::{DEFAULT_EVENT_CAPACITY, DEFAULT_HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Reported as `source.service` in alert events.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Mount point whose usage is reported as the `disk` metric.
    #[serde(default = "default_disk_path")]
    pub disk_path: String,

    /// CORS allowed origins. Empty allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub events: EventsConfig,
    /// Defaults for `consecutive` / `cooldown_sec`.
    #[serde(default)]
    pub alerts: RuleDefaults,

    /// Legacy `{metric = threshold}` table. Used when `rules` is empty or
    /// has no valid entry.
    #[serde(default = "default_thresholds")]
    pub thresholds: BTreeMap<String, Value>,
    #[serde(default)]
    pub rules: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Age of the last sample after which health reports `degraded`.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            history_capacity: default_history_capacity(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl SamplerConfig {
    /// Tick period, never shorter than 10ms.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(10))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_http_port() -> u16 {
    8000
}

fn default_service_name() -> String {
    "hostwatch".to_string()
}

fn default_disk_path() -> String {
    "/".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_stale_after_secs() -> f64 {
    3.0
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_thresholds() -> BTreeMap<String, Value> {
    [
        ("cpu", 80),
        ("mem", 80),
        ("disk", 90),
        ("net_recv", 100),
        ("net_sent", 100),
    ]
    .into_iter()
    .map(|(metric, threshold)| (metric.to_string(), Value::from(threshold)))
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            service_name: default_service_name(),
            disk_path: default_disk_path(),
            cors_allowed_origins: Vec::new(),
            sampler: SamplerConfig::default(),
            events: EventsConfig::default(),
            alerts: RuleDefaults::default(),
            thresholds: default_thresholds(),
            rules: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the built-in defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// The alert-rule part of the configuration.
    pub fn rules_config(&self) -> RulesConfig {
        RulesConfig {
            thresholds: self.thresholds.clone(),
            rules: self.rules.clone(),
            alerts: self.alerts.clone(),
        }
    }
}
