use crate::config::ServerConfig;
use crate::sink::{EventLogSink, TracingSink};
use chrono::{DateTime, Utc};
use hostwatch_alert::sink::FanoutSink;
use hostwatch_alert::{AlertSink, RulesEngine};
use hostwatch_common::types::EventSource;
use hostwatch_storage::{EventLog, HistoryStore};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

/// Time of the most recent completed append, written by the sampler only.
#[derive(Debug, Default)]
pub struct Liveness {
    last_sample_at: Mutex<Option<DateTime<Utc>>>,
}

impl Liveness {
    pub fn record(&self, at: DateTime<Utc>) {
        *self
            .last_sample_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(at);
    }

    pub fn last_sample_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_sample_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Everything the sampler writes and the HTTP handlers read.
///
/// Each lock is held for one store operation. No code path holds two of
/// them at once; the sampler releases `rules` before alert sinks append to
/// `events`.
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<Mutex<HistoryStore>>,
    pub events: Arc<Mutex<EventLog>>,
    pub rules: Arc<Mutex<RulesEngine>>,
    pub liveness: Arc<Liveness>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<RwLock<ServerConfig>>,
    /// File the configuration was read from; re-read on rule reload.
    pub config_path: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Builds the stores and the rules engine. Alerts go to the event log and
    /// to the process log.
    pub fn new(config: ServerConfig, config_path: Option<PathBuf>, source: EventSource) -> Self {
        let events = Arc::new(Mutex::new(EventLog::new(config.events.capacity)));
        let sinks: Vec<Box<dyn AlertSink>> = vec![
            Box::new(EventLogSink::new(events.clone())),
            Box::new(TracingSink),
        ];
        let engine = RulesEngine::from_config(
            &config.rules_config(),
            source,
            Box::new(FanoutSink::new(sinks)),
        );

        Self {
            history: Arc::new(Mutex::new(HistoryStore::new(config.sampler.history_capacity))),
            events,
            rules: Arc::new(Mutex::new(engine)),
            liveness: Arc::new(Liveness::default()),
            start_time: Utc::now(),
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(Arc::new),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ServerConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-reads the configuration file (when there is one) and rebuilds the
    /// rule set from it. Returns the number of active rules.
    pub fn reload_rules(&self) -> anyhow::Result<usize> {
        if let Some(path) = &self.config_path {
            let fresh = ServerConfig::load_or_default(path)?;
            let mut current = self
                .config
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            current.thresholds = fresh.thresholds;
            current.rules = fresh.rules;
            current.alerts = fresh.alerts;
        }

        let rules_config = self.config().rules_config();
        let count = self
            .rules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .reload(&rules_config);
        Ok(count)
    }
}
