use hostwatch_alert::{AlertSink, SinkError};
use hostwatch_common::types::{AlertEvent, Severity};
use hostwatch_storage::EventLog;
use std::sync::{Arc, Mutex};

/// Appends alert events to the shared [`EventLog`] served by `/api/events`.
pub struct EventLogSink {
    log: Arc<Mutex<EventLog>>,
}

impl EventLogSink {
    pub fn new(log: Arc<Mutex<EventLog>>) -> Self {
        Self { log }
    }
}

impl AlertSink for EventLogSink {
    fn name(&self) -> &str {
        "event-log"
    }

    fn publish(&self, event: &AlertEvent) -> Result<(), SinkError> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .append(event.clone());
        Ok(())
    }
}

/// Writes each alert event to the process log.
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn publish(&self, event: &AlertEvent) -> Result<(), SinkError> {
        match event.level {
            Severity::Critical => tracing::error!(
                event_id = %event.id,
                rule = %event.rule.name,
                host = %event.source.host,
                "ALERT {}",
                event.message
            ),
            Severity::Warning => tracing::warn!(
                event_id = %event.id,
                rule = %event.rule.name,
                host = %event.source.host,
                "ALERT {}",
                event.message
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hostwatch_common::types::{EventSource, MetricSnapshot, RuleSummary};

    fn event(id: &str) -> AlertEvent {
        let now = Utc::now();
        AlertEvent {
            id: id.to_string(),
            timestamp: now,
            level: Severity::Critical,
            event_type: "metric_threshold".to_string(),
            message: "disk > 90.0".to_string(),
            source: EventSource {
                service: "hostwatch".to_string(),
                host: "db-01".to_string(),
                pid: 7,
            },
            metrics: MetricSnapshot::empty(now),
            rule: RuleSummary {
                name: "disk_high".to_string(),
                threshold: 90.0,
                severity: Severity::Critical,
            },
            version: "v1".to_string(),
        }
    }

    #[test]
    fn event_log_sink_appends() {
        let log = Arc::new(Mutex::new(EventLog::new(2)));
        let sink = EventLogSink::new(log.clone());
        for id in ["a", "b", "c"] {
            sink.publish(&event(id)).unwrap();
        }
        let log = log.lock().unwrap();
        assert_eq!(log.size(), 2);
        assert_eq!(log.recent(1)[0].id, "c");
    }

    #[test]
    fn tracing_sink_accepts_events() {
        assert!(TracingSink.publish(&event("x")).is_ok());
    }
}
