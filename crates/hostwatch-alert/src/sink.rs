use crate::error::SinkError;
use hostwatch_common::types::AlertEvent;

/// Destination for alert events produced by the [`RulesEngine`](crate::RulesEngine).
///
/// Publishing happens on the sampler task, once per fired rule. A failed
/// publish is logged by the engine and does not affect other rules, so
/// implementations should return quickly and report errors rather than
/// retry.
///
/// Any `Fn(&AlertEvent) -> Result<(), SinkError>` closure is a sink.
pub trait AlertSink: Send + Sync {
    /// Sink name used in logs (e.g. `"event-log"`).
    fn name(&self) -> &str;

    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be delivered.
    fn publish(&self, event: &AlertEvent) -> Result<(), SinkError>;
}

impl<F> AlertSink for F
where
    F: Fn(&AlertEvent) -> Result<(), SinkError> + Send + Sync,
{
    fn name(&self) -> &str {
        "fn"
    }

    fn publish(&self, event: &AlertEvent) -> Result<(), SinkError> {
        self(event)
    }
}

/// Publishes every event to each inner sink in order.
///
/// All sinks are attempted even if one fails; the first error is returned.
pub struct FanoutSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }
}

impl AlertSink for FanoutSink {
    fn name(&self) -> &str {
        "fanout"
    }

    fn publish(&self, event: &AlertEvent) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event) {
                tracing::warn!(sink = sink.name(), event_id = %event.id, error = %e, "Sink publish failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
