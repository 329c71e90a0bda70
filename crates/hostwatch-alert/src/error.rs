/// Reasons a configured rule definition is rejected at load time.
///
/// A rejected definition is skipped; the remaining rules still load.
///
/// # Examples
///
/// ```rust
/// use hostwatch_alert::error::RuleError;
///
/// let err = RuleError::UnknownMetric("gpu".to_string());
/// assert!(err.to_string().contains("gpu"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The definition has no threshold value.
    #[error("Rule: missing threshold")]
    MissingThreshold,

    /// The threshold is present but not a finite number.
    #[error("Rule: invalid threshold '{0}'")]
    InvalidThreshold(String),

    /// `consecutive` or `cooldown_sec` is present but not a finite number.
    #[error("Rule: invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    /// The definition has no metric name.
    #[error("Rule: missing metric")]
    MissingMetric,

    /// The metric name is not one of the sampled series.
    #[error("Rule: unknown metric '{0}'")]
    UnknownMetric(String),

    /// The comparator is neither `>` nor `<`.
    #[error("Rule: unknown comparator '{0}'")]
    UnknownComparator(String),

    /// The severity is neither `warning` nor `critical`.
    #[error("Rule: unknown severity '{0}'")]
    UnknownSeverity(String),

    /// The entry does not have the shape of a rule definition.
    #[error("Rule: malformed definition: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors returned by an [`AlertSink`](crate::sink::AlertSink) when an event
/// cannot be delivered.
///
/// # Examples
///
/// ```rust
/// use hostwatch_alert::error::SinkError;
///
/// let err = SinkError::Closed("event-log".to_string());
/// assert!(err.to_string().contains("event-log"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink no longer accepts events.
    #[error("Sink: {0} is closed")]
    Closed(String),

    /// Delivery failed for a sink-specific reason.
    #[error("Sink: {sink} rejected event: {reason}")]
    Rejected { sink: String, reason: String },
}
