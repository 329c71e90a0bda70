/// Errors raised while reading a single host metric.
///
/// A collect error never aborts a sampler tick; the affected metric is
/// recorded as absent for that tick.
///
/// # Examples
///
/// ```rust
/// use hostwatch_collector::error::CollectError;
///
/// let err = CollectError::MountNotFound("/data".to_string());
/// assert!(err.to_string().contains("/data"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The platform reported no usable value for this metric.
    #[error("Collect: {metric} unavailable: {reason}")]
    Unavailable {
        metric: &'static str,
        reason: String,
    },

    /// No mounted filesystem contains the configured disk path.
    #[error("Collect: no filesystem mounted for '{0}'")]
    MountNotFound(String),
}

/// Convenience `Result` alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectError>;
