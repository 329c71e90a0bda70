//! In-memory storage for the sampling loop.
//!
//! [`history::HistoryStore`] keeps the last `capacity` snapshots as aligned
//! per-metric windows; [`event_log::EventLog`] keeps the most recent alert
//! events. Both evict the oldest entry on overflow and hold nothing across
//! restarts. Callers share them behind a mutex with a single writer.

pub mod event_log;
pub mod history;


pub use event_log::{EventLog, ReadOrder, DEFAULT_EVENT_CAPACITY};
pub use history::{HistoryStore, HistoryView, SeriesStats, DEFAULT_HISTORY_CAPACITY};
