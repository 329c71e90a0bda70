//! Host metric sources for the hostwatch sampler.
//!
//! A [`MetricSource`] yields one [`RawSample`] per sampler tick: CPU, memory
//! and disk usage as percentages plus cumulative network byte counters.
//! Every reading carries its own [`Result`] so a failing probe only degrades
//! that metric. [`rate`] turns consecutive counter readings into throughput.

pub mod cpu;
pub mod disk;
pub mod error;
pub mod memory;
pub mod network;
pub mod rate;
pub mod system;

pub use error::{CollectError, Result};

/// Cumulative byte counters summed over the monitored interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounters {
    pub recv_bytes: u64,
    pub sent_bytes: u64,
}

/// Instantaneous readings taken in one tick.
#[derive(Debug)]
pub struct RawSample {
    pub cpu: Result<f64>,
    pub mem: Result<f64>,
    pub disk: Result<f64>,
    pub net: Result<NetCounters>,
}

/// A provider of raw host readings.
///
/// The sampler owns exactly one source and calls [`MetricSource::sample`]
/// once per tick from its own task, so implementations need `Send` but not
/// `Sync`. Reads are expected to return well within the sampling interval.
pub trait MetricSource: Send {
    /// Source name used in logs (e.g. `"sysinfo"`).
    fn name(&self) -> &str;

    /// Reads every metric once. Individual failures are reported per field.
    fn sample(&mut self) -> RawSample;

    /// Reads only the network counters. Used to seed rate calculation
    /// before the first tick.
    fn net_counters(&mut self) -> Result<NetCounters> {
        self.sample().net
    }
}
