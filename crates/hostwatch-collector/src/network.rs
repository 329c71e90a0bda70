use crate::{NetCounters, Result};
use sysinfo::Networks;

/// Interfaces never counted towards host throughput.
const IGNORED_INTERFACES: &[&str] = &["lo", "lo0"];

pub struct NetworkReader {
    networks: Networks,
}

impl NetworkReader {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// Cumulative bytes received/sent across all non-loopback interfaces.
    pub fn read(&mut self) -> Result<NetCounters> {
        self.networks.refresh();
        let counters = sum_counters(
            self.networks
                .iter()
                .map(|(name, data)| (name.as_str(), data.total_received(), data.total_transmitted())),
        );
        Ok(counters)
    }
}

impl Default for NetworkReader {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counters<'a>(interfaces: impl Iterator<Item = (&'a str, u64, u64)>) -> NetCounters {
    interfaces
        .filter(|(name, _, _)| !IGNORED_INTERFACES.contains(name))
        .fold(NetCounters::default(), |acc, (_, recv, sent)| NetCounters {
            recv_bytes: acc.recv_bytes.saturating_add(recv),
            sent_bytes: acc.sent_bytes.saturating_add(sent),
        })
}
