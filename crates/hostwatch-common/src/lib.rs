//! Types shared by every hostwatch crate: metric series, snapshots,
//! severities and the alert event contract.

pub mod id;
pub mod types;
