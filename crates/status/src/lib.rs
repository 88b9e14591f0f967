//! Provider health polling: status-page scraping, direct health probes, and
//! the reachability fallback that keeps every check returning a result.

pub mod checker;
pub mod incidents;
pub mod probe;
pub mod types;

pub use {
    checker::{DirectProbeCheck, FallbackCheck, PrimaryCheck, ScrapeCheck, StatusChecker},
    incidents::extract_incidents,
    probe::{Reachability, probe_endpoint},
    types::{MAX_INCIDENTS, ServiceStatus, Status, StatusCheckResult},
};
