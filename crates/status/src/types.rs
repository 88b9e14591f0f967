use std::time::Duration;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Maximum number of incident lines attached to a single result.
pub const MAX_INCIDENTS: usize = 5;

/// Health classification, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Operational,
    Degraded,
    Down,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one health poll of a provider.
///
/// Fields are read through accessors so every value, deserialized ones
/// included, carries at most [`MAX_INCIDENTS`] incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCheckResult")]
pub struct StatusCheckResult {
    status: Status,
    message: String,
    incidents: Vec<String>,
}

#[derive(Deserialize)]
struct RawCheckResult {
    status: Status,
    message: String,
    #[serde(default)]
    incidents: Vec<String>,
}

impl From<RawCheckResult> for StatusCheckResult {
    fn from(raw: RawCheckResult) -> Self {
        Self::new(raw.status, raw.message, raw.incidents)
    }
}

impl StatusCheckResult {
    /// Build a result, keeping at most [`MAX_INCIDENTS`] incidents.
    pub fn new(status: Status, message: impl Into<String>, mut incidents: Vec<String>) -> Self {
        incidents.truncate(MAX_INCIDENTS);
        Self {
            status,
            message: message.into(),
            incidents,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn incidents(&self) -> &[String] {
        &self.incidents
    }
}

/// Aggregate record for one provider, assembled by the poller from a
/// [`StatusCheckResult`] plus its own timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub provider: String,
    pub status: Status,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,
    /// Round-trip time of the whole check, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    pub message: String,
    pub incidents: Vec<String>,
}

impl ServiceStatus {
    pub fn from_result(
        provider: impl Into<String>,
        result: StatusCheckResult,
        last_checked: DateTime<Utc>,
        elapsed: Option<Duration>,
    ) -> Self {
        Self {
            provider: provider.into(),
            status: result.status,
            last_checked,
            status_url: None,
            response_time: elapsed.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            message: result.message,
            incidents: result.incidents,
        }
    }

    #[must_use]
    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = Some(url.into());
        self
    }
}
