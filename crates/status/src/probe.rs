use std::time::Duration;

use {tokio_util::sync::CancellationToken, tracing::debug};

/// Outcome of a best-effort reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable,
}

impl Reachability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reachable => "reachable",
            Self::Unreachable => "unreachable",
        }
    }
}

impl std::fmt::Display for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue a GET against `url` and report whether anything answered.
///
/// Any HTTP response, whatever its status code, counts as reachable. Network
/// errors, timeouts and cancellation count as unreachable.
pub async fn probe_endpoint(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Reachability {
    let request = client.get(url).timeout(timeout).send();
    tokio::select! {
        result = request => match result {
            Ok(response) => {
                debug!(url, status = %response.status(), "endpoint reachable");
                Reachability::Reachable
            },
            Err(err) => {
                debug!(url, error = %err, "endpoint unreachable");
                Reachability::Unreachable
            },
        },
        () = cancel.cancelled() => {
            debug!(url, "reachability probe cancelled");
            Reachability::Unreachable
        },
    }
}
