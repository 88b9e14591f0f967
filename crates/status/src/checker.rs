//! Tiered status checks.
//!
//! A [`StatusChecker`] runs exactly one pass per call: the provider's primary
//! check, and only if that fails, a reachability probe against a simpler URL.
//! Every path ends in a [`StatusCheckResult`]; nothing is raised to the caller.

use std::time::Duration;

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    incidents::extract_incidents,
    probe::{Reachability, probe_endpoint},
    types::{Status, StatusCheckResult},
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Scrape a public HTML status page and classify it by keyword.
#[derive(Debug, Clone)]
pub struct ScrapeCheck {
    pub status_url: String,
    /// Text that must appear on the page for any keyword to count.
    pub product_name: String,
    /// Prefix used in result messages.
    pub label: String,
    pub down_keywords: Vec<String>,
    pub degraded_keywords: Vec<String>,
    /// Heading that opens the incident section.
    pub incident_marker: String,
}

impl ScrapeCheck {
    /// Keyword classification of a status-page body.
    ///
    /// Without the product name the page says nothing about this provider
    /// and the result is operational. Down keywords outrank degraded ones.
    pub fn classify(&self, body: &str) -> Status {
        if !body.contains(&self.product_name) {
            return Status::Operational;
        }
        if self.down_keywords.iter().any(|k| body.contains(k.as_str())) {
            Status::Down
        } else if self.degraded_keywords.iter().any(|k| body.contains(k.as_str())) {
            Status::Degraded
        } else {
            Status::Operational
        }
    }

    fn message(&self, status: Status) -> String {
        let summary = match status {
            Status::Down => "Major Outage",
            Status::Degraded => "Degraded Performance",
            Status::Operational => "Operational",
        };
        format!("{}: {summary}", self.label)
    }
}

/// Call a JSON health endpoint and map its HTTP status.
#[derive(Debug, Clone)]
pub struct DirectProbeCheck {
    pub health_url: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub enum PrimaryCheck {
    Scrape(ScrapeCheck),
    DirectProbe(DirectProbeCheck),
}

impl PrimaryCheck {
    pub fn url(&self) -> &str {
        match self {
            Self::Scrape(scrape) => &scrape.status_url,
            Self::DirectProbe(direct) => &direct.health_url,
        }
    }
}

/// Reduced-confidence answer used when the primary check fails.
#[derive(Debug, Clone)]
pub struct FallbackCheck {
    pub probe_url: String,
    pub reachable_status: Status,
    pub reachable_message: String,
    pub unreachable_status: Status,
    pub unreachable_message: String,
    /// Single incident line attached to every fallback result.
    pub note: String,
}

impl FallbackCheck {
    /// Fallback for scraped status pages: a reachable page is assumed fine.
    pub fn status_page(probe_url: impl Into<String>) -> Self {
        Self {
            probe_url: probe_url.into(),
            reachable_status: Status::Operational,
            reachable_message: "Status page: reachable".into(),
            unreachable_status: Status::Degraded,
            unreachable_message: "Status page: unreachable".into(),
            note: "Note: Limited status information due to CORS restrictions".into(),
        }
    }

    /// Fallback for API health endpoints: the API answered the primary
    /// check badly, so reachable is at best degraded.
    pub fn api_endpoint(probe_url: impl Into<String>) -> Self {
        Self {
            probe_url: probe_url.into(),
            reachable_status: Status::Degraded,
            reachable_message: "API endpoint: Reachable but not responding properly".into(),
            unreachable_status: Status::Down,
            unreachable_message: "API endpoint: Unreachable".into(),
            note: "Note: Limited status information available".into(),
        }
    }

    fn result(&self, reachability: Reachability) -> StatusCheckResult {
        let (status, message) = match reachability {
            Reachability::Reachable => (self.reachable_status, &self.reachable_message),
            Reachability::Unreachable => (self.unreachable_status, &self.unreachable_message),
        };
        StatusCheckResult::new(status, message.clone(), vec![self.note.clone()])
    }
}

/// Why the primary check handed over to the fallback.
#[derive(Debug)]
enum PrimaryFailure {
    Http(reqwest::StatusCode),
    Request(reqwest::Error),
    Cancelled,
}

impl std::fmt::Display for PrimaryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(status) => write!(f, "HTTP {status}"),
            Self::Request(err) => write!(f, "{err}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Health checker for one provider.
#[derive(Debug, Clone)]
pub struct StatusChecker {
    provider: String,
    primary: PrimaryCheck,
    fallback: FallbackCheck,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl StatusChecker {
    pub fn new(provider: impl Into<String>, primary: PrimaryCheck, fallback: FallbackCheck) -> Self {
        Self {
            provider: provider.into(),
            primary,
            fallback,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, request_timeout: Duration, probe_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// URL polled by the primary check.
    pub fn status_url(&self) -> &str {
        self.primary.url()
    }

    pub fn primary(&self) -> &PrimaryCheck {
        &self.primary
    }

    pub fn fallback(&self) -> &FallbackCheck {
        &self.fallback
    }

    /// Run one primary check, falling back to a reachability probe on failure.
    pub async fn check(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
    ) -> StatusCheckResult {
        let primary = match &self.primary {
            PrimaryCheck::Scrape(scrape) => self.scrape(client, scrape, cancel).await,
            PrimaryCheck::DirectProbe(direct) => self.direct_probe(client, direct, cancel).await,
        };

        match primary {
            Ok(result) => {
                debug!(
                    provider = %self.provider,
                    status = %result.status(),
                    "status check completed"
                );
                result
            },
            Err(failure) => {
                warn!(
                    provider = %self.provider,
                    url = %self.primary.url(),
                    error = %failure,
                    "primary status check failed, probing fallback endpoint"
                );
                let reachability = probe_endpoint(
                    client,
                    &self.fallback.probe_url,
                    self.probe_timeout,
                    cancel,
                )
                .await;
                self.fallback.result(reachability)
            },
        }
    }

    async fn scrape(
        &self,
        client: &reqwest::Client,
        scrape: &ScrapeCheck,
        cancel: &CancellationToken,
    ) -> Result<StatusCheckResult, PrimaryFailure> {
        let response = self
            .send(client.get(&scrape.status_url), cancel)
            .await?;
        if !response.status().is_success() {
            return Err(PrimaryFailure::Http(response.status()));
        }

        let body = tokio::select! {
            body = response.text() => body.map_err(PrimaryFailure::Request)?,
            () = cancel.cancelled() => return Err(PrimaryFailure::Cancelled),
        };

        let status = scrape.classify(&body);
        let incidents = extract_incidents(&body, &scrape.incident_marker);
        Ok(StatusCheckResult::new(
            status,
            scrape.message(status),
            incidents,
        ))
    }

    async fn direct_probe(
        &self,
        client: &reqwest::Client,
        direct: &DirectProbeCheck,
        cancel: &CancellationToken,
    ) -> Result<StatusCheckResult, PrimaryFailure> {
        let request = client
            .get(&direct.health_url)
            .header("Content-Type", "application/json");
        let response = self.send(request, cancel).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(StatusCheckResult::new(
                Status::Operational,
                format!("{}: Operational", direct.label),
                Vec::new(),
            ));
        }

        let code = status.as_u16();
        Ok(StatusCheckResult::new(
            Status::Degraded,
            format!("{}: Degraded (Status {code})", direct.label),
            vec![format!("API returned status code {code}")],
        ))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, PrimaryFailure> {
        tokio::select! {
            result = request.timeout(self.request_timeout).send() => {
                result.map_err(PrimaryFailure::Request)
            },
            () = cancel.cancelled() => Err(PrimaryFailure::Cancelled),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::MAX_INCIDENTS,
        axum::{Router, http::StatusCode, routing::get},
        rstest::rstest,
    };

    async fn serve(app: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), server)
    }

    fn azure_like(status_url: &str, fallback_url: &str) -> StatusChecker {
        StatusChecker::new(
            "azure-openai",
            PrimaryCheck::Scrape(ScrapeCheck {
                status_url: status_url.into(),
                product_name: "Cognitive Services".into(),
                label: "Azure Cognitive Services".into(),
                down_keywords: vec!["Service is down".into()],
                degraded_keywords: vec!["Service is experiencing issues".into()],
                incident_marker: "Recent History".into(),
            }),
            FallbackCheck::status_page(fallback_url),
        )
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
    }

    fn granite_like(health_url: &str, fallback_url: &str) -> StatusChecker {
        StatusChecker::new(
            "granite",
            PrimaryCheck::DirectProbe(DirectProbeCheck {
                health_url: health_url.into(),
                label: "Granite API".into(),
            }),
            FallbackCheck::api_endpoint(fallback_url),
        )
        .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
    }

    fn scrape_check() -> ScrapeCheck {
        match azure_like("http://unused", "http://unused").primary {
            PrimaryCheck::Scrape(scrape) => scrape,
            PrimaryCheck::DirectProbe(_) => unreachable!(),
        }
    }

    #[rstest]
    #[case("All good today", Status::Operational)]
    #[case("Service is down everywhere", Status::Operational)]
    #[case("Cognitive Services: healthy", Status::Operational)]
    #[case("Cognitive Services - Service is experiencing issues", Status::Degraded)]
    #[case("Cognitive Services - Service is down", Status::Down)]
    #[case(
        "Cognitive Services - Service is experiencing issues; Service is down",
        Status::Down
    )]
    fn classification(#[case] body: &str, #[case] expected: Status) {
        assert_eq!(scrape_check().classify(body), expected);
    }

    #[tokio::test]
    async fn scrape_reports_major_outage() {
        let app = Router::new().route(
            "/status",
            get(|| async {
                "<html><div>Cognitive Services\nService is down\n</div>\
                 <div>Recent History\n\
                 Cognitive Services outage in East US\n\
                 Investigating elevated error rates\n\
                 </div></html>"
            }),
        );
        let (base, server) = serve(app).await;

        let checker = azure_like(&format!("{base}/status"), &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Down);
        assert!(result.message().contains("Major Outage"), "{}", result.message());
        assert_eq!(result.incidents(), vec![
            "Cognitive Services outage in East US",
            "Investigating elevated error rates",
        ]);
    }

    #[tokio::test]
    async fn scrape_caps_incidents() {
        let app = Router::new().route(
            "/status",
            get(|| async {
                let lines: String = (1..=9)
                    .map(|i| format!("Resolved incident number {i}\n"))
                    .collect();
                format!("<div>Recent History\n{lines}</div>")
            }),
        );
        let (base, server) = serve(app).await;

        let checker = azure_like(&format!("{base}/status"), &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Operational);
        assert_eq!(result.message(), "Azure Cognitive Services: Operational");
        assert_eq!(result.incidents().len(), MAX_INCIDENTS);
        assert_eq!(result.incidents()[0], "Resolved incident number 1");
    }

    #[tokio::test]
    async fn scrape_network_error_falls_back_to_reachable_probe() {
        let app = Router::new().route("/", get(|| async { "ok" }));
        let (base, server) = serve(app).await;

        let checker = azure_like("http://127.0.0.1:1/status", &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Operational);
        assert_eq!(result.message(), "Status page: reachable");
        assert_eq!(result.incidents().len(), 1);
        assert!(result.incidents()[0].contains("Limited status information"));
    }

    #[tokio::test]
    async fn scrape_non_ok_page_goes_to_fallback() {
        let app = Router::new()
            .route(
                "/status",
                get(|| async {
                    (
                        StatusCode::FORBIDDEN,
                        "Cognitive Services Service is down",
                    )
                }),
            )
            .route("/", get(|| async { "root" }));
        let (base, server) = serve(app).await;

        let checker = azure_like(&format!("{base}/status"), &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        // The body is never classified once the page itself fails.
        assert_eq!(result.status(), Status::Operational);
        assert_eq!(result.message(), "Status page: reachable");
    }

    #[tokio::test]
    async fn scrape_with_nothing_reachable_is_degraded() {
        let checker = azure_like("http://127.0.0.1:1/status", "http://127.0.0.1:1/");
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;

        assert_eq!(result.status(), Status::Degraded);
        assert_eq!(result.message(), "Status page: unreachable");
        assert_eq!(result.incidents().len(), 1);
    }

    #[tokio::test]
    async fn direct_probe_ok_is_operational() {
        let app = Router::new().route(
            "/v1/health",
            get(|| async { axum::Json(serde_json::json!({"status": "ok"})) }),
        );
        let (base, server) = serve(app).await;

        let checker = granite_like(&format!("{base}/v1/health"), &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Operational);
        assert_eq!(result.message(), "Granite API: Operational");
        assert!(result.incidents().is_empty());
    }

    #[tokio::test]
    async fn direct_probe_503_is_degraded() {
        let app = Router::new().route(
            "/v1/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let (base, server) = serve(app).await;

        let checker = granite_like(&format!("{base}/v1/health"), &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Degraded);
        assert!(result.message().contains("503"), "{}", result.message());
        assert_eq!(result.incidents(), vec!["API returned status code 503"]);
    }

    #[tokio::test]
    async fn direct_probe_failure_with_reachable_root_is_degraded() {
        let app = Router::new().route("/", get(|| async { "root" }));
        let (base, server) = serve(app).await;

        let checker = granite_like("http://127.0.0.1:1/v1/health", &format!("{base}/"));
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;
        server.abort();

        assert_eq!(result.status(), Status::Degraded);
        assert_eq!(
            result.message(),
            "API endpoint: Reachable but not responding properly"
        );
        assert_eq!(result.incidents(), vec![
            "Note: Limited status information available"
        ]);
    }

    #[tokio::test]
    async fn direct_probe_failure_with_unreachable_root_is_down() {
        let checker = granite_like("http://127.0.0.1:1/v1/health", "http://127.0.0.1:1/");
        let result = checker
            .check(&reqwest::Client::new(), &CancellationToken::new())
            .await;

        assert_eq!(result.status(), Status::Down);
        assert_eq!(result.message(), "API endpoint: Unreachable");
    }

    #[tokio::test]
    async fn cancelled_check_still_returns_a_result() {
        let app = Router::new().route(
            "/v1/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );
        let (base, server) = serve(app).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let checker = granite_like(&format!("{base}/v1/health"), &format!("{base}/"));
        let result = checker.check(&reqwest::Client::new(), &cancel).await;
        server.abort();

        assert_eq!(result.status(), Status::Down);
        assert_eq!(result.incidents().len(), 1);
    }
}
