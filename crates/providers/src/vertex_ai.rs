//! Vertex AI: static catalog only, Google Cloud status-page scrape, and
//! `genai` handles scoped to a project and location.

use std::time::Duration;

use {
    lodestar_config::ProviderOption,
    lodestar_status::{FallbackCheck, PrimaryCheck, ScrapeCheck, StatusChecker},
    secrecy::Secret,
    tokio_util::sync::CancellationToken,
};

use crate::{
    credentials::{CredentialSources, Credentials, resolve_option},
    descriptor::{ModelInfo, ProviderDescriptor},
    error::{Error, Result},
    instance::{ModelClient, ModelHandle},
    provider::Provider,
};

pub const PROVIDER_NAME: &str = "vertex-ai";
pub const API_KEY_ENV: &str = "VERTEX_AI_API_KEY";
pub const BASE_URL_ENV: &str = "VERTEX_AI_ENDPOINT";
pub const PROJECT_ID_ENV: &str = "VERTEX_AI_PROJECT_ID";
pub const LOCATION_ENV: &str = "VERTEX_AI_LOCATION";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const API_VERSION: &str = "v1";

pub const STATUS_URL: &str = "https://status.cloud.google.com/";

const STATIC_MODELS: &[(&str, &str, u32)] = &[
    ("gemini-1.5-pro", "Gemini 1.5 Pro", 32000),
    ("gemini-1.5-flash", "Gemini 1.5 Flash", 32000),
    ("gemini-1.0-pro", "Gemini 1.0 Pro", 8192),
    ("gemini-1.0-pro-vision", "Gemini 1.0 Pro Vision", 8192),
    ("text-bison", "Text Bison", 8192),
    ("chat-bison", "Chat Bison", 8192),
    ("claude-3-sonnet@vertex", "Claude 3 Sonnet (Vertex)", 28000),
    ("claude-3-haiku@vertex", "Claude 3 Haiku (Vertex)", 28000),
    ("claude-3-opus@vertex", "Claude 3 Opus (Vertex)", 28000),
];

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::new(PROVIDER_NAME, "Vertex AI", API_KEY_ENV, BASE_URL_ENV)
        .with_api_version(API_VERSION)
        .with_static_models(STATIC_MODELS)
}

/// Scrape of the Google Cloud status page, keyed on Vertex AI.
pub fn status_checker(status_url: &str, fallback_url: &str) -> StatusChecker {
    StatusChecker::new(
        PROVIDER_NAME,
        PrimaryCheck::Scrape(ScrapeCheck {
            status_url: status_url.into(),
            product_name: "Vertex AI".into(),
            label: "Vertex AI".into(),
            down_keywords: vec!["Service outage".into()],
            degraded_keywords: vec!["Service disruption".into()],
            incident_marker: "Incidents".into(),
        }),
        FallbackCheck::status_page(fallback_url),
    )
}

/// Publisher-models endpoint for a project in a region.
pub fn regional_endpoint(project_id: &str, location: &str) -> String {
    format!(
        "https://{location}-aiplatform.googleapis.com/{API_VERSION}/projects/{project_id}/locations/{location}/publishers/google/models"
    )
}

/// Base URL handed to `genai`, which appends `models/{model}:…` itself.
fn sdk_base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    let base = trimmed.strip_suffix("/models").unwrap_or(trimmed);
    format!("{base}/")
}

pub struct VertexAiProvider {
    descriptor: ProviderDescriptor,
    checker: StatusChecker,
}

impl Default for VertexAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl VertexAiProvider {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor(),
            checker: status_checker(STATUS_URL, STATUS_URL),
        }
    }

    #[must_use]
    pub fn with_status_checker(mut self, checker: StatusChecker) -> Self {
        self.checker = checker;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, request_timeout: Duration, probe_timeout: Duration) -> Self {
        self.checker = self.checker.with_timeouts(request_timeout, probe_timeout);
        self
    }
}

#[async_trait::async_trait]
impl Provider for VertexAiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn status_checker(&self) -> &StatusChecker {
        &self.checker
    }

    /// Vertex AI has no listing endpoint reachable with an API key, so the
    /// catalog is the static list.
    async fn fetch_models(
        &self,
        _client: &reqwest::Client,
        _credentials: &Credentials,
        _sources: &CredentialSources<'_>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }

    fn build_instance(
        &self,
        model: &str,
        api_key: Secret<String>,
        base_url: Option<String>,
        sources: &CredentialSources<'_>,
    ) -> Result<ModelHandle> {
        let tiers = sources.tiers(PROVIDER_NAME);
        let Some(project_id) = resolve_option(&tiers, ProviderOption::ProjectId, PROJECT_ID_ENV)
        else {
            return Err(Error::missing_config(PROVIDER_NAME, "project id"));
        };
        let location = resolve_option(&tiers, ProviderOption::Location, LOCATION_ENV)
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let endpoint = base_url.unwrap_or_else(|| regional_endpoint(&project_id, &location));
        let client = ModelClient::genai(&sdk_base_url(&endpoint), &api_key);
        Ok(ModelHandle::new(PROVIDER_NAME, model, endpoint, client).with_api_version(API_VERSION))
    }
}
