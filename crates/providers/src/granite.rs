//! Granite: OpenAI-compatible API with a JSON health endpoint.

use std::time::Duration;

use {
    lodestar_status::{DirectProbeCheck, FallbackCheck, PrimaryCheck, StatusChecker},
    secrecy::{ExposeSecret, Secret},
    tokio_util::sync::CancellationToken,
};

use crate::{
    catalog::{fetch_listing, parse_listing},
    credentials::{CredentialSources, Credentials},
    descriptor::{ModelInfo, ProviderDescriptor},
    error::{Error, Result},
    instance::{ModelClient, ModelHandle},
    provider::Provider,
};

pub const PROVIDER_NAME: &str = "granite";
pub const API_KEY_ENV: &str = "GRANITE_API_KEY";
pub const BASE_URL_ENV: &str = "GRANITE_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.granite.io/v1";

pub const HEALTH_URL: &str = "https://api.granite.io/v1/health";
pub const HEALTH_FALLBACK_URL: &str = "https://api.granite.io/";

/// Used when a listed model has no `context_length`.
const DEFAULT_MAX_TOKENS: u32 = 8192;

const STATIC_MODELS: &[(&str, &str, u32)] = &[
    ("granite-8b", "Granite 8B", 8192),
    ("granite-13b", "Granite 13B", 8192),
    ("granite-20b", "Granite 20B", 8192),
    ("granite-34b", "Granite 34B", 16384),
    ("granite-70b", "Granite 70B", 32768),
    ("granite-llama3-8b", "Granite Llama3 8B", 8192),
    ("granite-llama3-70b", "Granite Llama3 70B", 8192),
];

#[derive(Debug, serde::Deserialize)]
struct ListedModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    context_length: Option<u32>,
}

impl ListedModel {
    fn into_model_info(self) -> ModelInfo {
        let label = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.id.clone());
        let max_tokens = self
            .context_length
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        ModelInfo::new(self.id, label, PROVIDER_NAME, max_tokens)
            .with_context_length(self.context_length)
    }
}

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::new(PROVIDER_NAME, "Granite", API_KEY_ENV, BASE_URL_ENV)
        .with_default_base_url(DEFAULT_BASE_URL)
        .with_static_models(STATIC_MODELS)
}

/// Direct probe of the Granite health endpoint.
pub fn status_checker(health_url: &str, fallback_url: &str) -> StatusChecker {
    StatusChecker::new(
        PROVIDER_NAME,
        PrimaryCheck::DirectProbe(DirectProbeCheck {
            health_url: health_url.into(),
            label: "Granite API".into(),
        }),
        FallbackCheck::api_endpoint(fallback_url),
    )
}

pub struct GraniteProvider {
    descriptor: ProviderDescriptor,
    checker: StatusChecker,
    request_timeout: Duration,
}

impl Default for GraniteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GraniteProvider {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor(),
            checker: status_checker(HEALTH_URL, HEALTH_FALLBACK_URL),
            request_timeout: Duration::from_secs(10),
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
        self.request_timeout = request_timeout;
        self
    }

    fn base_url(&self, resolved: Option<String>) -> String {
        resolved
            .or_else(|| self.descriptor.default_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

#[async_trait::async_trait]
impl Provider for GraniteProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn status_checker(&self) -> &StatusChecker {
        &self.checker
    }

    async fn fetch_models(
        &self,
        client: &reqwest::Client,
        credentials: &Credentials,
        _sources: &CredentialSources<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ModelInfo>> {
        let Some(api_key) = credentials.api_key.as_ref() else {
            return Err(Error::missing_credential(PROVIDER_NAME));
        };
        let base_url = self.base_url(credentials.base_url.clone());

        let request = client
            .get(format!("{}/models", base_url.trim_end_matches('/')))
            .timeout(self.request_timeout)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json");
        let body = fetch_listing(PROVIDER_NAME, request, cancel).await?;
        let listed: Vec<ListedModel> = parse_listing(PROVIDER_NAME, &body)?;

        Ok(listed
            .into_iter()
            .map(ListedModel::into_model_info)
            .collect())
    }

    fn build_instance(
        &self,
        model: &str,
        api_key: Secret<String>,
        base_url: Option<String>,
        _sources: &CredentialSources<'_>,
    ) -> Result<ModelHandle> {
        let base_url = self.base_url(base_url);
        let client = ModelClient::openai_compatible(&base_url, &api_key);
        Ok(ModelHandle::new(PROVIDER_NAME, model, base_url, client))
    }
}
