//! Azure OpenAI: deployments listing, Azure status-page scrape, and Azure
//! SDK handles.

use std::time::Duration;

use {
    lodestar_config::ProviderOption,
    lodestar_status::{FallbackCheck, PrimaryCheck, ScrapeCheck, StatusChecker},
    secrecy::{ExposeSecret, Secret},
    tokio_util::sync::CancellationToken,
};

use crate::{
    catalog::{fetch_listing, parse_listing},
    credentials::{CredentialSources, Credentials, resolve_option},
    descriptor::{ModelInfo, ProviderDescriptor},
    error::{Error, Result},
    instance::{ModelClient, ModelHandle},
    provider::Provider,
};

pub const PROVIDER_NAME: &str = "azure-openai";
pub const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";
pub const DEFAULT_API_VERSION: &str = "2023-12-01-preview";

pub const STATUS_URL: &str = "https://status.azure.com/en-us/status";
pub const STATUS_FALLBACK_URL: &str = "https://status.azure.com/";

/// Azure does not report token limits for deployments.
const DEPLOYMENT_MAX_TOKENS: u32 = 8000;

const STATIC_MODELS: &[(&str, &str, u32)] = &[
    ("gpt-4o", "GPT-4o", 8000),
    ("gpt-4-turbo", "GPT-4 Turbo", 8000),
    ("gpt-4", "GPT-4", 8000),
    ("gpt-35-turbo", "GPT-3.5 Turbo", 4000),
];

#[derive(Debug, serde::Deserialize)]
struct Deployment {
    id: String,
    #[serde(default)]
    model: Option<String>,
}

impl Deployment {
    fn into_model_info(self) -> ModelInfo {
        let label = match self.model.as_deref() {
            Some(model) if !model.is_empty() => format!("{} ({model})", self.id),
            _ => self.id.clone(),
        };
        ModelInfo::new(self.id, label, PROVIDER_NAME, DEPLOYMENT_MAX_TOKENS)
    }
}

pub fn descriptor() -> ProviderDescriptor {
    ProviderDescriptor::new(PROVIDER_NAME, "Azure OpenAI", API_KEY_ENV, BASE_URL_ENV)
        .with_api_version(DEFAULT_API_VERSION)
        .requiring_base_url()
        .with_static_models(STATIC_MODELS)
}

/// Scrape of the Azure status page, keyed on Cognitive Services.
pub fn status_checker(status_url: &str, fallback_url: &str) -> StatusChecker {
    StatusChecker::new(
        PROVIDER_NAME,
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
}

fn deployments_url(endpoint: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

pub struct AzureOpenAiProvider {
    descriptor: ProviderDescriptor,
    checker: StatusChecker,
    request_timeout: Duration,
}

impl Default for AzureOpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureOpenAiProvider {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor(),
            checker: status_checker(STATUS_URL, STATUS_FALLBACK_URL),
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

    fn api_version(&self, sources: &CredentialSources<'_>) -> String {
        resolve_option(
            &sources.tiers(PROVIDER_NAME),
            ProviderOption::ApiVersion,
            API_VERSION_ENV,
        )
        .or_else(|| self.descriptor.api_version.clone())
        .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }
}

#[async_trait::async_trait]
impl Provider for AzureOpenAiProvider {
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
        sources: &CredentialSources<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ModelInfo>> {
        let Some(api_key) = credentials.api_key.as_ref() else {
            return Err(Error::missing_credential(PROVIDER_NAME));
        };
        let Some(endpoint) = credentials.base_url.as_deref() else {
            return Err(Error::missing_config(PROVIDER_NAME, "endpoint base URL"));
        };

        let request = client
            .get(deployments_url(endpoint, &self.api_version(sources)))
            .timeout(self.request_timeout)
            .header("api-key", api_key.expose_secret());
        let body = fetch_listing(PROVIDER_NAME, request, cancel).await?;
        let deployments: Vec<Deployment> = parse_listing(PROVIDER_NAME, &body)?;

        Ok(deployments
            .into_iter()
            .map(Deployment::into_model_info)
            .collect())
    }

    fn build_instance(
        &self,
        model: &str,
        api_key: Secret<String>,
        base_url: Option<String>,
        sources: &CredentialSources<'_>,
    ) -> Result<ModelHandle> {
        let Some(endpoint) = base_url else {
            return Err(Error::missing_config(PROVIDER_NAME, "endpoint base URL"));
        };
        let api_version = self.api_version(sources);
        let client = ModelClient::azure(&endpoint, &api_key, model, &api_version);
        Ok(ModelHandle::new(PROVIDER_NAME, model, endpoint, client).with_api_version(api_version))
    }
}
