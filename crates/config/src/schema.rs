/// Config schema types (provider settings, server env mapping, status polling).
use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LodestarConfig {
    pub providers: ProvidersConfig,
    /// Server-side environment mapping, consulted after provider settings
    /// and before the process environment when resolving credentials.
    pub env: HashMap<String, String>,
    pub status: StatusConfig,
}

/// Timeouts applied to outbound status and catalog requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Per-request timeout for status pages, health endpoints and model listings.
    pub request_timeout_secs: u64,
    /// Timeout for the fallback reachability probe.
    pub probe_timeout_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            probe_timeout_secs: 5,
        }
    }
}

impl StatusConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Provider settings keyed by provider name (`azure-openai`, `granite`, `vertex-ai`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    #[serde(flatten)]
    pub providers: HashMap<String, ProviderEntry>,
}

/// Settings for a single provider.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEntry {
    /// Whether this provider is enabled. Defaults to true.
    pub enabled: bool,

    /// API key. Explicit per-call keys take precedence over this value.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,

    /// Override the base URL (Azure: the resource endpoint).
    pub base_url: Option<String>,

    /// API version sent with requests (Azure `api-version` query parameter).
    pub api_version: Option<String>,

    /// Cloud project id (Vertex AI).
    pub project_id: Option<String>,

    /// Deployment location / region (Vertex AI).
    pub location: Option<String>,

    /// Query the provider's model-listing endpoint. Defaults to true.
    pub fetch_models: bool,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("fetch_models", &self.fetch_models)
            .finish()
    }
}

impl Default for ProviderEntry {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            api_version: None,
            project_id: None,
            location: None,
            fetch_models: true,
        }
    }
}

/// Provider-specific settings beyond the key/url pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOption {
    ApiVersion,
    ProjectId,
    Location,
}

impl ProviderOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiVersion => "api_version",
            Self::ProjectId => "project_id",
            Self::Location => "location",
        }
    }
}

impl ProviderEntry {
    /// Raw value of an extra option, if set.
    pub fn option(&self, option: ProviderOption) -> Option<&str> {
        match option {
            ProviderOption::ApiVersion => self.api_version.as_deref(),
            ProviderOption::ProjectId => self.project_id.as_deref(),
            ProviderOption::Location => self.location.as_deref(),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

impl ProvidersConfig {
    /// Check if a provider is enabled (defaults to true if not configured).
    pub fn is_enabled(&self, name: &str) -> bool {
        self.providers.get(name).is_none_or(|e| e.enabled)
    }

    /// Whether dynamic model discovery should run for a provider.
    pub fn should_fetch_models(&self, name: &str) -> bool {
        self.providers.get(name).is_none_or(|e| e.fetch_models)
    }

    /// Get the configured entry for a provider, if any.
    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.get(name)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_entry_debug_redacts_key() {
        let entry = ProviderEntry {
            api_key: Some(Secret::new("sk-very-secret".into())),
            ..ProviderEntry::default()
        };
        let rendered = format!("{entry:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn unconfigured_provider_is_enabled_and_fetches() {
        let config = ProvidersConfig::default();
        assert!(config.is_enabled("granite"));
        assert!(config.should_fetch_models("granite"));
    }

    #[test]
    fn option_reads_matching_field() {
        let entry = ProviderEntry {
            project_id: Some("my-project".into()),
            location: Some("europe-west4".into()),
            ..ProviderEntry::default()
        };
        assert_eq!(entry.option(ProviderOption::ProjectId), Some("my-project"));
        assert_eq!(entry.option(ProviderOption::Location), Some("europe-west4"));
        assert_eq!(entry.option(ProviderOption::ApiVersion), None);
    }

    #[test]
    fn api_key_round_trips_through_toml() {
        let raw = r#"
            [providers.granite]
            api_key = "gk-123"
            fetch_models = false
        "#;
        let config: LodestarConfig = toml::from_str(raw).unwrap();
        let entry = config.providers.get("granite").unwrap();
        assert_eq!(entry.api_key.as_ref().unwrap().expose_secret(), "gk-123");
        assert!(!config.providers.should_fetch_models("granite"));

        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("gk-123"));
    }
}
