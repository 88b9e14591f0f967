//! Credential resolution over an explicit precedence chain.
//!
//! Nothing here reads the process environment; callers capture it and pass
//! it in as the last tier.

use std::collections::HashMap;

use {
    lodestar_config::{ProviderEntry, ProviderOption, ProvidersConfig},
    secrecy::{ExposeSecret, Secret},
};

use crate::descriptor::ProviderDescriptor;

/// Resolved `{base_url, api_key}` pair for one provider, computed per call.
#[derive(Clone, Default)]
pub struct Credentials {
    pub base_url: Option<String>,
    pub api_key: Option<Secret<String>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    /// Resolved base URL, or the provider's default when none was supplied.
    pub fn base_url_or(&self, default: Option<&str>) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| default.map(str::to_string))
    }
}

/// One source in the precedence chain, highest priority first.
#[derive(Clone, Copy)]
pub enum CredentialTier<'a> {
    /// Per-call keys. The API key is looked up under the provider name, then
    /// the token env key; the base URL under the base-url env key.
    Explicit(&'a HashMap<String, String>),
    /// The provider's settings entry.
    Settings(&'a ProviderEntry),
    /// Server-side environment mapping.
    ServerEnv(&'a HashMap<String, String>),
    /// Snapshot of the process environment.
    ProcessEnv(&'a HashMap<String, String>),
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

impl CredentialTier<'_> {
    fn api_key(&self, descriptor: &ProviderDescriptor) -> Option<String> {
        match self {
            Self::Explicit(map) => non_empty(map.get(&descriptor.name).map(String::as_str))
                .or_else(|| non_empty(map.get(&descriptor.api_key_env).map(String::as_str))),
            Self::Settings(entry) => {
                non_empty(entry.api_key.as_ref().map(|k| k.expose_secret().as_str()))
            },
            Self::ServerEnv(map) | Self::ProcessEnv(map) => {
                non_empty(map.get(&descriptor.api_key_env).map(String::as_str))
            },
        }
    }

    fn base_url(&self, descriptor: &ProviderDescriptor) -> Option<String> {
        match self {
            Self::Settings(entry) => non_empty(entry.base_url.as_deref()),
            Self::Explicit(map) | Self::ServerEnv(map) | Self::ProcessEnv(map) => {
                non_empty(map.get(&descriptor.base_url_env).map(String::as_str))
            },
        }
    }

    fn option(&self, option: ProviderOption, env_key: &str) -> Option<String> {
        match self {
            Self::Settings(entry) => non_empty(entry.option(option)),
            Self::Explicit(map) | Self::ServerEnv(map) | Self::ProcessEnv(map) => {
                non_empty(map.get(env_key).map(String::as_str))
            },
        }
    }
}

/// Pick `base_url` and `api_key` independently from the first tier that has
/// a non-empty value for each. Absent fields stay `None`.
pub fn resolve_credentials(
    descriptor: &ProviderDescriptor,
    tiers: &[CredentialTier<'_>],
) -> Credentials {
    Credentials {
        base_url: tiers.iter().find_map(|t| t.base_url(descriptor)),
        api_key: tiers
            .iter()
            .find_map(|t| t.api_key(descriptor))
            .map(Secret::new),
    }
}

/// Resolve a provider-specific extra setting with the same precedence rule.
pub fn resolve_option(
    tiers: &[CredentialTier<'_>],
    option: ProviderOption,
    env_key: &str,
) -> Option<String> {
    tiers.iter().find_map(|t| t.option(option, env_key))
}

/// Caller-supplied credential sources, turned into tiers per provider.
#[derive(Clone, Copy, Default)]
pub struct CredentialSources<'a> {
    pub explicit: Option<&'a HashMap<String, String>>,
    pub settings: Option<&'a ProvidersConfig>,
    pub server_env: Option<&'a HashMap<String, String>>,
    pub process_env: Option<&'a HashMap<String, String>>,
}

impl<'a> CredentialSources<'a> {
    #[must_use]
    pub fn with_explicit(mut self, explicit: &'a HashMap<String, String>) -> Self {
        self.explicit = Some(explicit);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: &'a ProvidersConfig) -> Self {
        self.settings = Some(settings);
        self
    }

    #[must_use]
    pub fn with_server_env(mut self, server_env: &'a HashMap<String, String>) -> Self {
        self.server_env = Some(server_env);
        self
    }

    #[must_use]
    pub fn with_process_env(mut self, process_env: &'a HashMap<String, String>) -> Self {
        self.process_env = Some(process_env);
        self
    }

    pub fn settings_for(&self, provider: &str) -> Option<&'a ProviderEntry> {
        self.settings.and_then(|s| s.get(provider))
    }

    pub fn should_fetch_models(&self, provider: &str) -> bool {
        self.settings
            .is_none_or(|s| s.should_fetch_models(provider))
    }

    /// Ordered tiers for `provider`; absent sources are skipped.
    pub fn tiers(&self, provider: &str) -> Vec<CredentialTier<'a>> {
        let mut tiers = Vec::with_capacity(4);
        if let Some(explicit) = self.explicit {
            tiers.push(CredentialTier::Explicit(explicit));
        }
        if let Some(entry) = self.settings_for(provider) {
            tiers.push(CredentialTier::Settings(entry));
        }
        if let Some(server_env) = self.server_env {
            tiers.push(CredentialTier::ServerEnv(server_env));
        }
        if let Some(process_env) = self.process_env {
            tiers.push(CredentialTier::ProcessEnv(process_env));
        }
        tiers
    }

    /// Resolve credentials for a descriptor from these sources.
    pub fn resolve(&self, descriptor: &ProviderDescriptor) -> Credentials {
        resolve_credentials(descriptor, &self.tiers(&descriptor.name))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new("granite", "Granite", "GRANITE_API_KEY", "GRANITE_API_BASE_URL")
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn key(credentials: &Credentials) -> Option<&str> {
        credentials.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    #[test]
    fn explicit_key_beats_process_env() {
        let explicit = map(&[("granite", "explicit-key")]);
        let process = map(&[("GRANITE_API_KEY", "process-key")]);
        let credentials = resolve_credentials(&descriptor(), &[
            CredentialTier::Explicit(&explicit),
            CredentialTier::ProcessEnv(&process),
        ]);
        assert_eq!(key(&credentials), Some("explicit-key"));
    }

    #[test]
    fn fields_resolve_independently() {
        let entry = ProviderEntry {
            base_url: Some("https://settings.example/v1".into()),
            ..ProviderEntry::default()
        };
        let server = map(&[
            ("GRANITE_API_KEY", "server-key"),
            ("GRANITE_API_BASE_URL", "https://server.example/v1"),
        ]);
        let credentials = resolve_credentials(&descriptor(), &[
            CredentialTier::Settings(&entry),
            CredentialTier::ServerEnv(&server),
        ]);
        assert_eq!(
            credentials.base_url.as_deref(),
            Some("https://settings.example/v1")
        );
        assert_eq!(key(&credentials), Some("server-key"));
    }

    #[test]
    fn empty_values_fall_through() {
        let explicit = map(&[("granite", "   "), ("GRANITE_API_BASE_URL", "")]);
        let entry = ProviderEntry {
            api_key: Some(Secret::new(String::new())),
            ..ProviderEntry::default()
        };
        let process = map(&[
            ("GRANITE_API_KEY", "process-key"),
            ("GRANITE_API_BASE_URL", "https://process.example"),
        ]);
        let credentials = resolve_credentials(&descriptor(), &[
            CredentialTier::Explicit(&explicit),
            CredentialTier::Settings(&entry),
            CredentialTier::ProcessEnv(&process),
        ]);
        assert_eq!(key(&credentials), Some("process-key"));
        assert_eq!(
            credentials.base_url.as_deref(),
            Some("https://process.example")
        );
    }

    #[test]
    fn explicit_tier_accepts_env_key_names() {
        let explicit = map(&[("GRANITE_API_KEY", "by-env-name")]);
        let credentials =
            resolve_credentials(&descriptor(), &[CredentialTier::Explicit(&explicit)]);
        assert_eq!(key(&credentials), Some("by-env-name"));
    }

    #[test]
    fn nothing_resolves_to_none() {
        let credentials = resolve_credentials(&descriptor(), &[]);
        assert!(credentials.api_key.is_none());
        assert!(credentials.base_url.is_none());
        assert_eq!(
            credentials.base_url_or(Some("https://api.granite.io/v1")),
            Some("https://api.granite.io/v1".to_string())
        );
    }

    #[test]
    fn option_prefers_settings_field_over_env() {
        let entry = ProviderEntry {
            project_id: Some("from-settings".into()),
            ..ProviderEntry::default()
        };
        let server = map(&[("VERTEX_AI_PROJECT_ID", "from-server")]);
        let tiers = [
            CredentialTier::Settings(&entry),
            CredentialTier::ServerEnv(&server),
        ];
        assert_eq!(
            resolve_option(&tiers, ProviderOption::ProjectId, "VERTEX_AI_PROJECT_ID").as_deref(),
            Some("from-settings")
        );
        assert_eq!(
            resolve_option(&tiers, ProviderOption::Location, "VERTEX_AI_LOCATION"),
            None
        );
    }

    #[test]
    fn sources_order_tiers_and_skip_missing() {
        let explicit = map(&[]);
        let process = map(&[("GRANITE_API_KEY", "p")]);
        let mut settings = ProvidersConfig::default();
        settings.providers.insert("granite".into(), ProviderEntry {
            api_key: Some(Secret::new("s".into())),
            ..ProviderEntry::default()
        });

        let sources = CredentialSources::default()
            .with_explicit(&explicit)
            .with_settings(&settings)
            .with_process_env(&process);
        let tiers = sources.tiers("granite");
        assert_eq!(tiers.len(), 3);
        assert!(matches!(tiers[0], CredentialTier::Explicit(_)));
        assert!(matches!(tiers[1], CredentialTier::Settings(_)));
        assert!(matches!(tiers[2], CredentialTier::ProcessEnv(_)));
        assert_eq!(key(&sources.resolve(&descriptor())), Some("s"));

        // Settings for another provider contribute no tier.
        assert_eq!(sources.tiers("vertex-ai").len(), 2);
    }

    #[rstest]
    #[case::explicit_first(Some("e"), Some("s"), Some("v"), Some("p"), Some("e"))]
    #[case::settings_second(None, Some("s"), Some("v"), Some("p"), Some("s"))]
    #[case::server_third(None, None, Some("v"), Some("p"), Some("v"))]
    #[case::process_last(None, None, None, Some("p"), Some("p"))]
    #[case::none(None, None, None, None, None)]
    fn api_key_follows_tier_order(
        #[case] explicit: Option<&str>,
        #[case] settings: Option<&str>,
        #[case] server: Option<&str>,
        #[case] process: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let explicit = map(&explicit.map(|k| ("granite", k)).into_iter().collect::<Vec<_>>());
        let entry = ProviderEntry {
            api_key: settings.map(|k| Secret::new(k.to_string())),
            ..ProviderEntry::default()
        };
        let server = map(&server.map(|k| ("GRANITE_API_KEY", k)).into_iter().collect::<Vec<_>>());
        let process = map(&process.map(|k| ("GRANITE_API_KEY", k)).into_iter().collect::<Vec<_>>());

        let credentials = resolve_credentials(&descriptor(), &[
            CredentialTier::Explicit(&explicit),
            CredentialTier::Settings(&entry),
            CredentialTier::ServerEnv(&server),
            CredentialTier::ProcessEnv(&process),
        ]);
        assert_eq!(key(&credentials), expected);
    }

    #[test]
    fn debug_redacts_key() {
        let credentials = Credentials {
            base_url: None,
            api_key: Some(Secret::new("top-secret".into())),
        };
        assert!(!format!("{credentials:?}").contains("top-secret"));
    }
}
