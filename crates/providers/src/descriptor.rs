use serde::{Deserialize, Serialize};

/// Normalized description of one invokable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Unique key within a merged catalog.
    pub name: String,
    pub label: String,
    pub provider: String,
    pub max_token_allowed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
}

impl ModelInfo {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        provider: impl Into<String>,
        max_token_allowed: u32,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            provider: provider.into(),
            max_token_allowed,
            context_length: None,
        }
    }

    #[must_use]
    pub fn with_context_length(mut self, context_length: Option<u32>) -> Self {
        self.context_length = context_length;
        self
    }
}

/// Static configuration for one provider, fixed at startup.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Registry key and config section name (e.g. `azure-openai`).
    pub name: String,
    /// Human-readable name shown alongside models.
    pub display_name: String,
    /// Environment key holding the API token.
    pub api_key_env: String,
    /// Environment key holding the base URL override.
    pub base_url_env: String,
    pub default_base_url: Option<String>,
    pub api_version: Option<String>,
    /// The listing endpoint has no default host, so a catalog fetch needs a
    /// resolved base URL as well as a key.
    pub requires_base_url: bool,
    pub static_models: Vec<ModelInfo>,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        api_key_env: impl Into<String>,
        base_url_env: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            api_key_env: api_key_env.into(),
            base_url_env: base_url_env.into(),
            default_base_url: None,
            api_version: None,
            requires_base_url: false,
            static_models: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_default_base_url(mut self, url: impl Into<String>) -> Self {
        self.default_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn requiring_base_url(mut self) -> Self {
        self.requires_base_url = true;
        self
    }

    /// Attach a static catalog from `(name, label, max_tokens)` rows.
    #[must_use]
    pub fn with_static_models(mut self, models: &[(&str, &str, u32)]) -> Self {
        self.static_models = models
            .iter()
            .map(|(name, label, max_tokens)| ModelInfo::new(*name, *label, &self.name, *max_tokens))
            .collect();
        self
    }

    pub fn has_static_model(&self, name: &str) -> bool {
        self.static_models.iter().any(|m| m.name == name)
    }
}
