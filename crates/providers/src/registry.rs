//! Name-keyed registry of model providers.

use std::{collections::HashMap, sync::Arc};

use {
    lodestar_config::StatusConfig,
    lodestar_status::StatusCheckResult,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

use crate::{
    azure_openai::AzureOpenAiProvider,
    error::{Error, Result},
    granite::GraniteProvider,
    provider::Provider,
    vertex_ai::VertexAiProvider,
};

/// Registry of providers, iterated in registration order.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    order: Vec<String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.order)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Azure OpenAI, Granite and Vertex AI with default timeouts.
    pub fn builtin() -> Self {
        Self::builtin_with_timeouts(&StatusConfig::default())
    }

    pub fn builtin_with_timeouts(config: &StatusConfig) -> Self {
        let (request, probe) = (config.request_timeout(), config.probe_timeout());
        let mut registry = Self::empty();
        registry.register(Arc::new(
            AzureOpenAiProvider::new().with_timeouts(request, probe),
        ));
        registry.register(Arc::new(GraniteProvider::new().with_timeouts(request, probe)));
        registry.register(Arc::new(VertexAiProvider::new().with_timeouts(request, probe)));
        info!(providers = ?registry.order, "provider registry initialized");
        registry
    }

    /// Add a provider. Registering an existing name replaces it in place.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            debug!(provider = %name, "replaced registered provider");
        } else {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_provider(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.order.iter().filter_map(|name| self.providers.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check every provider concurrently. Results keep registration order.
    pub async fn check_all(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
    ) -> Vec<(String, StatusCheckResult)> {
        let checks = self.providers().map(|provider| async move {
            let result = provider.check_status(client, cancel).await;
            (provider.name().to_string(), result)
        });
        futures::future::join_all(checks).await
    }
}
