use {
    lodestar_status::{StatusCheckResult, StatusChecker},
    secrecy::Secret,
    tokio_util::sync::CancellationToken,
};

use crate::{
    catalog,
    credentials::{CredentialSources, Credentials},
    descriptor::{ModelInfo, ProviderDescriptor},
    error::Result,
    instance::{self, ModelHandle},
};

/// Capability interface shared by every provider.
///
/// Implementors supply the provider-specific pieces (descriptor, status
/// checker, listing request, SDK construction); the provided methods wire
/// them to credential resolution and failure containment.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    fn status_checker(&self) -> &StatusChecker;

    /// Query the provider's model-listing endpoint. Only called once an API
    /// key has resolved; errors are absorbed by the catalog resolver.
    async fn fetch_models(
        &self,
        client: &reqwest::Client,
        credentials: &Credentials,
        sources: &CredentialSources<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ModelInfo>>;

    /// Validate provider-specific settings and construct the SDK handle.
    fn build_instance(
        &self,
        model: &str,
        api_key: Secret<String>,
        base_url: Option<String>,
        sources: &CredentialSources<'_>,
    ) -> Result<ModelHandle>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// One tiered health check. Never fails.
    async fn check_status(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
    ) -> StatusCheckResult {
        self.status_checker().check(client, cancel).await
    }

    /// Static catalog merged with dynamic additions. Never fails.
    async fn models(
        &self,
        client: &reqwest::Client,
        sources: &CredentialSources<'_>,
        cancel: &CancellationToken,
    ) -> Vec<ModelInfo> {
        catalog::resolve_catalog(self, client, sources, cancel).await
    }

    /// Dynamic additions only. Never fails.
    async fn dynamic_models(
        &self,
        client: &reqwest::Client,
        sources: &CredentialSources<'_>,
        cancel: &CancellationToken,
    ) -> Vec<ModelInfo> {
        catalog::dynamic_models(self, client, sources, cancel).await
    }

    fn model_instance(&self, model: &str, sources: &CredentialSources<'_>) -> Result<ModelHandle> {
        instance::model_instance(self, model, sources)
    }
}
