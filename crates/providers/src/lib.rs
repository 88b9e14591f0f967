//! Model provider descriptors, credential resolution, model catalogs, SDK
//! handles, and the registry that ties them to per-provider status checks.

pub mod azure_openai;
pub mod catalog;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod granite;
pub mod instance;
pub mod provider;
pub mod registry;
pub mod vertex_ai;

pub use {
    credentials::{CredentialSources, CredentialTier, Credentials, resolve_credentials, resolve_option},
    descriptor::{ModelInfo, ProviderDescriptor},
    error::{Error, Result},
    instance::{ModelClient, ModelHandle},
    provider::Provider,
    registry::ProviderRegistry,
};

/// Shared HTTP client for status checks and model listings.
///
/// Reusing one client shares connection pools, DNS cache, and TLS sessions
/// across providers.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
