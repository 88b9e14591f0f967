//! Opaque model handles backed by vendor SDK clients.

use {
    async_openai::config::{AzureConfig, OpenAIConfig},
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{
    credentials::CredentialSources,
    error::{Error, Result},
    provider::Provider,
};

/// SDK client behind a [`ModelHandle`].
#[derive(Clone)]
pub enum ModelClient {
    /// OpenAI-compatible endpoint.
    OpenAi(async_openai::Client<OpenAIConfig>),
    /// Azure OpenAI deployment.
    Azure(async_openai::Client<AzureConfig>),
    /// Google models through `genai`.
    Genai(genai::Client),
}

impl ModelClient {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Azure(_) => "azure-openai",
            Self::Genai(_) => "genai",
        }
    }

    /// OpenAI-compatible client pointed at `base_url`.
    pub fn openai_compatible(base_url: &str, api_key: &Secret<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(base_url);
        Self::OpenAi(async_openai::Client::with_config(config))
    }

    /// Azure OpenAI client for one deployment.
    pub fn azure(
        endpoint: &str,
        api_key: &Secret<String>,
        deployment: &str,
        api_version: &str,
    ) -> Self {
        let config = AzureConfig::new()
            .with_api_base(endpoint)
            .with_api_key(api_key.expose_secret())
            .with_deployment_id(deployment)
            .with_api_version(api_version);
        Self::Azure(async_openai::Client::with_config(config))
    }

    /// `genai` client whose requests go to `base_url` with the key handed
    /// over through its resolvers, so no environment variable has to be set.
    ///
    /// `genai` appends `models/{model}:…` to the base URL, which must end
    /// with a slash.
    pub fn genai(base_url: &str, api_key: &Secret<String>) -> Self {
        let auth_key = api_key.expose_secret().clone();
        let target_key = auth_key.clone();
        let base_url = base_url.to_string();
        let client = genai::Client::builder()
            .with_auth_resolver(genai::resolver::AuthResolver::from_resolver_fn(
                move |_model_iden| Ok(Some(genai::resolver::AuthData::from_single(auth_key.clone()))),
            ))
            .with_service_target_resolver(genai::resolver::ServiceTargetResolver::from_resolver_fn(
                move |target: genai::ServiceTarget| -> std::result::Result<
                    genai::ServiceTarget,
                    genai::resolver::Error,
                > {
                    Ok(genai::ServiceTarget {
                        endpoint: genai::resolver::Endpoint::from_owned(base_url.clone()),
                        auth: genai::resolver::AuthData::from_single(target_key.clone()),
                        model: target.model,
                    })
                },
            ))
            .build();
        Self::Genai(client)
    }
}

/// Validated, ready-to-use model handle. Construction performs no I/O.
#[derive(Clone)]
pub struct ModelHandle {
    provider: String,
    model: String,
    endpoint: String,
    api_version: Option<String>,
    client: ModelClient,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("client", &self.client.kind())
            .finish()
    }
}

impl ModelHandle {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        client: ModelClient,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            api_version: None,
            client,
        }
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn client(&self) -> &ModelClient {
        &self.client
    }

    pub fn into_client(self) -> ModelClient {
        self.client
    }
}

/// Resolve credentials and hand them to the provider's SDK constructor.
///
/// Fails with [`Error::MissingCredential`] before anything is built when no
/// tier yields an API key.
pub fn model_instance<P: Provider + ?Sized>(
    provider: &P,
    model: &str,
    sources: &CredentialSources<'_>,
) -> Result<ModelHandle> {
    let descriptor = provider.descriptor();
    let credentials = sources.resolve(descriptor);
    let Some(api_key) = credentials.api_key else {
        return Err(Error::missing_credential(&descriptor.name));
    };

    let handle = provider.build_instance(model, api_key, credentials.base_url, sources)?;
    debug!(
        provider = %descriptor.name,
        model,
        endpoint = handle.endpoint(),
        "built model handle"
    );
    Ok(handle)
}
