//! Model catalogs: the static list from the descriptor, extended by whatever
//! the provider's listing endpoint returns.

use std::collections::HashSet;

use {
    serde::de::DeserializeOwned,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    credentials::CredentialSources,
    descriptor::ModelInfo,
    error::{Error, Result},
    provider::Provider,
};

/// Append `dynamic` to `static_models`, dropping any entry whose name is
/// already present. Static entries always win; among dynamic entries the
/// first occurrence of a name wins.
pub fn merge_catalog(static_models: &[ModelInfo], dynamic: Vec<ModelInfo>) -> Vec<ModelInfo> {
    let mut seen: HashSet<String> = static_models.iter().map(|m| m.name.clone()).collect();
    let mut merged = static_models.to_vec();
    for model in dynamic {
        if model.name.trim().is_empty() || !seen.insert(model.name.clone()) {
            continue;
        }
        merged.push(model);
    }
    merged
}

/// Full catalog for a provider: static models plus any dynamic additions.
///
/// Missing credentials, a disabled fetch, cancellation, or any fetch failure
/// return the static list unchanged.
pub async fn resolve_catalog<P: Provider + ?Sized>(
    provider: &P,
    client: &reqwest::Client,
    sources: &CredentialSources<'_>,
    cancel: &CancellationToken,
) -> Vec<ModelInfo> {
    let descriptor = provider.descriptor();
    let static_models = &descriptor.static_models;

    if !sources.should_fetch_models(&descriptor.name) {
        debug!(provider = %descriptor.name, "model discovery disabled, using static catalog");
        return static_models.clone();
    }

    let credentials = sources.resolve(descriptor);
    if credentials.api_key.is_none() {
        debug!(provider = %descriptor.name, "no API key resolved, using static catalog");
        return static_models.clone();
    }
    if descriptor.requires_base_url && credentials.base_url.is_none() {
        debug!(provider = %descriptor.name, "no base URL resolved, using static catalog");
        return static_models.clone();
    }

    match provider
        .fetch_models(client, &credentials, sources, cancel)
        .await
    {
        Ok(dynamic) => {
            let merged = merge_catalog(static_models, dynamic);
            debug!(
                provider = %descriptor.name,
                model_count = merged.len(),
                "loaded model catalog"
            );
            merged
        },
        Err(err) => {
            warn!(
                provider = %descriptor.name,
                error = %err,
                "failed to fetch models, using static catalog"
            );
            static_models.clone()
        },
    }
}

/// Only the dynamic additions, i.e. entries that do not collide with the
/// static catalog. Empty on any failure.
pub async fn dynamic_models<P: Provider + ?Sized>(
    provider: &P,
    client: &reqwest::Client,
    sources: &CredentialSources<'_>,
    cancel: &CancellationToken,
) -> Vec<ModelInfo> {
    let static_len = provider.descriptor().static_models.len();
    let mut catalog = resolve_catalog(provider, client, sources, cancel).await;
    catalog.split_off(static_len)
}

/// Model listings arrive either wrapped as `{"data": [...]}` or as a bare array.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

/// Parse a listing body into its entries.
pub fn parse_listing<T: DeserializeOwned>(provider: &str, body: &str) -> Result<Vec<T>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::parse(provider, e))?;
    let listing: Listing<T> = serde_json::from_value(value).map_err(|e| Error::parse(provider, e))?;
    Ok(match listing {
        Listing::Wrapped { data } | Listing::Bare(data) => data,
    })
}

/// Send a listing request and return the body of a 2xx response.
///
/// Cancellation at any point is reported as a fetch failure.
pub async fn fetch_listing(
    provider: &str,
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<String> {
    let send = request.header("Accept", "application/json").send();
    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::fetch(provider, "cancelled")),
        response = send => response.map_err(|e| Error::fetch(provider, e))?,
    };
    let status = response.status();
    if !status.is_success() {
        return Err(Error::fetch(provider, format!("HTTP {status}")));
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::fetch(provider, "cancelled")),
        body = response.text() => body.map_err(|e| Error::fetch(provider, e)),
    }
}
