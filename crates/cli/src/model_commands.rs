use std::collections::HashMap;

use {
    anyhow::Result,
    clap::Args,
    lodestar_providers::{ModelInfo, Provider, shared_http_client},
    tokio_util::sync::CancellationToken,
};

use crate::Context;

/// Per-call credentials; these outrank settings and environment.
#[derive(Args, Debug, Default)]
pub struct KeyArgs {
    /// API key for this call only.
    #[arg(long)]
    pub api_key: Option<String>,
    /// Base URL for this call only.
    #[arg(long)]
    pub base_url: Option<String>,
}

impl KeyArgs {
    /// Explicit-tier map for `provider`: the key under the provider name and
    /// the URL under the provider's base-url env key.
    pub fn explicit(&self, provider: &dyn Provider) -> HashMap<String, String> {
        let descriptor = provider.descriptor();
        let mut map = HashMap::new();
        if let Some(key) = &self.api_key {
            map.insert(descriptor.name.clone(), key.clone());
        }
        if let Some(url) = &self.base_url {
            map.insert(descriptor.base_url_env.clone(), url.clone());
        }
        map
    }
}

pub fn list_providers(ctx: &Context) {
    println!(
        "{:<14} {:<14} {:<8} {:>6}  STATUS URL",
        "NAME", "DISPLAY", "ENABLED", "MODELS"
    );
    for provider in ctx.registry.providers() {
        let descriptor = provider.descriptor();
        println!(
            "{:<14} {:<14} {:<8} {:>6}  {}",
            descriptor.name,
            descriptor.display_name,
            if ctx.config.providers.is_enabled(&descriptor.name) {
                "yes"
            } else {
                "no"
            },
            descriptor.static_models.len(),
            provider.status_checker().status_url(),
        );
    }
}

pub async fn handle_models(
    ctx: &Context,
    name: &str,
    keys: &KeyArgs,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let provider = ctx.registry.get(name)?;
    let explicit = keys.explicit(provider.as_ref());
    let sources = ctx.sources(&explicit);

    let models = provider
        .models(shared_http_client(), &sources, cancel)
        .await;
    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        print_models(provider.descriptor().static_models.len(), &models);
    }
    Ok(())
}

fn print_models(static_len: usize, models: &[ModelInfo]) {
    println!("{:<32} {:<36} {:>8}  SOURCE", "NAME", "LABEL", "TOKENS");
    for (i, model) in models.iter().enumerate() {
        let source = if i < static_len {
            "static"
        } else {
            "dynamic"
        };
        println!(
            "{:<32} {:<36} {:>8}  {source}",
            model.name, model.label, model.max_token_allowed
        );
    }
}

pub fn handle_instance(ctx: &Context, name: &str, model: &str, keys: &KeyArgs) -> Result<()> {
    let provider = ctx.registry.get(name)?;
    let explicit = keys.explicit(provider.as_ref());
    let sources = ctx.sources(&explicit);

    let handle = provider.model_instance(model, &sources)?;
    println!("provider:    {}", handle.provider());
    println!("model:       {}", handle.model());
    println!("endpoint:    {}", handle.endpoint());
    if let Some(version) = handle.api_version() {
        println!("api version: {version}");
    }
    println!("client:      {}", handle.client().kind());
    Ok(())
}
