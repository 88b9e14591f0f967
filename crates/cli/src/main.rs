mod model_commands;
mod status_commands;

use std::{collections::HashMap, path::PathBuf};

use {
    clap::{Parser, Subcommand},
    lodestar_config::LodestarConfig,
    lodestar_providers::{CredentialSources, ProviderRegistry},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "lodestar", about = "Lodestar: model provider status and catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./lodestar.toml and ~/.config/lodestar/).
    #[arg(long, global = true, env = "LODESTAR_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered providers.
    Providers,
    /// Check provider health.
    Status {
        /// Only check this provider.
        #[arg(long)]
        provider: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show a provider's model catalog.
    Models {
        provider: String,
        #[command(flatten)]
        keys: model_commands::KeyArgs,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Build a model handle and describe it.
    Instance {
        provider: String,
        model: String,
        #[command(flatten)]
        keys: model_commands::KeyArgs,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Everything a command needs: settings, the captured environment, and the
/// provider registry built from them.
pub(crate) struct Context {
    pub config: LodestarConfig,
    pub process_env: HashMap<String, String>,
    pub registry: ProviderRegistry,
}

impl Context {
    fn load(config_path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => lodestar_config::load_config(path)?,
            None => lodestar_config::discover_and_load(),
        };
        let process_env: HashMap<String, String> = std::env::vars().collect();
        let registry = ProviderRegistry::builtin_with_timeouts(&config.status);
        debug!(
            providers = registry.len(),
            configured = config.providers.providers.len(),
            "context loaded"
        );
        Ok(Self {
            config,
            process_env,
            registry,
        })
    }

    /// Credential sources with an optional explicit tier on top.
    pub fn sources<'a>(
        &'a self,
        explicit: &'a HashMap<String, String>,
    ) -> CredentialSources<'a> {
        CredentialSources::default()
            .with_explicit(explicit)
            .with_settings(&self.config.providers)
            .with_server_env(&self.config.env)
            .with_process_env(&self.process_env)
    }
}

/// Token cancelled on Ctrl-C so in-flight checks and listings wind down
/// through their fallback paths.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight requests");
            child.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "lodestar starting");

    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Providers => {
            model_commands::list_providers(&ctx);
            Ok(())
        },
        Commands::Status { provider, json } => {
            let cancel = shutdown_token();
            status_commands::handle_status(&ctx, provider.as_deref(), json, &cancel).await
        },
        Commands::Models {
            provider,
            keys,
            json,
        } => {
            let cancel = shutdown_token();
            model_commands::handle_models(&ctx, &provider, &keys, json, &cancel).await
        },
        Commands::Instance {
            provider,
            model,
            keys,
        } => model_commands::handle_instance(&ctx, &provider, &model, &keys),
    }
}
