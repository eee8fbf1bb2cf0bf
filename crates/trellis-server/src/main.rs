use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use trellis_dispatch::{spawn_maintenance, DispatchConfig, Dispatcher};
use trellis_events::{EventListener, ListenerConfig};
use trellis_llm::{ModelCatalog, ModelRouter};
use trellis_metrics::MetricsAggregator;
use trellis_server::logging::init_logging;
use trellis_server::{run_server, AppState};
use trellis_store::{SessionStore, StoreConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "trellis")]
#[command(about = "Trellis conversational gateway")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Databricks workspace host, e.g. my-workspace.cloud.databricks.com
    #[arg(long, env = "DATABRICKS_HOST", default_value = "")]
    databricks_host: String,

    /// Path to a model catalog JSON file (replaces the builtin table)
    #[arg(long, env = "MODEL_CATALOG")]
    model_catalog: Option<PathBuf>,

    /// Alias assigned to new conversations
    #[arg(long, env = "DEFAULT_MODEL", default_value = "maverick")]
    default_model: String,

    /// System prompt prepended to every invocation
    #[arg(long, env = "SYSTEM_PROMPT")]
    system_prompt: Option<String>,

    /// Turns kept per conversation before the oldest are dropped
    #[arg(long, env = "MAX_TURNS", default_value = "40")]
    max_turns: usize,

    /// Seconds of inactivity before a conversation is evicted
    #[arg(long, env = "THREAD_TTL_SECS", default_value = "21600")]
    thread_ttl_secs: u64,

    /// Seconds allowed for one backend invocation
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    request_timeout_secs: u64,

    /// Platform event feed URL
    #[arg(long, env = "PLATFORM_EVENTS_URL")]
    platform_events_url: Option<String>,

    /// App-level token for the event feed connection
    #[arg(long, env = "PLATFORM_APP_TOKEN")]
    platform_app_token: Option<String>,

    /// Bot token for posting replies
    #[arg(long, env = "PLATFORM_BOT_TOKEN")]
    platform_bot_token: Option<String>,

    /// chat.postMessage-compatible endpoint for replies
    #[arg(
        long,
        env = "PLATFORM_POST_URL",
        default_value = "https://slack.com/api/chat.postMessage"
    )]
    platform_post_url: String,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.log_level.is_some() {
        env_logger::init();
    } else {
        init_logging(cli.debug);
    }

    let catalog = load_catalog(&cli);

    log::info!("Starting trellis gateway on port {}", cli.port);
    log::info!(
        "Model catalog: {} models, default '{}'",
        catalog.len(),
        catalog.default_alias()
    );
    if cli.databricks_host.trim().is_empty() && cli.model_catalog.is_none() {
        log::warn!("DATABRICKS_HOST is not set; builtin endpoint URLs will not resolve");
    }
    if catalog.get(&cli.default_model).is_none() {
        log::warn!("default model '{}' is not in the catalog", cli.default_model);
    }

    let router = Arc::new(ModelRouter::from_env(catalog));
    let store = Arc::new(SessionStore::new(StoreConfig {
        default_alias: cli.default_model.clone(),
        max_turns: cli.max_turns,
    }));
    let metrics = Arc::new(MetricsAggregator::new());

    let mut config = DispatchConfig {
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
        thread_ttl: Duration::from_secs(cli.thread_ttl_secs),
        ..DispatchConfig::default()
    };
    if let Some(prompt) = cli.system_prompt.clone() {
        config.system_prompt = prompt;
    }

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        router.clone(),
        metrics.clone(),
        config,
    ));

    spawn_maintenance(store.clone(), metrics.clone(), dispatcher.config());

    let platform_configured = spawn_listener(&cli, dispatcher.clone());

    let state = AppState::new(store, router, metrics, dispatcher, platform_configured);
    run_server(cli.port, state).await
}

fn load_catalog(cli: &Cli) -> ModelCatalog {
    if let Some(path) = &cli.model_catalog {
        match ModelCatalog::from_file(path) {
            Ok(catalog) => return catalog,
            Err(err) => {
                log::warn!(
                    "failed to load model catalog from {}: {err}; using builtin table",
                    path.display()
                );
            }
        }
    }
    ModelCatalog::builtin(&workspace_url(&cli.databricks_host))
}

/// Bare hostnames are accepted in DATABRICKS_HOST; endpoint URLs need the
/// scheme.
fn workspace_url(host: &str) -> String {
    let trimmed = host.trim();
    if trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Starts the platform event listener when the feed URL and both tokens are
/// present. Returns whether it was started.
fn spawn_listener(cli: &Cli, dispatcher: Arc<Dispatcher>) -> bool {
    match (
        &cli.platform_events_url,
        &cli.platform_app_token,
        &cli.platform_bot_token,
    ) {
        (Some(events_url), Some(app_token), Some(bot_token)) => {
            let config = ListenerConfig {
                events_url: events_url.clone(),
                app_token: app_token.clone(),
                post_url: cli.platform_post_url.clone(),
                bot_token: bot_token.clone(),
            };
            let listener = EventListener::new(config, dispatcher);
            tokio::spawn(async move { listener.run().await });
            log::info!("platform event listener enabled");
            true
        }
        (None, None, None) => {
            log::info!("platform tokens not set; serving HTTP only");
            false
        }
        _ => {
            log::warn!(
                "partial platform configuration; event listener disabled \
                 (set PLATFORM_EVENTS_URL, PLATFORM_APP_TOKEN and PLATFORM_BOT_TOKEN)"
            );
            false
        }
    }
}
