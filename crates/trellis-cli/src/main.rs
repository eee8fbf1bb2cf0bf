use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use trellis_core::{ChatRequest, RequestOrigin};
use trellis_dispatch::{Command, DispatchConfig, DispatchOutcome, Dispatcher};
use trellis_llm::{ModelCatalog, ModelRouter};
use trellis_metrics::MetricsAggregator;
use trellis_store::{SessionStore, StoreConfig};

#[derive(Parser)]
#[command(name = "trellis-cli")]
#[command(about = "Terminal chat against the trellis gateway engine")]
#[command(version)]
struct Cli {
    /// Databricks workspace host
    #[arg(long, env = "DATABRICKS_HOST", default_value = "")]
    databricks_host: String,

    /// Path to a model catalog JSON file (replaces the builtin table)
    #[arg(long, env = "MODEL_CATALOG")]
    model_catalog: Option<PathBuf>,

    /// Starting model alias
    #[arg(long, env = "DEFAULT_MODEL", default_value = "maverick")]
    model: String,

    /// Seconds allowed for one backend invocation
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    request_timeout_secs: u64,

    /// Enable debug output
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message content
        message: String,
        /// Conversation thread to continue
        #[arg(long)]
        thread: Option<String>,
        /// Model alias for this message
        #[arg(long)]
        model: Option<String>,
    },
    /// List the configured models
    Models,
}

struct Engine {
    dispatcher: Arc<Dispatcher>,
    router: Arc<ModelRouter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
    }

    match &cli.command {
        Commands::Chat => run_interactive_chat(&cli).await,
        Commands::Send {
            message,
            thread,
            model,
        } => send_once(&cli, message, thread.clone(), model.clone()).await,
        Commands::Models => list_models(&cli),
    }
}

fn load_catalog(cli: &Cli) -> anyhow::Result<ModelCatalog> {
    match &cli.model_catalog {
        Some(path) => ModelCatalog::from_file(path),
        None => Ok(ModelCatalog::builtin(&workspace_url(&cli.databricks_host))),
    }
}

fn workspace_url(host: &str) -> String {
    let trimmed = host.trim();
    if trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn build_engine(cli: &Cli) -> anyhow::Result<Engine> {
    let catalog = load_catalog(cli)?;
    let default_alias = cli.model.to_lowercase();
    if catalog.get(&default_alias).is_none() {
        anyhow::bail!(
            "model '{}' is not in the catalog (run `trellis-cli models`)",
            cli.model
        );
    }

    let router = Arc::new(ModelRouter::from_env(catalog));
    let store = Arc::new(SessionStore::new(StoreConfig {
        default_alias,
        max_turns: 40,
    }));
    let metrics = Arc::new(MetricsAggregator::new());
    let config = DispatchConfig {
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
        ..Default::default()
    };
    let dispatcher = Arc::new(Dispatcher::new(store, router.clone(), metrics, config));

    Ok(Engine { dispatcher, router })
}

fn require_credentials(engine: &Engine) {
    if engine.router.has_credentials() {
        return;
    }
    println!("{}", "Error: Missing Databricks credentials!".red());
    println!("Set DATABRICKS_HOST and DATABRICKS_TOKEN in the environment.");
    std::process::exit(1);
}

fn list_models(cli: &Cli) -> anyhow::Result<()> {
    let catalog = load_catalog(cli)?;
    print_models(&catalog);
    Ok(())
}

fn print_models(catalog: &ModelCatalog) {
    println!("{}", "Available Models:".yellow());
    for (alias, model_id) in catalog.alias_table() {
        let marker = if alias == catalog.default_alias() {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {}{} {}",
            alias.bold(),
            marker,
            format!("({model_id})").dimmed()
        );
    }
}

fn print_reply_footer(alias: &str, tokens: u64, elapsed_ms: u64) {
    println!(
        "{}",
        format!("[{alias} | {tokens} tokens | {elapsed_ms}ms]").dimmed()
    );
}

async fn send_once(
    cli: &Cli,
    message: &str,
    thread: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let engine = build_engine(cli)?;
    require_credentials(&engine);

    let thread_key = thread.unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));
    if cli.debug {
        eprintln!("{}", format!("[DEBUG] Thread: {thread_key}").dimmed());
    }

    let mut request = ChatRequest::new(RequestOrigin::Cli, thread_key, "cli", message);
    if let Some(model) = model {
        request = request.with_alias(model);
    }

    match engine.dispatcher.dispatch(request).await {
        DispatchOutcome::Reply(reply) => {
            println!("{}", reply.text);
            print_reply_footer(&reply.alias, reply.usage.total(), reply.elapsed_ms);
            Ok(())
        }
        DispatchOutcome::Failed { message, .. } => {
            println!("{}", format!("❌ {message}").red());
            std::process::exit(1);
        }
    }
}

async fn run_interactive_chat(cli: &Cli) -> anyhow::Result<()> {
    let engine = build_engine(cli)?;
    require_credentials(&engine);

    let thread_key = format!("cli-{}", uuid::Uuid::new_v4());

    println!();
    println!("{}", "=".repeat(60).blue().bold());
    println!("{}", "  Trellis - Terminal Chat".blue().bold());
    println!("{}", "=".repeat(60).blue().bold());
    println!();
    print_models(engine.router.catalog());
    println!();
    println!("{}", "Commands:".yellow());
    println!("  type a message and press Enter to chat");
    println!("  'models' lists models, 'switch <alias>' changes model");
    println!("  'clear' resets the conversation, 'quit' leaves");
    println!();

    if cli.debug {
        eprintln!("{}", format!("[DEBUG] Thread: {thread_key}").dimmed());
    }

    loop {
        print!("{} ", "You:".green().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("\n{}", "Thanks for chatting! Goodbye!".blue());
            break;
        }

        if let Some(command) = repl_command(input) {
            let reply = engine.dispatcher.execute_command(&thread_key, command).await;
            println!("{reply}\n");
            continue;
        }

        print!("{} ", "Assistant:".blue().bold());
        io::stdout().flush()?;

        let request = ChatRequest::new(RequestOrigin::Cli, thread_key.as_str(), "cli", input);
        match engine.dispatcher.dispatch(request).await {
            DispatchOutcome::Reply(reply) => {
                println!("{}", reply.text);
                print_reply_footer(&reply.alias, reply.usage.total(), reply.elapsed_ms);
                println!();
            }
            DispatchOutcome::Failed { message, .. } => {
                println!("{}", format!("❌ {message}").red());
                println!();
            }
        }
    }

    Ok(())
}

/// REPL spelling on top of the shared command set: `switch <alias>` is the
/// terminal name for `use <alias>`, bare `switch` shows the choices.
fn repl_command(input: &str) -> Option<Command> {
    let lower = input.trim().to_lowercase();
    if let Some(alias) = lower.strip_prefix("switch ") {
        let alias = alias.trim();
        if !alias.is_empty() {
            return Some(Command::Use(alias.to_string()));
        }
    }
    if lower == "switch" {
        return Some(Command::Models);
    }
    Command::parse(input)
}
