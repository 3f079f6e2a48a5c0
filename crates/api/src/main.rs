//! medcoord binary.
//!
//! Usage:
//!   medcoord serve --port 8080
//!   medcoord --config medcoord.toml serve --bind 0.0.0.0
//!   medcoord --provider offline chat
//!
//! # Environment Variables
//!
//! - `MEDCOORD_CONFIG` - Path to the TOML configuration
//! - `MEDCOORD_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `MEDCOORD_CORS_ORIGINS` - CORS allowed origins (comma-separated)
//! - `GEMINI_API_KEY` / `OPENAI_API_KEY` - Model provider credentials

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use medcoord_api::{AppState, repl, serve};
use medcoord_coordinator::{CoordinatorConfig, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "medcoord")]
#[command(about = "Hospital coordinator that delegates requests to mock sub-agents")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(short, long, env = "MEDCOORD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the provider type (gemini, openai, offline)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Override the model name
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve(ServeArgs),
    /// Chat with the coordinator in the terminal
    Chat,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Bind address
    #[arg(short, long, env = "MEDCOORD_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: std::env::var("MEDCOORD_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".into()),
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<CoordinatorConfig> {
    let mut config = if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "Loading configuration");
        CoordinatorConfig::from_file(path)?
    } else {
        tracing::info!("Using default configuration");
        CoordinatorConfig::default()
    };

    if let Some(provider) = &cli.provider {
        config.provider.provider_type = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Chat) => {
            // Keep the terminal readable: only warnings unless RUST_LOG says otherwise.
            init_tracing("warn");
            let config = load_config(&cli)?;
            let session = Session::from_config(&config)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl::run(&session, stdin, tokio::io::stdout()).await?;
        }
        Some(Command::Serve(ref args)) => {
            init_tracing("info,medcoord_api=debug,tower_http=debug");
            run_server(&cli, args).await?;
        }
        None => {
            init_tracing("info,medcoord_api=debug,tower_http=debug");
            run_server(&cli, &ServeArgs::default()).await?;
        }
    }

    Ok(())
}

async fn run_server(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    if args.bind == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0 exposes the API to all network interfaces. \
             There is no authentication; keep it behind a firewall."
        );
    }

    let cors_origins: Option<Vec<String>> = std::env::var("MEDCOORD_CORS_ORIGINS")
        .ok()
        .map(|s| s.split(',').map(|o| o.trim().to_string()).collect());

    let config = load_config(cli)?;
    let state = AppState::new(config)?;

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    serve(Arc::new(state), addr, cors_origins).await
}
