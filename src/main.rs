use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use beacon_line::api::{ApiServer, ApiState};
use beacon_line::config::{Config, default_config_path};
use beacon_line::security::compute_signature;

/// Beacon LINE - LINE bot relay to a tool-using chat model
#[derive(Parser)]
#[command(name = "beacon-line", version, about)]
struct Cli {
    /// Port to listen on (overrides `PORT` and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Path to config file
    #[arg(short, long, env = "BEACON_LINE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server (default)
    Serve,
    /// Load and validate configuration without starting the server
    CheckConfig,
    /// Print the `x-line-signature` value for a request body file
    Sign {
        /// File holding the raw request body
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,beacon_line=info",
        1 => "info,beacon_line=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load_from(&path)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CheckConfig => check_config(&config, &path),
        Command::Sign { file } => sign(&config, &file),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let server = config.server.clone();
    tracing::info!(port = server.port, "starting beacon-line");

    let state = ApiState::from_config(config)?;
    ApiServer::new(state, server.host, server.port).run().await?;

    Ok(())
}

fn check_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    config.validate()?;

    println!("config file:   {}", path.display());
    println!("listen:        {}:{}", config.server.host, config.server.port);
    println!("model:         {} ({})", config.llm.model, config.llm.base_url);
    println!("max tokens:    {}", config.llm.max_tokens);
    println!(
        "search:        {:?} ({})",
        config.search.provider,
        if config.search.api_key.is_some() {
            "enabled"
        } else {
            "no API key"
        }
    );
    println!(
        "trigger:       {}",
        config.line.trigger_prefix.as_deref().unwrap_or("(every message)")
    );
    println!("configuration OK");

    Ok(())
}

fn sign(config: &Config, file: &Path) -> anyhow::Result<()> {
    let secret = config
        .line
        .channel_secret
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("LINE_CHANNEL_SECRET is not set"))?;
    let body = std::fs::read(file)?;

    println!("{}", compute_signature(&body, secret.expose_secret()));
    Ok(())
}
