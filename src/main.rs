//! Sessionstore CLI - run as a Lambda function, serve over HTTP, or handle a single event

use clap::Parser;
use sessionstore::config::expand_path;
use sessionstore::{lambda, Config, Core};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sessionstore")]
#[command(author = "Storefront Team")]
#[command(version)]
#[command(about = "Sessionstore - session record service for the storefront", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.sessionstore/config.toml")]
    config: PathBuf,

    /// Handle one gateway event (JSON file, or "-" for stdin), print the response and exit
    #[arg(long, value_name = "FILE")]
    invoke: Option<PathBuf>,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,

    /// Serve invocations from the Lambda Runtime API (implied when AWS_LAMBDA_RUNTIME_API is set)
    #[arg(long)]
    lambda: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let lambda_mode = args.lambda || lambda::is_lambda_environment();

    if lambda_mode {
        // Honors AWS_LAMBDA_LOG_LEVEL / AWS_LAMBDA_LOG_FORMAT from the function config
        lambda_runtime::tracing::init_default_subscriber();
    } else {
        // Logs go to stderr so --invoke output stays clean on stdout
        let log_level = if args.verbose { "debug" } else { "info" };
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!("sessionstore={},tower_http=debug", log_level).into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config_path = expand_path(&args.config);

    // Handle --init flag
    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::warn!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };
    config.apply_env_overrides();

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let core = Core::new(config)?;

    if lambda_mode {
        core.run_lambda().await?;
    } else if let Some(source) = args.invoke {
        let event = read_event(&source).await?;
        let response = core.invoke(&event).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        tracing::info!("Starting HTTP server mode");
        core.start_api_server().await?;
    }

    Ok(())
}

/// Read the event JSON from a file, or stdin for "-"
async fn read_event(source: &Path) -> anyhow::Result<String> {
    if source.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        Ok(tokio::fs::read_to_string(expand_path(source)).await?)
    }
}
