use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chirper_client::api::HttpApi;
use chirper_client::config::{AppConfig, CliConfig, FileConfig};
use chirper_client::session::{AuthState, Session};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Base URL of the REST API.
    #[clap(long)]
    pub api_url: Option<String>,

    /// URL of the realtime WebSocket endpoint.
    #[clap(long)]
    pub ws_url: Option<String>,

    /// Path to the persisted credential file.
    #[clap(long)]
    pub credentials: Option<PathBuf>,

    /// Seconds between reconnection attempts.
    #[clap(long)]
    pub reconnect_delay_secs: Option<u64>,

    /// Path to a TOML config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Email to log in with when no credential is stored.
    #[clap(long)]
    pub email: Option<String>,

    /// Password to log in with when no credential is stored.
    #[clap(long)]
    pub password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = AppConfig::resolve(
        &CliConfig {
            api_url: cli_args.api_url.clone(),
            ws_url: cli_args.ws_url.clone(),
            credentials_path: cli_args.credentials.clone(),
            reconnect_delay_secs: cli_args.reconnect_delay_secs,
        },
        file_config,
    )?;

    let api = Arc::new(HttpApi::new(config.api_url.clone()));
    let session = Session::new(&config, api);

    if session.resolve().await == AuthState::Unauthenticated {
        match (&cli_args.email, &cli_args.password) {
            (Some(email), Some(password)) => {
                info!("no stored credential, logging in as {}", email);
                session.login(email, password).await?;
            }
            _ => {
                anyhow::bail!(
                    "no stored credential found; pass --email and --password to log in"
                );
            }
        }
    }

    info!("session ready, waiting for events (ctrl-c to quit)");
    let mut toasts = session.notifications().toasts();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            toast = toasts.recv() => match toast {
                Ok(toast) => info!("{}: {}", toast.title, toast.description),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("dropped {} toasts, reader too slow", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    info!("shutting down");
    session.shutdown().await;
    Ok(())
}
