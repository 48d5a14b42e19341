mod cli;
mod config;
mod errors;
mod gateway;
mod matching;
mod models;
mod moderation;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::ApiError;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting console v{}", env!("CARGO_PKG_VERSION"));
    info!("backend: {}", config.api_base_url);

    let cli = cli::Cli::parse();
    let mut session = match &config.api_token {
        Some(token) => Session::with_token(token),
        None => Session::anonymous(),
    };

    if let Err(err) = cli::run(cli, &config, &session).await {
        if matches!(err.downcast_ref::<ApiError>(), Some(ApiError::AuthExpired)) {
            // The sign-in bounce, minus a browser: drop the credential and
            // tell the operator where to go.
            session.clear();
            eprintln!("Session expired; credential discarded. Sign in again and set API_TOKEN.");
            std::process::exit(2);
        }
        return Err(err);
    }

    Ok(())
}
