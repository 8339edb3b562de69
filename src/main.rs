//! FedaPay relay server.
//!
//! Loads configuration from the environment, wires the default logging
//! handler, and serves the HTTP surface.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fedapay_relay::config::AppConfig;
use fedapay_relay::fedapay::{EventDispatcher, LoggingHandler};
use fedapay_relay::handlers::{app_router, AppState};

/// FedaPay payment relay
#[derive(Parser, Debug)]
#[command(name = "fp-relay")]
#[command(version)]
#[command(about = "Payment relay between a checkout frontend and FedaPay")]
struct Args {
    /// Port to listen on (overrides PORT from the environment)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; the verbose flag only sets the fallback level.
    let fallback = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    let config = AppConfig::from_env()?;
    let port = args.port.unwrap_or(config.server.port);

    let dispatcher = EventDispatcher::new(Arc::new(LoggingHandler));
    let state = Arc::new(AppState::new(&config, dispatcher)?);
    let app = app_router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", args.host, port);
    tracing::info!(
        version = fedapay_relay::VERSION,
        environment = config.provider.environment.as_str(),
        %addr,
        "FedaPay relay listening"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
