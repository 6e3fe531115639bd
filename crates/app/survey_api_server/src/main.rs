//! Survey kiosk proxy server binary.
//!
//! Serves the submission proxy, token issuer and signed QR redirect, and
//! purges expired one-time tokens in the background.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use survey_api::AppState;
use survey_api::config::ApiConfig;
use survey_api::services::tokens::TokenStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,survey_api=debug,survey_core=debug";

/// CLI arguments for the proxy server.
#[derive(Parser, Debug)]
#[command(name = "survey_api_server", about = "Survey kiosk proxy server")]
struct Args {
    /// Address to listen on. Overrides `BIND_ADDR`.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Seconds between sweeps of expired one-time tokens.
    #[arg(long, env = "TOKEN_PURGE_INTERVAL_SECS", default_value_t = 300)]
    purge_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if config.access_key.is_empty() {
        warn!("ACCESS_KEY is not set; supporter requests will be refused");
    }
    if config.flow_url.is_empty() {
        warn!("FLOW_URL is not set; submissions will not be forwarded");
    }
    if config.page_url.is_none() {
        warn!("SURVEY_PAGE_URL is not set; QR scans cannot be redirected");
    }

    info!(
        version = survey_api::version(),
        bind = %config.bind_addr,
        public_base_url = %config.public_base_url,
        "starting survey_api_server"
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let state = AppState::new(config);
    let ct = CancellationToken::new();
    let purge_handle = tokio::spawn(purge_expired_tokens(
        state.tokens.clone(),
        Duration::from_secs(args.purge_interval_secs.max(1)),
        ct.clone(),
    ));

    let app = survey_api::router(state);
    info!(addr = %local_addr, "proxy listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    ct.cancel();
    let _ = purge_handle.await;
    info!("proxy stopped");

    result?;
    Ok(())
}

/// Periodically drop expired tokens until cancelled.
async fn purge_expired_tokens(tokens: Arc<TokenStore>, every: Duration, ct: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ct.cancelled() => break,
            _ = interval.tick() => {
                let removed = tokens.purge_expired(chrono::Utc::now());
                if removed > 0 {
                    info!(removed, remaining = tokens.len(), "purged expired tokens");
                } else {
                    debug!(remaining = tokens.len(), "no expired tokens");
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
