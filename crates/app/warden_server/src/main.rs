//! Warden API server binary.
//!
//! Loads configuration from the environment (and `.env`), wires the
//! in-memory stores into the router and serves until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use warden_api::config::ApiConfig;
use warden_core::audit::ActionLog;
use warden_core::guardrail::{Guardrail, GuardrailPolicy, InMemoryRateLimitStore};
use warden_core::notify::LogNotifier;
use warden_core::users::InMemoryUserStore;

/// How often idle rate-limit windows are reclaimed.
const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "warden_server", version, about = "Warden API server")]
struct Args {
    /// Address to listen on; overrides the configured bind address.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_api=debug,warden_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    info!(
        bind_addr = %config.bind_addr,
        production = config.production,
        admins = config.admin_user_ids.len(),
        "starting warden_server"
    );

    let rate_limits = Arc::new(InMemoryRateLimitStore::new());
    let _purge = rate_limits.spawn_purge_task(RATE_LIMIT_PURGE_INTERVAL);

    let state = warden_api::AppState {
        config: config.clone(),
        users: Arc::new(InMemoryUserStore::new()),
        notifier: Arc::new(LogNotifier),
        guardrail: Arc::new(Guardrail::new(GuardrailPolicy::default(), rate_limits)),
        actions: ActionLog::in_memory(),
    };

    let app = warden_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}
