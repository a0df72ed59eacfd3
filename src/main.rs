use anyhow::{anyhow, Context};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use submission_guard::{api::create_router, ApplicationBuilder, Config};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with structured logging
    init_tracing();

    info!("Starting submission guard service");

    // Load configuration; the builder validates it
    let config = Config::from_env();
    let listen_addr = config.listen_addr.clone();

    let app = ApplicationBuilder::new(config)
        .build()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    info!("Application initialized");

    let shutdown = CancellationToken::new();
    let sweeper = app.spawn_sweeper(shutdown.clone());
    if sweeper.is_some() {
        info!("Rate limit sweeper started");
    }

    let router = create_router(app.state);

    info!("Listening on {}", listen_addr);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    if let Some(handle) = sweeper {
        handle.await.context("rate limit sweeper panicked")?;
    }
    info!("Server stopped");

    Ok(())
}
