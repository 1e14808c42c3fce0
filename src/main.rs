mod config;
mod control;
mod daemon;
mod docker;
mod events;
mod notify;
mod router;
mod store;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::Level;

use crate::config::Config;
use crate::control::ControlService;
use crate::docker::DockerEngine;
use crate::events::EventListener;
use crate::notify::WebhookNotifier;
use crate::store::ConfigStore;

#[derive(Parser)]
#[command(name = "notifyd")]
#[command(about = "Docker container lifecycle notifier", long_about = None)]
struct Cli {
    /// Debug level logging
    #[arg(long = "dev")]
    dev: bool,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.dev { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    run(cli.config).await
}

async fn run(config: Config) -> anyhow::Result<()> {
    daemon::start::print_banner(&config);

    let rule = config.trigger_rule();
    let engine = Arc::new(
        DockerEngine::connect(config.docker_socket.as_deref(), rule.clone())
            .context("Failed to connect to Docker")?,
    );
    engine
        .check_docker()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Please ensure the Docker daemon is running and try again")?;

    if let Err(e) = daemon::start::check_storage(&config.data_dir).await {
        tracing::error!("Storage check failed, toggles will not persist: {}", e);
    }

    let store = Arc::new(ConfigStore::load(config.config_file()).await);
    tracing::info!("Restored {} container entries from {}", store.len().await, store.path().display());

    let notifier = Arc::new(WebhookNotifier::new(config.webhook()).context("Failed to build HTTP client")?);
    if !notifier.is_enabled() {
        tracing::warn!("No webhook configured, notifications will only be logged");
    }

    let template = config.template();
    tracing::info!("Message template: {}", template.as_str());

    let listener = EventListener::new(
        engine.clone(),
        store.clone(),
        notifier,
        rule.clone(),
        template,
    );
    let listener_task = tokio::spawn(listener.run());

    let service = Arc::new(ControlService::new(store, engine, rule));
    let app = router::api::api_router(service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Control API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    listener_task.abort();
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
