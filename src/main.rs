use std::sync::Arc;

use anyhow::Context;
use octocrab::Octocrab;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cherry_picker::config::BotConfig;
use cherry_picker::dispatch::Dispatcher;
use cherry_picker::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cherry_picker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "Starting cherry-picker");

    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("creating {}", config.work_dir.display()))?;

    let octocrab = Octocrab::builder()
        .personal_token(config.github_token.clone())
        .build()
        .context("building GitHub client")?;

    let addr = config.listen_addr;
    let secret = config.webhook_secret.clone().into_bytes();
    let dispatcher = Dispatcher::new(octocrab, config);
    let app = build_router(AppState::new(secret, Arc::new(dispatcher.clone())));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {}", addr);

    let intake = dispatcher.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            intake.close();
        })
        .await
        .context("serving HTTP")?;

    dispatcher.drain().await;
    tracing::info!("All events finished");

    Ok(())
}
