//! # Rekaz to Hatif bridge
//!
//! Receives Rekaz reservation webhooks and sends the matching WhatsApp
//! notification through Hatif, and accepts Hatif delivery status callbacks.

pub mod config;
pub mod metric;
pub mod server;
pub mod webhook;
pub mod whatsapp;

use anyhow::Context;
use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;

use crate::{config::AppConfig, whatsapp::client::HatifClient};

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load()?;

    // Initialize logging and metrics
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if !app_config.logfire_token.is_empty() {
        logfire_config = logfire_config.with_token(&app_config.logfire_token);
    }
    let shutdown_handler = logfire_config.finish()?;

    app_config.log_summary();

    let hatif_client = HatifClient::new(&app_config).context("failed to build the Hatif client")?;

    configure_and_run_server(app_config, hatif_client).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Creates the per-worker application state
fn create_app_state(app_config: &AppConfig, hatif_client: HatifClient) -> server::AppState {
    server::AppState::new(app_config, Box::new(hatif_client))
}

/// Configures and starts the web server
async fn configure_and_run_server(
    app_config: AppConfig,
    hatif_client: HatifClient,
) -> anyhow::Result<()> {
    let server_addr = app_config.server_addr();
    tracing::info!(
        host = %server_addr.0,
        port = server_addr.1,
        "server_starting"
    );

    web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(create_app_state(&app_config, hatif_client.clone()))
            .configure(webhook::routes::rekaz)
            .configure(webhook::routes::hatif)
            .service(server::health)
            .default_service(web::route().to(server::serve_not_found))
    })
    .bind(server_addr)
    .context("failed to bind the web server address")?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
