// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::file_template_repository::FileTemplateRepository;
use crate::infrastructure::prometheus_backend::PrometheusBackend;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_runtimes, health_check};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository and metrics backend (infrastructure layer)
    let repository = Arc::new(FileTemplateRepository::new(config.templates.directory.clone()));
    let backend = Arc::new(PrometheusBackend::new(
        config.prometheus.url.clone(),
        Duration::from_secs(config.prometheus.timeout_seconds),
    )?);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        repository,
        backend,
        config.dashboards.global_namespace.clone(),
        &config.dashboards.namespace_label,
    );

    // Create application state
    let state = Arc::new(AppState::new(
        dashboard_service,
        &config.dashboards.raw_data_aggregator,
    ));

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/namespaces/:namespace/dashboards/:template", get(get_dashboard))
        .route("/namespaces/:namespace/apps/:app/runtimes", get(get_runtimes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server.address))?;
    tracing::info!(
        "Starting runtime-dashboards on {} (templates: {}, prometheus: {})",
        addr,
        config.templates.directory,
        config.prometheus.url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
