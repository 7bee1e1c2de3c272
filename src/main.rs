// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::control_service::CommandDispatcher;
use crate::application::dashboard_service::DashboardBuilder;
use crate::application::monitoring_service::MonitoringService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::simulated_hub::SimulatedHubTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    control_panel, health_check, monitoring_snapshot, monitoring_stream, send_command,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_app_config()?;

    // Initialize tracing, RUST_LOG takes precedence over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Create transport (infrastructure layer)
    let transport = Arc::new(SimulatedHubTransport::new(
        config.device.protocol.clone(),
        config.device.location.clone(),
    ));

    // Create services (application layer)
    let monitoring_service = MonitoringService::new(
        config.sampler.settings(),
        config.sampler.tick_interval(),
        DashboardBuilder::new((&config.summary).into()),
    );
    let dispatcher = CommandDispatcher::new(
        transport,
        config.control.initial_connection,
        config.control.timings(),
    );

    // Create application state
    let state = Arc::new(AppState {
        monitoring_service,
        dispatcher,
        device: config.device.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/monitoring", get(monitoring_snapshot))
        .route("/monitoring/stream", get(monitoring_stream))
        .route("/control", get(control_panel))
        .route("/control/commands/:command", post(send_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server.bind;
    tracing::info!(
        "Starting solar-dashboard on {} (tick every {:?}, {} connection)",
        addr,
        config.sampler.tick_interval(),
        config.control.initial_connection
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
