//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `mrisk-run` binary runs both gRPC and REST
//! concurrently.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, AppState};
use api_shared::HealthService;
use mrisk_core::constants::{DEFAULT_REST_ADDR, REFERENCE_FILE_ENV};
use mrisk_core::{
    reference_file_from_env_value, resolve_reference_data, AdmissionWorkflow, CoreConfig,
    InMemoryEncounterStore, RiskService,
};

/// Main entry point for the mrisk REST API server
///
/// # Environment Variables
/// - `MRISK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MRISK_REFERENCE_FILE`: Reference data YAML replacing the seeded categories and rules
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the reference data cannot be loaded,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("mrisk_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MRISK_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let reference_file = reference_file_from_env_value(std::env::var(REFERENCE_FILE_ENV).ok());
    let cfg = CoreConfig::new(resolve_reference_data(reference_file)?);
    tracing::info!("-- Loaded reference data from {}", cfg.reference().source());

    let workflow = AdmissionWorkflow::new(
        RiskService::new(&cfg),
        Arc::new(InMemoryEncounterStore::new()),
    );
    let app = build_router(AppState {
        workflow,
        health: HealthService::new(cfg.shared_reference()),
    });

    tracing::info!("-- Starting mrisk REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
