use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{AuthInterceptor, MriskService};
use api_rest::{AppState, build_router};
use api_shared::pb::risk_server::RiskServer;
use api_shared::{ApiKey, HealthService};
use mrisk_core::constants::{DEFAULT_GRPC_ADDR, DEFAULT_REST_ADDR, REFERENCE_FILE_ENV};
use mrisk_core::{
    AdmissionWorkflow, CoreConfig, InMemoryEncounterStore, RiskService,
    reference_file_from_env_value, resolve_reference_data,
};

/// Main entry point for the mrisk application
///
/// Starts both gRPC and REST servers concurrently over one admission store, so an admission
/// opened through one API is visible through the other.
///
/// The gRPC server requires authentication via x-api-key header.
///
/// # Environment Variables
/// - `MRISK_GRPC_ADDR`: gRPC server address (default: "0.0.0.0:50051")
/// - `MRISK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MRISK_REFERENCE_FILE`: Reference data YAML replacing the seeded categories and rules
/// - `API_KEY`: API key for gRPC authentication
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If configuration, server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mrisk_run=info".parse()?)
                .add_directive("mrisk_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("MRISK_GRPC_ADDR")
        .unwrap_or_else(|_| DEFAULT_GRPC_ADDR.into())
        .parse()?;
    let rest_addr = std::env::var("MRISK_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let reference_file = reference_file_from_env_value(std::env::var(REFERENCE_FILE_ENV).ok());
    let cfg = CoreConfig::new(resolve_reference_data(reference_file)?);
    tracing::info!("++ Loaded reference data from {}", cfg.reference().source());

    let api_key = ApiKey::from_env_value(std::env::var("API_KEY").ok());
    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; every gRPC request will be rejected");
    }

    let workflow = AdmissionWorkflow::new(
        RiskService::new(&cfg),
        Arc::new(InMemoryEncounterStore::new()),
    );
    let health = HealthService::new(cfg.shared_reference());

    tracing::info!("++ Starting mrisk gRPC on {}", grpc_addr);
    tracing::info!("++ Starting mrisk REST on {}", rest_addr);

    let rest_app = build_router(AppState {
        workflow: workflow.clone(),
        health: health.clone(),
    });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = async move { axum::serve(listener, rest_app).await };

    let grpc_server = Server::builder()
        .add_service(RiskServer::with_interceptor(
            MriskService::new(workflow, health),
            AuthInterceptor::new(api_key),
        ))
        .serve(grpc_addr);

    // Run both
    let (rest_result, grpc_result) = tokio::join!(rest_server, grpc_server);
    rest_result?;
    grpc_result?;

    Ok(())
}
