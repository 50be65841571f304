//! Standalone gRPC server binary.
//!
//! Runs only the gRPC service. The workspace's main `mrisk-run` binary runs both gRPC and REST
//! concurrently.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{pb::risk_server::RiskServer, AuthInterceptor, MriskService};
use api_shared::{ApiKey, HealthService, FILE_DESCRIPTOR_SET};
use mrisk_core::constants::{DEFAULT_GRPC_ADDR, REFERENCE_FILE_ENV};
use mrisk_core::{
    reference_file_from_env_value, resolve_reference_data, AdmissionWorkflow, CoreConfig,
    InMemoryEncounterStore, RiskService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_grpc=info".parse()?)
                .add_directive("mrisk_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("MRISK_GRPC_ADDR")
        .unwrap_or_else(|_| DEFAULT_GRPC_ADDR.into())
        .parse()?;

    let reference_file = reference_file_from_env_value(std::env::var(REFERENCE_FILE_ENV).ok());
    let cfg = CoreConfig::new(resolve_reference_data(reference_file)?);
    tracing::info!("-- Loaded reference data from {}", cfg.reference().source());

    let api_key = ApiKey::from_env_value(std::env::var("API_KEY").ok());
    if api_key.is_none() {
        tracing::warn!("API_KEY is not set; every gRPC request will be rejected");
    }

    let workflow = AdmissionWorkflow::new(
        RiskService::new(&cfg),
        Arc::new(InMemoryEncounterStore::new()),
    );
    let svc = MriskService::new(workflow, HealthService::new(cfg.shared_reference()));

    tracing::info!("-- Starting mrisk gRPC on {}", addr);

    let mut server_builder = Server::builder().add_service(RiskServer::with_interceptor(
        svc,
        AuthInterceptor::new(api_key),
    ));

    if std::env::var("MRISK_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true" {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;

    Ok(())
}
