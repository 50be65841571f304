//! # API Shared
//!
//! Shared utilities and definitions for the mrisk APIs.
//!
//! Contains:
//! - Protobuf-generated types (`pb` module)
//! - Conversions between the wire types and `mrisk-core` types
//! - Shared services like `HealthService`
//! - API key checking
//!
//! Used by `api-grpc` and `api-rest` for common functionality.

// Re-export the generated protobuf module. The generated code will be placed
// into OUT_DIR at build time by the build script.
pub mod pb {
    tonic::include_proto!("mrisk.v1");
}

pub mod auth;
pub mod convert;
pub mod health;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("proto_descriptor");

pub use auth::ApiKey;
pub use health::HealthService;
pub use pb::*;
