//! # API gRPC
//!
//! gRPC server implementation for mrisk.
//!
//! Handles:
//! - gRPC service setup and authentication
//! - Service implementations delegating to `mrisk-core` workflows
//! - Mapping core errors onto gRPC status codes
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

pub use service::{status_from_error, AuthInterceptor, MriskService};
pub use api_shared::pb;

pub mod service;
