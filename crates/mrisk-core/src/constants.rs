//! Constants used throughout the risk core crate.

/// Environment variable naming an operator-supplied reference data file.
pub const REFERENCE_FILE_ENV: &str = "MRISK_REFERENCE_FILE";

/// Label used for the reference data compiled into the crate.
pub const SEEDED_REFERENCE_NAME: &str = "seeded";

/// Reference data compiled into the crate (categories, conditions, thresholds).
pub const SEEDED_REFERENCE_YAML: &str = include_str!("../reference/risk-reference.yaml");

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default gRPC listen address.
pub const DEFAULT_GRPC_ADDR: &str = "0.0.0.0:50051";

/// Upper bound for free-text clinical notes carried on an encounter.
pub const MAX_NOTE_CHARS: usize = 4_000;

/// Upper bound for the number of pre-existing conditions on one admission.
pub const MAX_CONDITION_IDS: usize = 64;
