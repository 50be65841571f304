//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables or touches the filesystem.

use crate::reference::ReferenceData;
use crate::{RiskError, RiskResult};
use std::path::PathBuf;
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    reference: Arc<ReferenceData>,
}

impl CoreConfig {
    pub fn new(reference: ReferenceData) -> Self {
        Self {
            reference: Arc::new(reference),
        }
    }

    /// Configuration backed by the reference data compiled into the crate.
    pub fn seeded() -> RiskResult<Self> {
        Ok(Self::new(ReferenceData::seeded()?))
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn shared_reference(&self) -> Arc<ReferenceData> {
        self.reference.clone()
    }
}

/// Interpret the raw value of `MRISK_REFERENCE_FILE`.
///
/// `None`, empty or whitespace-only values mean "use the seeded reference data".
pub fn reference_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Load reference data, preferring an operator override.
///
/// # Errors
///
/// Returns [`RiskError::InvalidInput`] if the override is not a regular file, or any load error
/// from [`ReferenceData`].
pub fn resolve_reference_data(override_file: Option<PathBuf>) -> RiskResult<ReferenceData> {
    match override_file {
        Some(path) => {
            if !path.is_file() {
                return Err(RiskError::InvalidInput(format!(
                    "reference file override is not a file: {}",
                    path.display()
                )));
            }
            ReferenceData::from_file(&path)
        }
        None => ReferenceData::seeded(),
    }
}
