//! Reference data loading.
//!
//! Categories, conditions and threshold rules are read from one YAML document, either the copy
//! compiled into this crate or an operator-supplied file, and validated as a whole before any
//! request is served.

use crate::conditions::{ConditionVocabulary, PathologicalCondition};
use crate::constants::{SEEDED_REFERENCE_NAME, SEEDED_REFERENCE_YAML};
use crate::registry::{CategoryRegistry, RiskCategory};
use crate::rules::RuleTable;
use crate::{RiskError, RiskResult};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceDocument {
    categories: Vec<RiskCategory>,
    #[serde(default)]
    conditions: Vec<PathologicalCondition>,
    rules: RuleTable,
}

/// Where a set of reference data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    Seeded,
    File(PathBuf),
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceSource::Seeded => f.write_str(SEEDED_REFERENCE_NAME),
            ReferenceSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Validated reference data: the category registry, the condition vocabulary and the rule
/// table.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    source: ReferenceSource,
    registry: CategoryRegistry,
    vocabulary: ConditionVocabulary,
    rules: RuleTable,
}

impl ReferenceData {
    /// Reference data compiled into the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded document itself is invalid.
    pub fn seeded() -> RiskResult<Self> {
        Self::from_yaml_str(SEEDED_REFERENCE_YAML, ReferenceSource::Seeded)
    }

    /// Read and validate a reference document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::ReferenceRead`] if the file cannot be read, otherwise any error from
    /// [`ReferenceData::from_yaml_str`].
    pub fn from_file(path: &Path) -> RiskResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RiskError::ReferenceRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, ReferenceSource::File(path.to_path_buf()))
    }

    /// Parse and validate a reference document.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::ReferenceParse`] (with the failing path, e.g. `rules.thresholds[3]`)
    /// when the YAML does not match the schema, or [`RiskError::InvalidReference`] when the
    /// content breaks a registry, vocabulary or rule-table invariant.
    pub fn from_yaml_str(yaml: &str, source: ReferenceSource) -> RiskResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml);
        let document: ReferenceDocument = match serde_path_to_error::deserialize(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(RiskError::ReferenceParse {
                    path,
                    source: err.into_inner(),
                });
            }
        };

        let registry = CategoryRegistry::from_categories(document.categories)?;
        let vocabulary = ConditionVocabulary::from_conditions(document.conditions)?;
        document.rules.validate()?;

        tracing::debug!(
            %source,
            categories = registry.len(),
            conditions = vocabulary.len(),
            rules = document.rules.thresholds().len(),
            "loaded risk reference data"
        );

        Ok(Self {
            source,
            registry,
            vocabulary,
            rules: document.rules,
        })
    }

    pub fn source(&self) -> &ReferenceSource {
        &self.source
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn vocabulary(&self) -> &ConditionVocabulary {
        &self.vocabulary
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}
