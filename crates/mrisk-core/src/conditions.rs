//! Pathological-condition vocabulary.
//!
//! Pre-existing conditions (hypertension, diabetes, ...) are static per patient. Each one biases
//! the initial category of an admission upward by at least its configured severity band.

use crate::registry::CategoryKey;
use crate::{RiskError, RiskResult};
use mrisk_types::{ConditionId, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the condition vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathologicalCondition {
    pub id: ConditionId,
    pub name: NonEmptyText,
    /// Minimum severity band an admission with this condition starts in.
    pub bias: CategoryKey,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionVocabulary {
    conditions: BTreeMap<ConditionId, PathologicalCondition>,
}

impl ConditionVocabulary {
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidReference`] for duplicate ids or a bias outside the severity
    /// bands.
    pub fn from_conditions(conditions: Vec<PathologicalCondition>) -> RiskResult<Self> {
        let mut by_id = BTreeMap::new();
        for condition in conditions {
            if !condition.bias.is_severity_band() {
                return Err(RiskError::InvalidReference(format!(
                    "condition {} has bias '{}', which is not a severity band",
                    condition.id, condition.bias
                )));
            }
            let id = condition.id;
            if by_id.insert(id, condition).is_some() {
                return Err(RiskError::InvalidReference(format!(
                    "duplicate condition id {id}"
                )));
            }
        }
        Ok(Self { conditions: by_id })
    }

    pub fn lookup(&self, id: ConditionId) -> Option<&PathologicalCondition> {
        self.conditions.get(&id)
    }

    /// Conditions ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &PathologicalCondition> {
        self.conditions.values()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
