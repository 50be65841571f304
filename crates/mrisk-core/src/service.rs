//! The `compute_risk_category` operation.
//!
//! [`RiskService`] composes the collector and the engine. The admission and encounter
//! workflows receive it by value instead of mixing the calculation into each handler.

use crate::bundle::ObservationBundle;
use crate::collector::{AdmissionPayload, RiskInputCollector, VitalsPayload};
use crate::conditions::ConditionVocabulary;
use crate::config::CoreConfig;
use crate::engine::{RiskAssessment, RiskRuleEngine};
use crate::registry::CategoryRegistry;
use crate::RiskResult;
use mrisk_types::CategoryId;

/// Pure risk operations - no API or persistence concerns
#[derive(Clone, Debug)]
pub struct RiskService {
    collector: RiskInputCollector,
    engine: RiskRuleEngine,
}

impl RiskService {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            collector: RiskInputCollector::new(),
            engine: RiskRuleEngine::new(cfg.shared_reference()),
        }
    }

    /// Compute the category to store on a new encounter.
    ///
    /// `condition_ids` only matter on first admission (no `current_category_id`);
    /// `current_category_id` only matters on subsequent encounters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RiskError::UnknownCategory`] if `current_category_id` is not a registry
    /// id.
    pub fn compute_risk_category(
        &self,
        vitals: &VitalsPayload,
        condition_ids: &[i64],
        current_category_id: Option<i64>,
    ) -> RiskResult<CategoryId> {
        self.assess(vitals, condition_ids, current_category_id)
            .map(|assessment| assessment.category_id)
    }

    /// Like [`RiskService::compute_risk_category`], returning the full assessment.
    ///
    /// # Errors
    ///
    /// Same as [`RiskService::compute_risk_category`].
    pub fn assess(
        &self,
        vitals: &VitalsPayload,
        condition_ids: &[i64],
        current_category_id: Option<i64>,
    ) -> RiskResult<RiskAssessment> {
        let bundle = self.collector.collect(
            vitals,
            condition_ids,
            current_category_id.map(CategoryId::new),
        );
        self.engine.assess(&bundle)
    }

    /// Assess an admission intake. Returns the bundle so the caller can store the normalised
    /// condition ids.
    ///
    /// # Errors
    ///
    /// Only fails on a registry bug.
    pub fn assess_admission(
        &self,
        payload: &AdmissionPayload,
    ) -> RiskResult<(ObservationBundle, RiskAssessment)> {
        let bundle = self.collector.from_admission(payload);
        let assessment = self.engine.assess(&bundle)?;
        Ok((bundle, assessment))
    }

    /// Assess a follow-up encounter against the admission's stored category.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RiskError::UnknownCategory`] if `admission_category` is not a registry
    /// id.
    pub fn assess_encounter(
        &self,
        vitals: &VitalsPayload,
        admission_category: CategoryId,
    ) -> RiskResult<RiskAssessment> {
        let bundle = self
            .collector
            .from_encounter(vitals, Some(admission_category));
        self.engine.assess(&bundle)
    }

    pub fn registry(&self) -> &CategoryRegistry {
        self.engine.reference().registry()
    }

    pub fn vocabulary(&self) -> &ConditionVocabulary {
        self.engine.reference().vocabulary()
    }
}
