//! The risk rule engine.
//!
//! A pure, synchronous function from an [`ObservationBundle`] (and the category currently on
//! the admission) to a category id. It holds only immutable reference data, so one engine can
//! be shared across any number of request workers without locking.
//!
//! Precedence, highest first:
//! 1. a sticky current category (abortion process) is returned unchanged;
//! 2. otherwise every triggered rule contributes a severity band and the most severe band wins;
//! 3. with nothing triggered, the registry's default category is returned.
//!
//! Unknown readings never trigger a rule. Pre-existing conditions only contribute when there is
//! no current category, i.e. at first admission.

use crate::bundle::ObservationBundle;
use crate::reference::ReferenceData;
use crate::registry::CategoryKey;
use crate::rules::VitalSign;
use crate::RiskResult;
use mrisk_types::{CategoryId, ConditionId, Reading};
use serde::Serialize;
use std::sync::Arc;

/// Why a severity band was proposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Contribution {
    Threshold {
        rule_id: String,
        vital: VitalSign,
        value: f64,
        level: CategoryKey,
    },
    FetalMovementsAbsent {
        level: CategoryKey,
    },
    Condition {
        condition_id: ConditionId,
        level: CategoryKey,
    },
}

impl Contribution {
    pub fn level(&self) -> CategoryKey {
        match self {
            Contribution::Threshold { level, .. }
            | Contribution::FetalMovementsAbsent { level }
            | Contribution::Condition { level, .. } => *level,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Contribution::Threshold { .. } => "threshold",
            Contribution::FetalMovementsAbsent { .. } => "fetal_movements_absent",
            Contribution::Condition { .. } => "condition",
        }
    }

    /// Short human-readable description for audit output.
    pub fn detail(&self) -> String {
        match self {
            Contribution::Threshold {
                rule_id,
                vital,
                value,
                ..
            } => format!("{rule_id}: {vital} = {value}"),
            Contribution::FetalMovementsAbsent { .. } => "fetal movements absent".into(),
            Contribution::Condition { condition_id, .. } => {
                format!("pre-existing condition {condition_id}")
            }
        }
    }
}

/// The full result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub category_id: CategoryId,
    pub category_key: CategoryKey,
    pub previous_category_id: Option<CategoryId>,
    /// The new category is strictly more severe than the previous one, or than the default
    /// category when there is no previous one.
    pub escalated: bool,
    /// The previous category was sticky and was kept regardless of the readings.
    pub sticky_preserved: bool,
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone)]
pub struct RiskRuleEngine {
    reference: Arc<ReferenceData>,
}

impl RiskRuleEngine {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Compute the category id for `bundle` given the category currently on the admission.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RiskError::UnknownCategory`] if `current_category` is not a registry id.
    pub fn compute(
        &self,
        bundle: &ObservationBundle,
        current_category: Option<CategoryId>,
    ) -> RiskResult<CategoryId> {
        self.evaluate(bundle, current_category)
            .map(|assessment| assessment.category_id)
    }

    /// Evaluate using the prior category carried on the bundle.
    ///
    /// # Errors
    ///
    /// Same as [`RiskRuleEngine::compute`].
    pub fn assess(&self, bundle: &ObservationBundle) -> RiskResult<RiskAssessment> {
        self.evaluate(bundle, bundle.prior_category)
    }

    /// Evaluate with an explicit current category, returning the full assessment.
    ///
    /// # Errors
    ///
    /// Same as [`RiskRuleEngine::compute`].
    pub fn evaluate(
        &self,
        bundle: &ObservationBundle,
        current_category: Option<CategoryId>,
    ) -> RiskResult<RiskAssessment> {
        let registry = self.reference.registry();

        let previous = current_category
            .map(|id| registry.lookup(id).map(|c| (c.id, c.key)))
            .transpose()?;

        if let Some((id, key)) = previous {
            if key.is_sticky() {
                tracing::info!(category_id = %id, "sticky risk category preserved");
                return Ok(RiskAssessment {
                    category_id: id,
                    category_key: key,
                    previous_category_id: Some(id),
                    escalated: false,
                    sticky_preserved: true,
                    contributions: Vec::new(),
                });
            }
        }

        let mut contributions = self.reading_contributions(bundle);
        if previous.is_none() {
            contributions.extend(self.condition_contributions(&bundle.condition_ids));
        }

        let key = contributions
            .iter()
            .map(Contribution::level)
            .max()
            .unwrap_or(CategoryKey::Normal);
        let category_id = registry.id_for(key);
        // at first admission the baseline is the default category
        let baseline = previous.map_or(CategoryKey::Normal, |(_, previous_key)| previous_key);
        let escalated = key > baseline;

        if escalated {
            tracing::info!(
                category_id = %category_id,
                category = %key,
                contributions = contributions.len(),
                "risk category escalated"
            );
        } else {
            tracing::debug!(
                category_id = %category_id,
                category = %key,
                contributions = contributions.len(),
                "risk category computed"
            );
        }

        Ok(RiskAssessment {
            category_id,
            category_key: key,
            previous_category_id: previous.map(|(id, _)| id),
            escalated,
            sticky_preserved: false,
            contributions,
        })
    }

    fn reading_contributions(&self, bundle: &ObservationBundle) -> Vec<Contribution> {
        let rules = self.reference.rules();

        let mut contributions: Vec<Contribution> = rules
            .thresholds()
            .iter()
            .filter_map(|rule| {
                let value = bundle.vital(rule.vital())?;
                rule.matches(value).then(|| Contribution::Threshold {
                    rule_id: rule.id().to_string(),
                    vital: rule.vital(),
                    value,
                    level: rule.level(),
                })
            })
            .collect();

        if bundle.fetal_movements_present == Reading::Known(false) {
            contributions.push(Contribution::FetalMovementsAbsent {
                level: rules.absent_fetal_movements(),
            });
        }

        contributions
    }

    fn condition_contributions(&self, condition_ids: &[ConditionId]) -> Vec<Contribution> {
        let vocabulary = self.reference.vocabulary();
        condition_ids
            .iter()
            .filter_map(|&id| match vocabulary.lookup(id) {
                Some(condition) => Some(Contribution::Condition {
                    condition_id: id,
                    level: condition.bias,
                }),
                None => {
                    tracing::warn!(condition_id = %id, "unknown condition id ignored");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{RiskInputCollector, VitalsPayload};
    use crate::RiskError;

    fn engine() -> RiskRuleEngine {
        RiskRuleEngine::new(Arc::new(ReferenceData::seeded().unwrap()))
    }

    fn key_of(engine: &RiskRuleEngine, id: CategoryId) -> CategoryKey {
        engine.reference().registry().lookup(id).unwrap().key
    }

    fn id_of(engine: &RiskRuleEngine, key: CategoryKey) -> CategoryId {
        engine.reference().registry().id_for(key)
    }

    /// A spread of bundles covering normal, borderline and severe readings.
    fn sample_bundles() -> Vec<ObservationBundle> {
        let mut bundles = vec![ObservationBundle::default()];
        for systolic in [85, 110, 140, 159, 160, 200] {
            for diastolic in [60, 89, 90, 110] {
                bundles.push(ObservationBundle {
                    systolic_bp: Reading::Known(systolic),
                    diastolic_bp: Reading::Known(diastolic),
                    ..Default::default()
                });
            }
        }
        for temperature in [35.0, 36.5, 37.8, 39.5] {
            bundles.push(ObservationBundle {
                temperature: Reading::Known(temperature),
                fetal_movements_present: Reading::Known(false),
                ..Default::default()
            });
        }
        for fetal_heart_rate in [90, 105, 140, 170, 190] {
            bundles.push(ObservationBundle {
                fetal_heart_rate: Reading::Known(fetal_heart_rate),
                heart_rate: Reading::Known(130),
                condition_ids: vec![ConditionId::new(2), ConditionId::new(99)],
                ..Default::default()
            });
        }
        bundles
    }

    #[test]
    fn test_scenario_normal_readings_are_normal() {
        let engine = engine();
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(110),
            diastolic_bp: Reading::Known(70),
            heart_rate: Reading::Known(80),
            temperature: Reading::Known(36.5),
            fetal_movements_present: Reading::Known(true),
            ..Default::default()
        };
        let id = engine.compute(&bundle, None).unwrap();
        assert_eq!(key_of(&engine, id), CategoryKey::Normal);
    }

    #[test]
    fn test_scenario_severe_hypertension_is_high() {
        let engine = engine();
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(160),
            diastolic_bp: Reading::Known(110),
            ..Default::default()
        };
        let id = engine.compute(&bundle, None).unwrap();
        assert_eq!(key_of(&engine, id), CategoryKey::High);
    }

    #[test]
    fn test_scenario_absent_fetal_movements_escalates_from_normal() {
        let engine = engine();
        let bundle = ObservationBundle {
            fetal_movements_present: Reading::Known(false),
            ..Default::default()
        };
        let normal = id_of(&engine, CategoryKey::Normal);
        let assessment = engine.evaluate(&bundle, Some(normal)).unwrap();

        assert!(assessment.category_key >= CategoryKey::Medium);
        assert!(assessment.escalated);
        assert_eq!(assessment.previous_category_id, Some(normal));
        assert!(matches!(
            assessment.contributions.as_slice(),
            [Contribution::FetalMovementsAbsent { .. }]
        ));
    }

    #[test]
    fn test_absent_fetal_movements_at_admission_escalates() {
        let engine = engine();
        let bundle = ObservationBundle {
            fetal_movements_present: Reading::Known(false),
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, None).unwrap();

        assert_eq!(assessment.category_key, CategoryKey::Medium);
        assert!(assessment.escalated);
        assert_eq!(assessment.previous_category_id, None);
    }

    #[test]
    fn test_first_admission_escalation_is_measured_from_default() {
        let engine = engine();
        let severe = ObservationBundle {
            systolic_bp: Reading::Known(160),
            diastolic_bp: Reading::Known(110),
            ..Default::default()
        };
        let assessment = engine.evaluate(&severe, None).unwrap();
        assert_eq!(assessment.category_key, CategoryKey::High);
        assert!(assessment.escalated);

        let assessment = engine.evaluate(&ObservationBundle::default(), None).unwrap();
        assert_eq!(assessment.category_key, CategoryKey::Normal);
        assert!(!assessment.escalated);
    }

    #[test]
    fn test_scenario_sticky_category_overrides_normal_reading() {
        let engine = engine();
        let sticky = engine.reference().registry().sticky_category_id();
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(110),
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, Some(sticky)).unwrap();
        assert_eq!(assessment.category_id, sticky);
        assert!(assessment.sticky_preserved);
        assert!(!assessment.escalated);
    }

    #[test]
    fn test_scenario_condition_biases_initial_category() {
        let engine = engine();
        let diabetes = ConditionId::new(2);
        let bundle = ObservationBundle {
            condition_ids: vec![diabetes],
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, None).unwrap();
        assert!(assessment.category_key >= CategoryKey::Normal);
        assert_eq!(assessment.category_key, CategoryKey::Medium);
        assert_eq!(
            assessment.contributions,
            vec![Contribution::Condition {
                condition_id: diabetes,
                level: CategoryKey::Medium
            }]
        );
    }

    #[test]
    fn test_conditions_are_ignored_on_subsequent_encounters() {
        let engine = engine();
        let bundle = ObservationBundle {
            condition_ids: vec![ConditionId::new(4)],
            ..Default::default()
        };
        let normal = id_of(&engine, CategoryKey::Normal);
        let id = engine.compute(&bundle, Some(normal)).unwrap();
        assert_eq!(id, normal);
    }

    #[test]
    fn test_unknown_condition_ids_contribute_nothing() {
        let engine = engine();
        let bundle = ObservationBundle {
            condition_ids: vec![ConditionId::new(999)],
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, None).unwrap();
        assert_eq!(assessment.category_key, CategoryKey::Normal);
        assert!(assessment.contributions.is_empty());
    }

    #[test]
    fn test_all_unknown_returns_default_category() {
        let engine = engine();
        let id = engine.compute(&ObservationBundle::default(), None).unwrap();
        assert_eq!(id, engine.reference().registry().default_category_id());
    }

    #[test]
    fn test_category_can_move_down_when_readings_improve() {
        let engine = engine();
        let high = id_of(&engine, CategoryKey::High);
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(118),
            diastolic_bp: Reading::Known(76),
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, Some(high)).unwrap();
        assert_eq!(assessment.category_key, CategoryKey::Normal);
        assert!(!assessment.escalated);
    }

    #[test]
    fn test_most_severe_contribution_wins() {
        let engine = engine();
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(145),
            heart_rate: Reading::Known(125),
            temperature: Reading::Known(36.8),
            ..Default::default()
        };
        let assessment = engine.evaluate(&bundle, None).unwrap();
        assert_eq!(assessment.category_key, CategoryKey::High);
        let levels: Vec<_> = assessment.contributions.iter().map(|c| c.level()).collect();
        assert!(levels.contains(&CategoryKey::Medium));
        assert!(levels.contains(&CategoryKey::High));
    }

    #[test]
    fn test_unknown_current_category_is_an_error() {
        let engine = engine();
        let err = engine
            .compute(&ObservationBundle::default(), Some(CategoryId::new(77)))
            .unwrap_err();
        assert!(matches!(err, RiskError::UnknownCategory(id) if id == CategoryId::new(77)));
    }

    #[test]
    fn test_assess_uses_prior_category_from_bundle() {
        let engine = engine();
        let sticky = engine.reference().registry().sticky_category_id();
        let bundle = RiskInputCollector::new().from_encounter(
            &VitalsPayload {
                systolic_bp: Some(170),
                ..Default::default()
            },
            Some(sticky),
        );
        assert_eq!(engine.assess(&bundle).unwrap().category_id, sticky);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let engine = engine();
        let registry_ids: Vec<_> = engine.reference().registry().ids().collect();
        for bundle in sample_bundles() {
            for current in std::iter::once(None).chain(registry_ids.iter().copied().map(Some)) {
                let first = engine.evaluate(&bundle, current).unwrap();
                let second = engine.evaluate(&bundle, current).unwrap();
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_sticky_invariant_holds_for_every_bundle() {
        let engine = engine();
        let sticky = engine.reference().registry().sticky_category_id();
        for bundle in sample_bundles() {
            assert_eq!(engine.compute(&bundle, Some(sticky)).unwrap(), sticky);
        }
    }

    #[test]
    fn test_results_are_always_registry_members() {
        let engine = engine();
        let registry = engine.reference().registry();
        let registry_ids: Vec<_> = registry.ids().collect();
        for bundle in sample_bundles() {
            for current in std::iter::once(None).chain(registry_ids.iter().copied().map(Some)) {
                let id = engine.compute(&bundle, current).unwrap();
                assert!(registry.lookup(id).is_ok(), "{id} is not a registry id");
            }
        }
    }

    #[test]
    fn test_readings_never_produce_the_sticky_category() {
        let engine = engine();
        for bundle in sample_bundles() {
            let id = engine.compute(&bundle, None).unwrap();
            assert!(!key_of(&engine, id).is_sticky());
        }
    }

    #[test]
    fn test_monotonic_in_systolic_pressure() {
        let engine = engine();
        let mut last = CategoryKey::Normal;
        for systolic in [120, 139, 140, 150, 159, 160, 190] {
            let bundle = ObservationBundle {
                systolic_bp: Reading::Known(systolic),
                diastolic_bp: Reading::Known(80),
                heart_rate: Reading::Known(85),
                ..Default::default()
            };
            let key = key_of(&engine, engine.compute(&bundle, None).unwrap());
            assert!(key >= last, "systolic {systolic} lowered severity");
            last = key;
        }
        assert_eq!(last, CategoryKey::High);
    }

    #[test]
    fn test_monotonic_in_fetal_heart_rate_bradycardia() {
        let engine = engine();
        let mut last = CategoryKey::Normal;
        for fetal_heart_rate in [140, 115, 109, 100, 99, 80] {
            let bundle = ObservationBundle {
                fetal_heart_rate: Reading::Known(fetal_heart_rate),
                ..Default::default()
            };
            let key = key_of(&engine, engine.compute(&bundle, None).unwrap());
            assert!(key >= last, "fetal heart rate {fetal_heart_rate} lowered severity");
            last = key;
        }
        assert_eq!(last, CategoryKey::High);
    }

    #[test]
    fn test_uterine_height_has_no_default_rules() {
        let engine = engine();
        let bundle = ObservationBundle {
            uterine_height: Reading::Known(45.0),
            ..Default::default()
        };
        assert_eq!(
            engine.compute(&bundle, None).unwrap(),
            engine.reference().registry().default_category_id()
        );
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = engine();
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(165),
            ..Default::default()
        };
        let expected = engine.compute(&bundle, None).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                let bundle = bundle.clone();
                std::thread::spawn(move || engine.compute(&bundle, None).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
