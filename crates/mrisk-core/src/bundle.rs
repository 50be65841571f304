//! The observation bundle consumed by the rule engine.

use crate::rules::VitalSign;
use mrisk_types::{CategoryId, ConditionId, NonEmptyText, Reading};
use serde::Serialize;

/// Everything the engine may look at for one admission or encounter.
///
/// Built fresh per request by [`crate::collector::RiskInputCollector`] and discarded once the
/// category is computed. Every field is present; fields that were not measured are
/// [`Reading::Unknown`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationBundle {
    pub systolic_bp: Reading<i32>,
    pub diastolic_bp: Reading<i32>,
    pub heart_rate: Reading<i32>,
    pub temperature: Reading<f64>,
    pub respiratory_rate: Reading<i32>,
    /// Fetal heart rate (BCF).
    pub fetal_heart_rate: Reading<i32>,
    pub fetal_movements_present: Reading<bool>,
    pub uterine_height: Reading<f64>,
    pub maternity_evolution: Reading<NonEmptyText>,
    pub fetal_assessment: Reading<NonEmptyText>,
    /// Pre-existing conditions, sorted and de-duplicated. Empty outside first admission.
    pub condition_ids: Vec<ConditionId>,
    /// Category currently stored on the parent admission, if any.
    pub prior_category: Option<CategoryId>,
}

impl ObservationBundle {
    /// The numeric value a threshold rule on `vital` should compare against.
    pub fn vital(&self, vital: VitalSign) -> Option<f64> {
        match vital {
            VitalSign::SystolicBp => self.systolic_bp.known().map(|v| f64::from(*v)),
            VitalSign::DiastolicBp => self.diastolic_bp.known().map(|v| f64::from(*v)),
            VitalSign::HeartRate => self.heart_rate.known().map(|v| f64::from(*v)),
            VitalSign::Temperature => self.temperature.known().copied(),
            VitalSign::RespiratoryRate => self.respiratory_rate.known().map(|v| f64::from(*v)),
            VitalSign::FetalHeartRate => self.fetal_heart_rate.known().map(|v| f64::from(*v)),
            VitalSign::UterineHeight => self.uterine_height.known().copied(),
        }
    }

    /// True when nothing at all was measured and no conditions were recorded.
    pub fn is_empty(&self) -> bool {
        !self.systolic_bp.is_known()
            && !self.diastolic_bp.is_known()
            && !self.heart_rate.is_known()
            && !self.temperature.is_known()
            && !self.respiratory_rate.is_known()
            && !self.fetal_heart_rate.is_known()
            && !self.fetal_movements_present.is_known()
            && !self.uterine_height.is_known()
            && self.condition_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundle_is_all_unknown() {
        let bundle = ObservationBundle::default();
        assert!(bundle.is_empty());
        assert_eq!(bundle.vital(VitalSign::SystolicBp), None);
        assert_eq!(bundle.prior_category, None);
    }

    #[test]
    fn test_vital_widens_integers() {
        let bundle = ObservationBundle {
            systolic_bp: Reading::Known(160),
            temperature: Reading::Known(37.9),
            ..Default::default()
        };
        assert_eq!(bundle.vital(VitalSign::SystolicBp), Some(160.0));
        assert_eq!(bundle.vital(VitalSign::Temperature), Some(37.9));
        assert!(!bundle.is_empty());
    }
}
