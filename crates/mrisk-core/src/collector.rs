//! Input collection.
//!
//! Turns raw admission and encounter payloads, where almost any field may be missing, into a
//! complete [`ObservationBundle`]. The collector never rejects data: a missing or blank field
//! becomes [`Reading::Unknown`]. Range checks belong upstream in [`crate::validation`].

use crate::bundle::ObservationBundle;
use mrisk_types::{CategoryId, ConditionId, NonEmptyText, Reading};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Vital signs and obstetric findings as submitted by the admission or encounter form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsPayload {
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub heart_rate: Option<i32>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<i32>,
    pub fetal_heart_rate: Option<i32>,
    pub fetal_movements_present: Option<bool>,
    pub uterine_height: Option<f64>,
    pub maternity_evolution: Option<String>,
    pub fetal_assessment: Option<String>,
}

/// An admission (internação) intake request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionPayload {
    /// Opaque reference to the patient in the surrounding system.
    pub patient_reference: String,
    pub vitals: VitalsPayload,
    pub condition_ids: Vec<i64>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RiskInputCollector;

impl RiskInputCollector {
    pub fn new() -> Self {
        Self
    }

    /// Bundle for a new admission: conditions are included, there is no prior category.
    pub fn from_admission(&self, payload: &AdmissionPayload) -> ObservationBundle {
        self.collect(&payload.vitals, &payload.condition_ids, None)
    }

    /// Bundle for a follow-up encounter (atendimento) on an existing admission.
    ///
    /// Conditions are static per patient and were already weighed at admission, so they are
    /// not carried here.
    pub fn from_encounter(
        &self,
        vitals: &VitalsPayload,
        admission_category: Option<CategoryId>,
    ) -> ObservationBundle {
        self.collect(vitals, &[], admission_category)
    }

    /// General form used by the `compute_risk_category` operation.
    ///
    /// When a current category is supplied the call is in encounter mode and `condition_ids`
    /// are dropped.
    pub fn collect(
        &self,
        vitals: &VitalsPayload,
        condition_ids: &[i64],
        current_category: Option<CategoryId>,
    ) -> ObservationBundle {
        let condition_ids = if current_category.is_some() {
            Vec::new()
        } else {
            condition_ids
                .iter()
                .copied()
                .map(ConditionId::new)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        ObservationBundle {
            systolic_bp: vitals.systolic_bp.into(),
            diastolic_bp: vitals.diastolic_bp.into(),
            heart_rate: vitals.heart_rate.into(),
            temperature: vitals.temperature.into(),
            respiratory_rate: vitals.respiratory_rate.into(),
            fetal_heart_rate: vitals.fetal_heart_rate.into(),
            fetal_movements_present: vitals.fetal_movements_present.into(),
            uterine_height: vitals.uterine_height.into(),
            maternity_evolution: note(vitals.maternity_evolution.as_deref()),
            fetal_assessment: note(vitals.fetal_assessment.as_deref()),
            condition_ids,
            prior_category: current_category,
        }
    }
}

fn note(text: Option<&str>) -> Reading<NonEmptyText> {
    NonEmptyText::from_optional(text).into()
}
