//! Conversions between protobuf wire types and core types.

use crate::pb;
use mrisk_core::{
    AdmissionPayload, AdmissionRecord, Contribution, EncounterRecord, OutcomeRecord,
    PathologicalCondition, RiskAssessment, RiskCategory, RiskError, RiskResult, VitalsPayload,
};
use uuid::Uuid;

impl From<pb::Vitals> for VitalsPayload {
    fn from(v: pb::Vitals) -> Self {
        Self {
            systolic_bp: v.systolic_bp,
            diastolic_bp: v.diastolic_bp,
            heart_rate: v.heart_rate,
            temperature: v.temperature,
            respiratory_rate: v.respiratory_rate,
            fetal_heart_rate: v.fetal_heart_rate,
            fetal_movements_present: v.fetal_movements_present,
            uterine_height: v.uterine_height,
            maternity_evolution: v.maternity_evolution,
            fetal_assessment: v.fetal_assessment,
        }
    }
}

impl From<&VitalsPayload> for pb::Vitals {
    fn from(v: &VitalsPayload) -> Self {
        Self {
            systolic_bp: v.systolic_bp,
            diastolic_bp: v.diastolic_bp,
            heart_rate: v.heart_rate,
            temperature: v.temperature,
            respiratory_rate: v.respiratory_rate,
            fetal_heart_rate: v.fetal_heart_rate,
            fetal_movements_present: v.fetal_movements_present,
            uterine_height: v.uterine_height,
            maternity_evolution: v.maternity_evolution.clone(),
            fetal_assessment: v.fetal_assessment.clone(),
        }
    }
}

/// A missing `vitals` message means nothing was measured.
pub fn vitals_from_pb(vitals: Option<pb::Vitals>) -> VitalsPayload {
    vitals.map(VitalsPayload::from).unwrap_or_default()
}

impl From<pb::CreateAdmissionReq> for AdmissionPayload {
    fn from(req: pb::CreateAdmissionReq) -> Self {
        Self {
            patient_reference: req.patient_reference,
            vitals: vitals_from_pb(req.vitals),
            condition_ids: req.condition_ids,
        }
    }
}

impl From<&RiskCategory> for pb::Category {
    fn from(c: &RiskCategory) -> Self {
        Self {
            id: c.id.get(),
            key: c.key.as_str().to_string(),
            name: c.name.to_string(),
            color: c.color.clone(),
            description: c.description.clone(),
        }
    }
}

impl From<&PathologicalCondition> for pb::Condition {
    fn from(c: &PathologicalCondition) -> Self {
        Self {
            id: c.id.get(),
            name: c.name.to_string(),
            bias: c.bias.as_str().to_string(),
        }
    }
}

impl From<&Contribution> for pb::Contribution {
    fn from(c: &Contribution) -> Self {
        let mut out = pb::Contribution {
            source: c.source().to_string(),
            level: c.level().as_str().to_string(),
            detail: c.detail(),
            ..Default::default()
        };
        match c {
            Contribution::Threshold {
                rule_id,
                vital,
                value,
                ..
            } => {
                out.rule_id = rule_id.clone();
                out.vital = vital.as_str().to_string();
                out.value = Some(*value);
            }
            Contribution::Condition { condition_id, .. } => {
                out.condition_id = Some(condition_id.get());
            }
            Contribution::FetalMovementsAbsent { .. } => {}
        }
        out
    }
}

impl From<&RiskAssessment> for pb::RiskAssessment {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            category_id: a.category_id.get(),
            category_key: a.category_key.as_str().to_string(),
            previous_category_id: a.previous_category_id.map(|id| id.get()),
            escalated: a.escalated,
            sticky_preserved: a.sticky_preserved,
            contributions: a.contributions.iter().map(Into::into).collect(),
        }
    }
}

impl From<&EncounterRecord> for pb::Encounter {
    fn from(e: &EncounterRecord) -> Self {
        Self {
            id: e.id.to_string(),
            recorded_at: e.recorded_at.to_rfc3339(),
            vitals: Some((&e.vitals).into()),
            assessment: Some((&e.assessment).into()),
        }
    }
}

impl From<&OutcomeRecord> for pb::Outcome {
    fn from(o: &OutcomeRecord) -> Self {
        Self {
            kind: o.kind.to_string(),
            notes: o.notes.as_ref().map(ToString::to_string),
            recorded_at: o.recorded_at.to_rfc3339(),
        }
    }
}

impl From<&AdmissionRecord> for pb::Admission {
    fn from(a: &AdmissionRecord) -> Self {
        Self {
            id: a.id.to_string(),
            patient_reference: a.patient_reference.to_string(),
            admitted_at: a.admitted_at.to_rfc3339(),
            categoria_risco_id: a.categoria_risco_id.get(),
            condition_ids: a.condition_ids.iter().map(|id| id.get()).collect(),
            encounters: a.encounters.iter().map(Into::into).collect(),
            outcome: a.outcome.as_ref().map(Into::into),
        }
    }
}

/// Parse an admission id sent over the wire.
///
/// # Errors
///
/// Returns `RiskError::InvalidInput` if `raw` is not a UUID.
pub fn parse_admission_id(raw: &str) -> RiskResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| RiskError::InvalidInput(format!("invalid admission id: {raw}")))
}
