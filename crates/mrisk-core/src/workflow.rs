//! Admission and encounter workflows.
//!
//! Validates the incoming payload, computes the category through [`RiskService`] and persists
//! the result through an [`EncounterWriter`]. For follow-up encounters the computation runs
//! inside the writer's critical section against the admission's stored category.

use crate::collector::{AdmissionPayload, VitalsPayload};
use crate::encounter::{
    AdmissionRecord, EncounterRecord, EncounterWriter, NewAdmission, NewEncounter, OutcomeRecord,
};
use crate::service::RiskService;
use crate::validation::{validate_condition_ids, validate_vitals};
use crate::{RiskError, RiskResult};
use chrono::Utc;
use mrisk_types::{CategoryId, NonEmptyText};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AdmissionWorkflow {
    risk: RiskService,
    writer: Arc<dyn EncounterWriter>,
}

impl AdmissionWorkflow {
    pub fn new(risk: RiskService, writer: Arc<dyn EncounterWriter>) -> Self {
        Self { risk, writer }
    }

    pub fn risk(&self) -> &RiskService {
        &self.risk
    }

    /// Open a new admission. Pre-existing conditions are weighed here and only here.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidInput` for a blank patient reference, implausible vitals or
    /// malformed condition ids. Storage failures are propagated.
    pub fn admit(&self, payload: AdmissionPayload) -> RiskResult<AdmissionRecord> {
        let patient_reference = NonEmptyText::new(&payload.patient_reference)
            .map_err(|_| RiskError::InvalidInput("patient_reference is required".into()))?;
        validate_vitals(&payload.vitals)?;
        validate_condition_ids(&payload.condition_ids)?;

        let (bundle, assessment) = self.risk.assess_admission(&payload)?;
        let record = self.writer.create_admission(
            NewAdmission {
                patient_reference,
                condition_ids: bundle.condition_ids,
            },
            NewEncounter {
                vitals: payload.vitals,
                assessment,
            },
        )?;

        tracing::info!(
            admission_id = %record.id,
            category_id = %record.categoria_risco_id,
            "admission created"
        );
        Ok(record)
    }

    /// Record a follow-up encounter and update the admission's category.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for implausible vitals, `AdmissionNotFound`, `AdmissionClosed`, or
    /// `UnknownCategory` if the stored category is not in the registry.
    pub fn record_encounter(
        &self,
        admission_id: Uuid,
        vitals: VitalsPayload,
    ) -> RiskResult<EncounterRecord> {
        validate_vitals(&vitals)?;

        let risk = &self.risk;
        let encounter = self
            .writer
            .append_encounter(admission_id, &mut |admission| {
                let assessment = risk.assess_encounter(&vitals, admission.categoria_risco_id)?;
                Ok(NewEncounter {
                    vitals: vitals.clone(),
                    assessment,
                })
            })?;

        tracing::debug!(
            admission_id = %admission_id,
            encounter_id = %encounter.id,
            category_id = %encounter.categoria_risco_id(),
            "encounter recorded"
        );
        Ok(encounter)
    }

    /// Explicit clinician designation of a category, e.g. entering the abortion process.
    ///
    /// Once the sticky category is in force it can only be left by closing the admission.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an id outside the registry or an attempt to leave the sticky
    /// category; `AdmissionNotFound`; `AdmissionClosed`.
    pub fn designate_category(
        &self,
        admission_id: Uuid,
        category_id: i64,
    ) -> RiskResult<AdmissionRecord> {
        let registry = self.risk.registry();
        let requested = CategoryId::new(category_id);
        if !registry.contains(requested) {
            return Err(RiskError::InvalidInput(format!(
                "unknown risk category id: {category_id}"
            )));
        }
        let sticky = registry.sticky_category_id();

        let record = self.writer.update_category(admission_id, &mut |admission| {
            if admission.categoria_risco_id == sticky && requested != sticky {
                return Err(RiskError::InvalidInput(
                    "admission is in the abortion process; record an outcome instead".into(),
                ));
            }
            Ok(requested)
        })?;

        tracing::info!(
            admission_id = %admission_id,
            category_id = %requested,
            "risk category designated"
        );
        Ok(record)
    }

    /// Record the outcome (desfecho) and close the admission.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank kind, `AdmissionNotFound`, `AdmissionClosed`.
    pub fn record_outcome(
        &self,
        admission_id: Uuid,
        kind: &str,
        notes: Option<&str>,
    ) -> RiskResult<AdmissionRecord> {
        let kind = NonEmptyText::new(kind)
            .map_err(|_| RiskError::InvalidInput("outcome kind is required".into()))?;
        let record = self.writer.close(
            admission_id,
            OutcomeRecord {
                kind,
                notes: NonEmptyText::from_optional(notes),
                recorded_at: Utc::now(),
            },
        )?;

        tracing::info!(admission_id = %admission_id, "admission closed");
        Ok(record)
    }

    /// # Errors
    ///
    /// `AdmissionNotFound` if no admission has this id.
    pub fn admission(&self, admission_id: Uuid) -> RiskResult<AdmissionRecord> {
        self.writer.admission(admission_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::encounter::InMemoryEncounterStore;
    use crate::registry::CategoryKey;

    fn workflow() -> AdmissionWorkflow {
        let cfg = CoreConfig::seeded().unwrap();
        AdmissionWorkflow::new(
            RiskService::new(&cfg),
            Arc::new(InMemoryEncounterStore::new()),
        )
    }

    fn id_for(workflow: &AdmissionWorkflow, key: CategoryKey) -> CategoryId {
        workflow.risk().registry().id_for(key)
    }

    fn admit_normal(workflow: &AdmissionWorkflow) -> AdmissionRecord {
        workflow
            .admit(AdmissionPayload {
                patient_reference: "p-1".into(),
                vitals: VitalsPayload {
                    systolic_bp: Some(115),
                    diastolic_bp: Some(75),
                    fetal_movements_present: Some(true),
                    ..Default::default()
                },
                condition_ids: Vec::new(),
            })
            .unwrap()
    }

    #[test]
    fn test_admit_weighs_conditions() {
        let workflow = workflow();
        let record = workflow
            .admit(AdmissionPayload {
                patient_reference: "p-2".into(),
                vitals: VitalsPayload::default(),
                condition_ids: vec![4, 999],
            })
            .unwrap();

        assert_eq!(record.categoria_risco_id, id_for(&workflow, CategoryKey::High));
        assert_eq!(record.encounters.len(), 1);
        assert_eq!(record.condition_ids.len(), 2);
    }

    #[test]
    fn test_admit_rejects_blank_patient_reference() {
        let workflow = workflow();
        let err = workflow
            .admit(AdmissionPayload {
                patient_reference: "  ".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn test_admit_rejects_implausible_vitals() {
        let workflow = workflow();
        let err = workflow
            .admit(AdmissionPayload {
                patient_reference: "p-3".into(),
                vitals: VitalsPayload {
                    heart_rate: Some(-5),
                    ..Default::default()
                },
                condition_ids: Vec::new(),
            })
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn test_record_encounter_escalates_and_recovers() {
        let workflow = workflow();
        let record = admit_normal(&workflow);
        assert_eq!(record.categoria_risco_id, id_for(&workflow, CategoryKey::Normal));

        let encounter = workflow
            .record_encounter(
                record.id,
                VitalsPayload {
                    systolic_bp: Some(165),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(encounter.assessment.escalated);
        assert_eq!(
            workflow.admission(record.id).unwrap().categoria_risco_id,
            id_for(&workflow, CategoryKey::High)
        );

        workflow
            .record_encounter(
                record.id,
                VitalsPayload {
                    systolic_bp: Some(118),
                    ..Default::default()
                },
            )
            .unwrap();
        let stored = workflow.admission(record.id).unwrap();
        assert_eq!(stored.categoria_risco_id, id_for(&workflow, CategoryKey::Normal));
        assert_eq!(stored.encounters.len(), 3);
    }

    #[test]
    fn test_encounter_does_not_reweigh_conditions() {
        let workflow = workflow();
        let record = workflow
            .admit(AdmissionPayload {
                patient_reference: "p-4".into(),
                vitals: VitalsPayload::default(),
                condition_ids: vec![1],
            })
            .unwrap();
        assert_eq!(record.categoria_risco_id, id_for(&workflow, CategoryKey::Medium));

        let encounter = workflow
            .record_encounter(record.id, VitalsPayload::default())
            .unwrap();
        assert_eq!(
            encounter.categoria_risco_id(),
            id_for(&workflow, CategoryKey::Normal)
        );
    }

    #[test]
    fn test_designated_abortion_is_sticky() {
        let workflow = workflow();
        let record = admit_normal(&workflow);
        let sticky = id_for(&workflow, CategoryKey::Abortion);

        workflow.designate_category(record.id, sticky.get()).unwrap();

        let encounter = workflow
            .record_encounter(
                record.id,
                VitalsPayload {
                    systolic_bp: Some(170),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(encounter.categoria_risco_id(), sticky);
        assert!(encounter.assessment.sticky_preserved);

        let err = workflow
            .designate_category(record.id, id_for(&workflow, CategoryKey::Normal).get())
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
        assert_eq!(workflow.admission(record.id).unwrap().categoria_risco_id, sticky);
    }

    #[test]
    fn test_designate_unknown_category() {
        let workflow = workflow();
        let record = admit_normal(&workflow);
        let err = workflow.designate_category(record.id, 42).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn test_outcome_closes_admission() {
        let workflow = workflow();
        let record = admit_normal(&workflow);

        let closed = workflow
            .record_outcome(record.id, "parto normal", Some(" "))
            .unwrap();
        assert!(closed.is_closed());
        assert_eq!(closed.outcome.as_ref().unwrap().notes, None);

        let err = workflow
            .record_encounter(record.id, VitalsPayload::default())
            .unwrap_err();
        assert!(matches!(err, RiskError::AdmissionClosed(_)));
        assert!(matches!(
            workflow.record_outcome(record.id, "alta", None),
            Err(RiskError::AdmissionClosed(_))
        ));
    }

    #[test]
    fn test_unknown_admission() {
        let workflow = workflow();
        let id = Uuid::new_v4();
        assert!(matches!(
            workflow.record_encounter(id, VitalsPayload::default()),
            Err(RiskError::AdmissionNotFound(_))
        ));
        assert!(matches!(
            workflow.record_outcome(id, "alta", None),
            Err(RiskError::AdmissionNotFound(_))
        ));
    }
}
