//! Admission and encounter records, and the store that serialises writes to them.
//!
//! The category stored on an admission is read, recomputed, and written back on every
//! encounter. [`EncounterWriter`] runs the recompute inside its own write critical section so
//! two concurrent encounters on the same admission cannot both read the same stale category.

use crate::collector::VitalsPayload;
use crate::engine::RiskAssessment;
use crate::{RiskError, RiskResult};
use chrono::{DateTime, Utc};
use mrisk_types::{CategoryId, ConditionId, NonEmptyText};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// One follow-up encounter (atendimento) with the category computed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub vitals: VitalsPayload,
    pub assessment: RiskAssessment,
}

impl EncounterRecord {
    pub fn categoria_risco_id(&self) -> CategoryId {
        self.assessment.category_id
    }
}

/// How an admission ended (delivery, discharge, abortion outcome...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub kind: NonEmptyText,
    pub notes: Option<NonEmptyText>,
    pub recorded_at: DateTime<Utc>,
}

/// An admission (internação) and everything recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionRecord {
    pub id: Uuid,
    pub patient_reference: NonEmptyText,
    pub admitted_at: DateTime<Utc>,
    /// The category currently in force. Updated by each encounter and by explicit designation.
    pub categoria_risco_id: CategoryId,
    pub condition_ids: Vec<ConditionId>,
    /// Encounters in insertion order. The first one is the admission intake.
    pub encounters: Vec<EncounterRecord>,
    pub outcome: Option<OutcomeRecord>,
}

impl AdmissionRecord {
    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewAdmission {
    pub patient_reference: NonEmptyText,
    pub condition_ids: Vec<ConditionId>,
}

#[derive(Debug, Clone)]
pub struct NewEncounter {
    pub vitals: VitalsPayload,
    pub assessment: RiskAssessment,
}

impl NewEncounter {
    fn into_record(self) -> EncounterRecord {
        EncounterRecord {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            vitals: self.vitals,
            assessment: self.assessment,
        }
    }
}

/// Storage seam for admissions.
///
/// The closures passed to [`EncounterWriter::append_encounter`] and
/// [`EncounterWriter::update_category`] see the admission as it is under the write lock and
/// their result is applied before the lock is released.
pub trait EncounterWriter: Send + Sync {
    /// Store a new admission with its intake encounter. The admission's category is taken from
    /// the intake assessment.
    fn create_admission(
        &self,
        admission: NewAdmission,
        intake: NewEncounter,
    ) -> RiskResult<AdmissionRecord>;

    fn admission(&self, id: Uuid) -> RiskResult<AdmissionRecord>;

    /// Append an encounter computed from the current admission state.
    fn append_encounter(
        &self,
        id: Uuid,
        compute: &mut dyn FnMut(&AdmissionRecord) -> RiskResult<NewEncounter>,
    ) -> RiskResult<EncounterRecord>;

    /// Replace the admission's category with one derived from the current state.
    fn update_category(
        &self,
        id: Uuid,
        decide: &mut dyn FnMut(&AdmissionRecord) -> RiskResult<CategoryId>,
    ) -> RiskResult<AdmissionRecord>;

    /// Record the outcome. No further writes are accepted afterwards.
    fn close(&self, id: Uuid, outcome: OutcomeRecord) -> RiskResult<AdmissionRecord>;
}

/// Process-local store used by the servers and tests.
#[derive(Debug, Default)]
pub struct InMemoryEncounterStore {
    admissions: RwLock<HashMap<Uuid, AdmissionRecord>>,
}

impl InMemoryEncounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> RiskResult<usize> {
        let admissions = self
            .admissions
            .read()
            .map_err(|_| RiskError::StorePoisoned)?;
        Ok(admissions.len())
    }

    pub fn is_empty(&self) -> RiskResult<bool> {
        self.len().map(|n| n == 0)
    }

    fn with_open_admission<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AdmissionRecord) -> RiskResult<T>,
    ) -> RiskResult<T> {
        let mut admissions = self
            .admissions
            .write()
            .map_err(|_| RiskError::StorePoisoned)?;
        let admission = admissions
            .get_mut(&id)
            .ok_or(RiskError::AdmissionNotFound(id))?;
        if admission.is_closed() {
            return Err(RiskError::AdmissionClosed(id));
        }
        f(admission)
    }
}

impl EncounterWriter for InMemoryEncounterStore {
    fn create_admission(
        &self,
        admission: NewAdmission,
        intake: NewEncounter,
    ) -> RiskResult<AdmissionRecord> {
        let intake = intake.into_record();
        let record = AdmissionRecord {
            id: Uuid::new_v4(),
            patient_reference: admission.patient_reference,
            admitted_at: intake.recorded_at,
            categoria_risco_id: intake.categoria_risco_id(),
            condition_ids: admission.condition_ids,
            encounters: vec![intake],
            outcome: None,
        };

        let mut admissions = self
            .admissions
            .write()
            .map_err(|_| RiskError::StorePoisoned)?;
        admissions.insert(record.id, record.clone());
        Ok(record)
    }

    fn admission(&self, id: Uuid) -> RiskResult<AdmissionRecord> {
        let admissions = self
            .admissions
            .read()
            .map_err(|_| RiskError::StorePoisoned)?;
        admissions
            .get(&id)
            .cloned()
            .ok_or(RiskError::AdmissionNotFound(id))
    }

    fn append_encounter(
        &self,
        id: Uuid,
        compute: &mut dyn FnMut(&AdmissionRecord) -> RiskResult<NewEncounter>,
    ) -> RiskResult<EncounterRecord> {
        self.with_open_admission(id, |admission| {
            let encounter = compute(&*admission)?.into_record();
            admission.categoria_risco_id = encounter.categoria_risco_id();
            admission.encounters.push(encounter.clone());
            Ok(encounter)
        })
    }

    fn update_category(
        &self,
        id: Uuid,
        decide: &mut dyn FnMut(&AdmissionRecord) -> RiskResult<CategoryId>,
    ) -> RiskResult<AdmissionRecord> {
        self.with_open_admission(id, |admission| {
            admission.categoria_risco_id = decide(&*admission)?;
            Ok(admission.clone())
        })
    }

    fn close(&self, id: Uuid, outcome: OutcomeRecord) -> RiskResult<AdmissionRecord> {
        self.with_open_admission(id, |admission| {
            admission.outcome = Some(outcome);
            Ok(admission.clone())
        })
    }
}
