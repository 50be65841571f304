//! # mrisk Core
//!
//! Core business logic for obstetric risk classification.
//!
//! This crate contains pure risk operations:
//! - Reference data: the category registry, pathological condition vocabulary and threshold
//!   rule table, seeded from YAML
//! - Input collection into an observation bundle where missing readings are explicit
//! - The rule engine that maps a bundle and the current category to a category id
//! - Admission and encounter workflows over a pluggable `EncounterWriter`
//!
//! **No API concerns**: Authentication, HTTP/gRPC servers, or service interfaces belong in
//! `api-grpc`, `api-rest`, or `api-shared`.

pub mod bundle;
pub mod collector;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod encounter;
pub mod engine;
pub mod error;
pub mod reference;
pub mod registry;
pub mod rules;
pub mod service;
pub mod validation;
pub mod workflow;

pub use bundle::ObservationBundle;
pub use collector::{AdmissionPayload, RiskInputCollector, VitalsPayload};
pub use conditions::{ConditionVocabulary, PathologicalCondition};
pub use config::{reference_file_from_env_value, resolve_reference_data, CoreConfig};
pub use encounter::{
    AdmissionRecord, EncounterRecord, EncounterWriter, InMemoryEncounterStore, OutcomeRecord,
};
pub use engine::{Contribution, RiskAssessment, RiskRuleEngine};
pub use error::{RiskError, RiskResult};
pub use reference::{ReferenceData, ReferenceSource};
pub use registry::{CategoryKey, CategoryRegistry, RiskCategory};
pub use rules::{Bound, RuleTable, ThresholdRule, VitalSign};
pub use service::RiskService;
pub use workflow::AdmissionWorkflow;

pub use mrisk_types::{CategoryId, ConditionId, NonEmptyText, Reading};
