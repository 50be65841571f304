//! Input validation utilities.
//!
//! Plausibility checks applied at the API boundary, before a payload reaches the collector.
//! These bounds reject impossible or malformed values (negative temperatures, a heart rate of
//! 2000). They are not clinical thresholds; those live in the reference rule table.

use crate::collector::VitalsPayload;
use std::collections::BTreeSet;
use crate::constants::{MAX_CONDITION_IDS, MAX_NOTE_CHARS};
use crate::{RiskError, RiskResult};

fn check_range<T>(field: &str, value: Option<T>, min: T, max: T) -> RiskResult<()>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    match value {
        Some(v) if !(v >= min && v <= max) => Err(RiskError::InvalidInput(format!(
            "{field} must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

fn check_note(field: &str, value: Option<&str>) -> RiskResult<()> {
    match value {
        Some(text) if text.chars().count() > MAX_NOTE_CHARS => Err(RiskError::InvalidInput(
            format!("{field} exceeds maximum length of {MAX_NOTE_CHARS} characters"),
        )),
        _ => Ok(()),
    }
}

/// Validates that every present vital sign is physiologically plausible.
///
/// Absent fields are always accepted.
///
/// # Errors
///
/// Returns a `RiskError::InvalidInput` naming the first offending field.
pub fn validate_vitals(vitals: &VitalsPayload) -> RiskResult<()> {
    check_range("systolic_bp", vitals.systolic_bp, 40, 300)?;
    check_range("diastolic_bp", vitals.diastolic_bp, 20, 200)?;
    check_range("heart_rate", vitals.heart_rate, 20, 250)?;
    // NaN fails the comparison and is rejected here too
    check_range("temperature", vitals.temperature, 30.0, 45.0)?;
    check_range("respiratory_rate", vitals.respiratory_rate, 4, 80)?;
    check_range("fetal_heart_rate", vitals.fetal_heart_rate, 50, 250)?;
    check_range("uterine_height", vitals.uterine_height, 0.0, 60.0)?;
    check_note("maternity_evolution", vitals.maternity_evolution.as_deref())?;
    check_note("fetal_assessment", vitals.fetal_assessment.as_deref())?;
    Ok(())
}

/// Validates the list of pre-existing condition ids on an admission.
///
/// Ids must be positive and the number of distinct ids bounded; repeats are collapsed on
/// collection so they do not count twice. Whether an id exists in the vocabulary is not
/// checked here; unknown ids are ignored by the engine.
///
/// # Errors
///
/// Returns a `RiskError::InvalidInput` if the list is too long or contains a non-positive id.
pub fn validate_condition_ids(condition_ids: &[i64]) -> RiskResult<()> {
    let distinct: BTreeSet<i64> = condition_ids.iter().copied().collect();
    if distinct.len() > MAX_CONDITION_IDS {
        return Err(RiskError::InvalidInput(format!(
            "at most {MAX_CONDITION_IDS} condition ids may be supplied"
        )));
    }
    if let Some(id) = condition_ids.iter().find(|&&id| id <= 0) {
        return Err(RiskError::InvalidInput(format!(
            "condition ids must be positive, got {id}"
        )));
    }
    Ok(())
}
