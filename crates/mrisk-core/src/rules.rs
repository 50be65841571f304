//! Threshold rule table.
//!
//! Each rule maps one vital sign crossing one bound to a severity band. The table itself is
//! reference data: the engine only knows how to evaluate rules, not which cutoffs apply.

use crate::registry::CategoryKey;
use crate::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Numeric observations a threshold rule can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    SystolicBp,
    DiastolicBp,
    HeartRate,
    Temperature,
    RespiratoryRate,
    FetalHeartRate,
    UterineHeight,
}

impl VitalSign {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalSign::SystolicBp => "systolic_bp",
            VitalSign::DiastolicBp => "diastolic_bp",
            VitalSign::HeartRate => "heart_rate",
            VitalSign::Temperature => "temperature",
            VitalSign::RespiratoryRate => "respiratory_rate",
            VitalSign::FetalHeartRate => "fetal_heart_rate",
            VitalSign::UterineHeight => "uterine_height",
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The side of a threshold a reading must fall on for the rule to fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Fires when `value >= limit`.
    AtLeast(f64),
    /// Fires when `value < limit`.
    Below(f64),
}

impl Bound {
    pub fn matches(self, value: f64) -> bool {
        match self {
            Bound::AtLeast(limit) => value >= limit,
            Bound::Below(limit) => value < limit,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::AtLeast(limit) => write!(f, ">= {limit}"),
            Bound::Below(limit) => write!(f, "< {limit}"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdRuleWire {
    id: String,
    vital: VitalSign,
    #[serde(default)]
    at_least: Option<f64>,
    #[serde(default)]
    below: Option<f64>,
    level: CategoryKey,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ThresholdRuleWire")]
pub struct ThresholdRule {
    id: String,
    vital: VitalSign,
    bound: Bound,
    level: CategoryKey,
}

impl ThresholdRule {
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidReference`] for a blank id, a non-finite limit or a level
    /// outside the severity bands.
    pub fn new(
        id: impl Into<String>,
        vital: VitalSign,
        bound: Bound,
        level: CategoryKey,
    ) -> RiskResult<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(RiskError::InvalidReference(
                "threshold rule id cannot be empty".into(),
            ));
        }
        let limit = match bound {
            Bound::AtLeast(limit) | Bound::Below(limit) => limit,
        };
        if !limit.is_finite() {
            return Err(RiskError::InvalidReference(format!(
                "threshold rule '{id}' has a non-finite limit"
            )));
        }
        if !level.is_severity_band() {
            return Err(RiskError::InvalidReference(format!(
                "threshold rule '{id}' has level '{level}', which is not a severity band"
            )));
        }
        Ok(Self {
            id,
            vital,
            bound,
            level,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vital(&self) -> VitalSign {
        self.vital
    }

    pub fn level(&self) -> CategoryKey {
        self.level
    }

    pub fn matches(&self, value: f64) -> bool {
        self.bound.matches(value)
    }
}

impl TryFrom<ThresholdRuleWire> for ThresholdRule {
    type Error = RiskError;

    fn try_from(wire: ThresholdRuleWire) -> Result<Self, Self::Error> {
        let bound = match (wire.at_least, wire.below) {
            (Some(limit), None) => Bound::AtLeast(limit),
            (None, Some(limit)) => Bound::Below(limit),
            _ => {
                return Err(RiskError::InvalidReference(format!(
                    "threshold rule '{}' must set exactly one of at_least or below",
                    wire.id
                )))
            }
        };
        ThresholdRule::new(wire.id, wire.vital, bound, wire.level)
    }
}

/// The full set of reading-driven rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTable {
    /// Level assigned when fetal movements are recorded as absent. Required, and always above
    /// the default category.
    absent_fetal_movements: CategoryKey,
    #[serde(default)]
    thresholds: Vec<ThresholdRule>,
}

impl RuleTable {
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidReference`] if rule ids repeat or the fetal-movement level is
    /// not an escalating severity band.
    pub fn new(
        absent_fetal_movements: CategoryKey,
        thresholds: Vec<ThresholdRule>,
    ) -> RiskResult<Self> {
        let table = Self {
            absent_fetal_movements,
            thresholds,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> RiskResult<()> {
        let level = self.absent_fetal_movements;
        if !level.is_severity_band() || level == CategoryKey::Normal {
            return Err(RiskError::InvalidReference(format!(
                "absent_fetal_movements level '{level}' must be a severity band above normal"
            )));
        }

        let mut ids = HashSet::new();
        for rule in &self.thresholds {
            if !ids.insert(rule.id()) {
                return Err(RiskError::InvalidReference(format!(
                    "duplicate threshold rule id '{}'",
                    rule.id()
                )));
            }
        }
        Ok(())
    }

    pub fn absent_fetal_movements(&self) -> CategoryKey {
        self.absent_fetal_movements
    }

    /// Rules in table order.
    pub fn thresholds(&self) -> &[ThresholdRule] {
        &self.thresholds
    }
}
