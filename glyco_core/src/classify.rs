//! Age-banded classification of glucose values.
//!
//! The result is computed on demand and never persisted, so changing a
//! threshold here reclassifies every historical reading.

use crate::Status;

/// Life-stage band selecting the thresholds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeBand {
    /// Under 6 years
    Toddler,
    /// 6 to 12 years inclusive
    Child,
    /// Over 12 years
    Adult,
}

impl AgeBand {
    pub fn for_age(age_years: u32) -> Self {
        match age_years {
            0..=5 => AgeBand::Toddler,
            6..=12 => AgeBand::Child,
            _ => AgeBand::Adult,
        }
    }

    /// (low, high): Low below `low`, High above `high`, both mg/dL
    pub fn thresholds(&self) -> (f64, f64) {
        match self {
            AgeBand::Toddler => (100.0, 200.0),
            AgeBand::Child => (70.0, 150.0),
            AgeBand::Adult => (70.0, 130.0),
        }
    }
}

/// Classify a value for a subject of the given age.
///
/// No age, or a value that is not a finite number, means `Undetermined`.
/// Callers holding unvalidated input should run it through
/// [`crate::validation::check_value`] first.
pub fn classify(value: f64, age_years: Option<u32>) -> Status {
    let Some(age) = age_years else {
        return Status::Undetermined;
    };
    if !value.is_finite() {
        return Status::Undetermined;
    }

    let (low, high) = AgeBand::for_age(age).thresholds();
    if value < low {
        Status::Low
    } else if value > high {
        Status::High
    } else {
        Status::Normal
    }
}

/// Classify with a free-text age as reported by the user
pub fn classify_reported(value: f64, age: &str) -> Status {
    classify(value, age.trim().parse::<u32>().ok())
}
