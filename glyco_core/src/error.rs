//! Error types for the glyco_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for glyco_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A raw field failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No reading with this id exists under the caller's owner
    #[error("Reading not found: {id}")]
    NotFound { id: String },

    /// No caller identity was supplied
    #[error("Unauthorized: no owner identity available")]
    Unauthorized,

    /// An atomic import was rejected because at least one row failed
    #[error("Import rejected: {0}")]
    Import(ImportFailure),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Field of a raw reading that failed validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Date,
    Time,
    Value,
    AgeYears,
    Source,
    Condition,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Date => "date",
            Field::Time => "time",
            Field::Value => "value",
            Field::AgeYears => "age_years",
            Field::Source => "source",
            Field::Condition => "condition",
        };
        f.write_str(name)
    }
}

/// Why a field was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    NotANumber,
    NotAnInteger,
    OutOfRange,
    UnrecognizedEnumValue,
    InvalidDate,
    InvalidTime,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ValidationReason::Missing => "missing",
            ValidationReason::NotANumber => "not a number",
            ValidationReason::NotAnInteger => "not an integer",
            ValidationReason::OutOfRange => "out of range",
            ValidationReason::UnrecognizedEnumValue => "unrecognized enum value",
            ValidationReason::InvalidDate => "invalid date (expected YYYY-MM-DD)",
            ValidationReason::InvalidTime => "invalid time (expected HH:MM)",
        };
        f.write_str(reason)
    }
}

/// Structured validation failure for a single field
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: Field, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// One rejected row of an import batch (rows are numbered from 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub error: ValidationError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

/// All row failures of a rejected atomic import
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportFailure {
    pub failures: Vec<RowFailure>,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid row(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}
