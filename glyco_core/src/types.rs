//! Core domain types for the glucose journal.
//!
//! This module defines the fundamental types used throughout the system:
//! - Owner and reading identities
//! - Closed vocabularies (source, condition) and the derived status
//! - The raw input field bag received from an external boundary
//! - Validated readings and stored readings

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

// ============================================================================
// Identity Types
// ============================================================================

/// Identity of the user owning a reading, supplied by the trust boundary
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Resolve the caller's identity; an absent or blank id is rejected immediately.
    pub fn from_caller(id: Option<&str>) -> Result<Self> {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Self(id.to_string())),
            _ => Err(Error::Unauthorized),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reading identifier, assigned by the store at creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingId(Uuid);

impl ReadingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReadingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ReadingId {
    type Err = Error;

    /// A string that is not a reading id cannot name any stored reading.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::NotFound { id: s.to_string() })
    }
}

// ============================================================================
// Vocabularies
// ============================================================================

/// A closed set of tokens with human-readable labels
pub trait Vocabulary: Sized + Copy + 'static {
    /// Every member, in display order
    const ALL: &'static [Self];

    /// Stable token used in storage and raw input
    fn token(&self) -> &'static str;

    /// Human-readable label used in tables and documents
    fn label(&self) -> &'static str;

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.token() == token)
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }
}

/// What triggered the measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Food,
    Drink,
}

impl Vocabulary for Source {
    const ALL: &'static [Self] = &[Source::Food, Source::Drink];

    fn token(&self) -> &'static str {
        match self {
            Source::Food => "food",
            Source::Drink => "drink",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Source::Food => "Food",
            Source::Drink => "Drink",
        }
    }
}

/// Physiological context of the measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    /// Unfasted / random measurement
    Normal,
    Fasting,
    AfterMeal,
    BeforeSleep,
}

impl Vocabulary for Condition {
    const ALL: &'static [Self] = &[
        Condition::Normal,
        Condition::Fasting,
        Condition::AfterMeal,
        Condition::BeforeSleep,
    ];

    fn token(&self) -> &'static str {
        match self {
            Condition::Normal => "normal",
            Condition::Fasting => "fasting",
            Condition::AfterMeal => "after-meal",
            Condition::BeforeSleep => "before-sleep",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Condition::Normal => "As-needed",
            Condition::Fasting => "Fasting",
            Condition::AfterMeal => "Post-meal",
            Condition::BeforeSleep => "Before-sleep",
        }
    }
}

/// A vocabulary value as found in storage.
///
/// Validated input only ever produces `Known`. Tokens written by older or
/// foreign tools load as `Unrecognized` so the aggregation and export paths
/// can still render them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lenient<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: Vocabulary> Lenient<T> {
    pub fn from_token(token: &str) -> Self {
        match T::from_token(token) {
            Some(value) => Lenient::Known(value),
            None => Lenient::Unrecognized(token.to_string()),
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Lenient::Known(value) => Some(*value),
            Lenient::Unrecognized(_) => None,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Lenient::Known(value) => value.token(),
            Lenient::Unrecognized(token) => token,
        }
    }

    pub fn label(&self) -> Cow<'static, str> {
        match self {
            Lenient::Known(value) => Cow::Borrowed(value.label()),
            Lenient::Unrecognized(token) => Cow::Owned(format!("Unrecognized ({})", token)),
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Known(value)
    }
}

impl<T: Vocabulary> Serialize for Lenient<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de, T: Vocabulary> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Lenient::from_token(&token))
    }
}

/// Derived clinical-style label; computed on demand, never stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Low,
    Normal,
    High,
    Undetermined,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Low => "Low",
            Status::Normal => "Normal",
            Status::High => "High",
            Status::Undetermined => "Undetermined",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Raw Input
// ============================================================================

/// A numeric field as received: either a number or its text form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Unvalidated field bag for creating or replacing a reading
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReadingInput {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, alias = "bloodSugar")]
    pub value: Option<RawValue>,
    #[serde(default, alias = "age", alias = "ageYears")]
    pub age_years: Option<RawValue>,
    #[serde(default, alias = "type")]
    pub source: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default, alias = "description")]
    pub note: Option<String>,
}

// ============================================================================
// Readings
// ============================================================================

/// All mutable fields of a reading after validation
#[derive(Clone, Debug, PartialEq)]
pub struct NewReading {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// mg/dL
    pub value: f64,
    pub age_years: u32,
    pub source: Source,
    pub condition: Condition,
    pub note: Option<String>,
}

/// A stored glucose reading, owned by exactly one user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub id: ReadingId,
    pub owner_id: UserId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// mg/dL
    pub value: f64,
    /// Absent only on legacy records
    #[serde(default)]
    pub age_years: Option<u32>,
    pub source: Lenient<Source>,
    pub condition: Lenient<Condition>,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GlucoseReading {
    /// Build a stored reading from validated fields with a fresh id
    pub fn from_new(owner_id: UserId, fields: NewReading, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ReadingId::new(),
            owner_id,
            date: fields.date,
            time: fields.time,
            value: fields.value,
            age_years: Some(fields.age_years),
            source: fields.source.into(),
            condition: fields.condition.into(),
            note: fields.note,
            created_at,
        }
    }

    /// Replace every mutable field; id, owner and created_at are untouched
    pub fn replace_fields(&mut self, fields: NewReading) {
        self.date = fields.date;
        self.time = fields.time;
        self.value = fields.value;
        self.age_years = Some(fields.age_years);
        self.source = fields.source.into();
        self.condition = fields.condition.into();
        self.note = fields.note;
    }

    pub fn status(&self) -> Status {
        crate::classify::classify(self.value, self.age_years)
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}
