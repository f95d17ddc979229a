//! Validation and normalization of raw reading input.
//!
//! Fields are checked in declaration order and the first failure is returned.
//! Nothing is ever silently corrected: a non-numeric value is an error, not zero.

use crate::error::{Field, ValidationError, ValidationReason};
use crate::{Condition, NewReading, RawReadingInput, RawValue, Source, Vocabulary};
use chrono::{NaiveDate, NaiveTime};

/// Upper bound of the accepted glucose range, mg/dL
pub const MAX_VALUE_MG_DL: f64 = 1000.0;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Validate a raw field bag into a reading ready for storage.
///
/// Identity fields (id, owner, created_at) are assigned by the store.
pub fn validate_and_normalize(input: &RawReadingInput) -> Result<NewReading, ValidationError> {
    let date = parse_date(input.date.as_deref())?;
    let time = parse_time(input.time.as_deref())?;
    let value = parse_value(input.value.as_ref())?;
    let age_years = parse_age(input.age_years.as_ref())?;
    let source = parse_token::<Source>(Field::Source, input.source.as_deref())?;
    let condition = parse_token::<Condition>(Field::Condition, input.condition.as_deref())?;

    let note = input
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(NewReading {
        date,
        time,
        value,
        age_years,
        source,
        condition,
        note,
    })
}

fn required(field: Field, raw: Option<&str>) -> Result<&str, ValidationError> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ValidationError::new(field, ValidationReason::Missing)),
    }
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, ValidationError> {
    let s = required(Field::Date, raw)?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ValidationError::new(Field::Date, ValidationReason::InvalidDate))
}

fn parse_time(raw: Option<&str>) -> Result<NaiveTime, ValidationError> {
    let s = required(Field::Time, raw)?;
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| ValidationError::new(Field::Time, ValidationReason::InvalidTime))
}

/// Coerce a raw numeric field; empty text and non-numeric text are both "not a number"
fn parse_number(field: Field, raw: Option<&RawValue>) -> Result<f64, ValidationError> {
    let not_a_number = ValidationError::new(field, ValidationReason::NotANumber);
    let number = match raw {
        None => return Err(not_a_number),
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => s.trim().parse::<f64>().map_err(|_| not_a_number.clone())?,
    };

    if !number.is_finite() {
        return Err(not_a_number);
    }
    Ok(number)
}

fn parse_value(raw: Option<&RawValue>) -> Result<f64, ValidationError> {
    check_value(parse_number(Field::Value, raw)?)
}

/// Check an already numeric glucose value against the accepted range
pub fn check_value(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(Field::Value, ValidationReason::NotANumber));
    }
    if !(0.0..=MAX_VALUE_MG_DL).contains(&value) {
        return Err(ValidationError::new(Field::Value, ValidationReason::OutOfRange));
    }
    Ok(value)
}

fn parse_age(raw: Option<&RawValue>) -> Result<u32, ValidationError> {
    let age = parse_number(Field::AgeYears, raw)?;
    if age < 0.0 || age > u32::MAX as f64 {
        return Err(ValidationError::new(Field::AgeYears, ValidationReason::OutOfRange));
    }
    if age.fract() != 0.0 {
        return Err(ValidationError::new(Field::AgeYears, ValidationReason::NotAnInteger));
    }
    Ok(age as u32)
}

fn parse_token<T: Vocabulary>(field: Field, raw: Option<&str>) -> Result<T, ValidationError> {
    let token = required(field, raw)?;
    T::from_token(token)
        .ok_or_else(|| ValidationError::new(field, ValidationReason::UnrecognizedEnumValue))
}
