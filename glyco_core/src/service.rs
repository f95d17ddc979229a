//! Request/response operations over a reading store.
//!
//! Each call validates its raw input, talks to the store on behalf of one
//! owner and returns the stored result. No state is kept between calls.

use crate::error::{ImportFailure, RowFailure};
use crate::validation::validate_and_normalize;
use crate::{
    Condition, Error, GlucoseReading, Lenient, NewReading, RawReadingInput, ReadingId,
    ReadingStore, Result, Source, UserId,
};
use serde::{Deserialize, Serialize};

/// How a bulk import treats invalid rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Every valid row is stored; invalid rows are reported
    #[default]
    BestEffort,
    /// Any invalid row rejects the whole batch and nothing is stored
    Atomic,
}

/// Outcome of a bulk import
#[derive(Clone, Debug)]
pub struct ImportReport {
    /// Readings created by this import
    pub stored: Vec<GlucoseReading>,
    pub failures: Vec<RowFailure>,
    /// The owner's full list after the import
    pub readings: Vec<GlucoseReading>,
}

/// Presentation-level filter over an owner's full list
#[derive(Clone, Debug, Default)]
pub struct ReadingFilter {
    /// Case-insensitive substring of the note
    pub search: Option<String>,
    pub source: Option<Source>,
    pub condition: Option<Condition>,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &GlucoseReading) -> bool {
        let matches_search = match &self.search {
            Some(term) => reading
                .note
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        };
        let matches_source = self
            .source
            .map_or(true, |s| reading.source == Lenient::Known(s));
        let matches_condition = self
            .condition
            .map_or(true, |c| reading.condition == Lenient::Known(c));

        matches_search && matches_source && matches_condition
    }
}

pub struct ReadingService<S> {
    store: S,
}

impl<S: ReadingStore> ReadingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create(&mut self, owner: &UserId, input: &RawReadingInput) -> Result<GlucoseReading> {
        let fields = validate_and_normalize(input)?;
        let reading = self.store.create(owner, fields)?;
        tracing::info!("Stored reading {} ({} mg/dL)", reading.id, reading.value);
        Ok(reading)
    }

    /// All of the owner's readings, newest first
    pub fn list(&self, owner: &UserId) -> Result<Vec<GlucoseReading>> {
        let mut readings = self.store.list_all(owner)?;
        readings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(readings)
    }

    pub fn list_filtered(&self, owner: &UserId, filter: &ReadingFilter) -> Result<Vec<GlucoseReading>> {
        Ok(self
            .list(owner)?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    pub fn update(
        &mut self,
        owner: &UserId,
        id: ReadingId,
        input: &RawReadingInput,
    ) -> Result<GlucoseReading> {
        let fields = validate_and_normalize(input)?;
        let reading = self.store.update(id, owner, fields)?;
        tracing::info!("Updated reading {}", id);
        Ok(reading)
    }

    pub fn delete(&mut self, owner: &UserId, id: ReadingId) -> Result<GlucoseReading> {
        let reading = self.store.delete(id, owner)?;
        tracing::info!("Deleted reading {}", id);
        Ok(reading)
    }

    /// Import a batch of raw rows (numbered from 1 in the report)
    pub fn import(
        &mut self,
        owner: &UserId,
        rows: &[RawReadingInput],
        mode: ImportMode,
    ) -> Result<ImportReport> {
        let (stored, failures) = match mode {
            ImportMode::BestEffort => self.import_best_effort(owner, rows)?,
            ImportMode::Atomic => (self.import_atomic(owner, rows)?, Vec::new()),
        };

        for failure in &failures {
            tracing::warn!("Skipped import {}", failure);
        }
        tracing::info!(
            "Imported {} of {} rows ({} failed)",
            stored.len(),
            rows.len(),
            failures.len()
        );

        Ok(ImportReport {
            stored,
            failures,
            readings: self.list(owner)?,
        })
    }

    /// Valid rows are written in one batch; a failing row never blocks the others
    fn import_best_effort(
        &mut self,
        owner: &UserId,
        rows: &[RawReadingInput],
    ) -> Result<(Vec<GlucoseReading>, Vec<RowFailure>)> {
        let (batch, failures) = validate_rows(rows);
        let stored = if batch.is_empty() {
            Vec::new()
        } else {
            self.store.create_many(owner, batch)?
        };
        Ok((stored, failures))
    }

    fn import_atomic(&mut self, owner: &UserId, rows: &[RawReadingInput]) -> Result<Vec<GlucoseReading>> {
        let (batch, failures) = validate_rows(rows);
        if !failures.is_empty() {
            return Err(Error::Import(ImportFailure { failures }));
        }
        self.store.create_many(owner, batch)
    }
}

/// Split rows into validated readings and numbered failures (rows count from 1)
fn validate_rows(rows: &[RawReadingInput]) -> (Vec<NewReading>, Vec<RowFailure>) {
    let mut batch = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        match validate_and_normalize(row) {
            Ok(fields) => batch.push(fields),
            Err(error) => failures.push(RowFailure { row: idx + 1, error }),
        }
    }

    (batch, failures)
}
