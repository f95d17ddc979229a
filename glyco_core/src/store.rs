//! Record store façade.
//!
//! Every operation is scoped to one owner: a reading stored under another
//! owner is indistinguishable from a missing one.

use crate::{Error, GlucoseReading, NewReading, ReadingId, Result, UserId};
use chrono::Utc;

/// Persistence contract required by the core
pub trait ReadingStore {
    /// Store a new reading, assigning its id and creation time
    fn create(&mut self, owner: &UserId, fields: NewReading) -> Result<GlucoseReading>;

    /// Every reading of the owner, in no guaranteed order
    fn list_all(&self, owner: &UserId) -> Result<Vec<GlucoseReading>>;

    /// Replace all mutable fields of an owned reading
    fn update(&mut self, id: ReadingId, owner: &UserId, fields: NewReading) -> Result<GlucoseReading>;

    /// Remove an owned reading, returning it
    fn delete(&mut self, id: ReadingId, owner: &UserId) -> Result<GlucoseReading>;

    /// Store a batch of readings
    fn create_many(&mut self, owner: &UserId, batch: Vec<NewReading>) -> Result<Vec<GlucoseReading>>;
}

pub(crate) fn not_found(id: ReadingId) -> Error {
    Error::NotFound { id: id.to_string() }
}

fn position(readings: &[GlucoseReading], id: ReadingId, owner: &UserId) -> Result<usize> {
    readings
        .iter()
        .position(|r| r.id == id && &r.owner_id == owner)
        .ok_or_else(|| not_found(id))
}

pub(crate) fn insert_new(
    readings: &mut Vec<GlucoseReading>,
    owner: &UserId,
    batch: Vec<NewReading>,
) -> Vec<GlucoseReading> {
    let now = Utc::now();
    let created: Vec<GlucoseReading> = batch
        .into_iter()
        .map(|fields| GlucoseReading::from_new(owner.clone(), fields, now))
        .collect();
    readings.extend(created.iter().cloned());
    created
}

pub(crate) fn replace_owned(
    readings: &mut [GlucoseReading],
    id: ReadingId,
    owner: &UserId,
    fields: NewReading,
) -> Result<GlucoseReading> {
    let idx = position(readings, id, owner)?;
    readings[idx].replace_fields(fields);
    Ok(readings[idx].clone())
}

pub(crate) fn remove_owned(
    readings: &mut Vec<GlucoseReading>,
    id: ReadingId,
    owner: &UserId,
) -> Result<GlucoseReading> {
    let idx = position(readings, id, owner)?;
    Ok(readings.remove(idx))
}

/// In-process store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    readings: Vec<GlucoseReading>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadingStore for MemoryStore {
    fn create(&mut self, owner: &UserId, fields: NewReading) -> Result<GlucoseReading> {
        let mut created = insert_new(&mut self.readings, owner, vec![fields]);
        created.pop().ok_or_else(|| Error::Other("reading was not created".into()))
    }

    fn list_all(&self, owner: &UserId) -> Result<Vec<GlucoseReading>> {
        Ok(self
            .readings
            .iter()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect())
    }

    fn update(&mut self, id: ReadingId, owner: &UserId, fields: NewReading) -> Result<GlucoseReading> {
        replace_owned(&mut self.readings, id, owner, fields)
    }

    fn delete(&mut self, id: ReadingId, owner: &UserId) -> Result<GlucoseReading> {
        remove_owned(&mut self.readings, id, owner)
    }

    fn create_many(&mut self, owner: &UserId, batch: Vec<NewReading>) -> Result<Vec<GlucoseReading>> {
        Ok(insert_new(&mut self.readings, owner, batch))
    }
}
