//! File-backed reading store.
//!
//! Readings are kept one JSON object per line. Every mutation takes an
//! exclusive lock on a sidecar lock file, reloads the file, applies the change
//! and atomically replaces the file, so a batch lands completely or not at all.
//! Lines that fail to parse are kept verbatim and skipped when listing.

use crate::store::{insert_new, remove_owned, replace_owned, ReadingStore};
use crate::{Error, GlucoseReading, NewReading, ReadingId, Result, UserId};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JSONL-based reading store with file locking
pub struct JsonlStore {
    path: PathBuf,
}

struct Contents {
    readings: Vec<GlucoseReading>,
    unparsed: Vec<String>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn open_lock(&self) -> Result<File> {
        std::fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        Ok(file)
    }

    fn load(&self) -> Result<Contents> {
        let mut contents = Contents {
            readings: Vec::new(),
            unparsed: Vec::new(),
        };
        if !self.path.exists() {
            return Ok(contents);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<GlucoseReading>(&line) {
                Ok(reading) => contents.readings.push(reading),
                Err(e) => {
                    tracing::warn!("Failed to parse reading at line {}: {}", line_num + 1, e);
                    contents.unparsed.push(line);
                }
            }
        }

        tracing::debug!("Read {} readings from {:?}", contents.readings.len(), self.path);
        Ok(contents)
    }

    /// Atomically replace the store file
    fn save(&self, contents: &Contents) -> Result<()> {
        let temp = NamedTempFile::new_in(self.parent_dir())?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for reading in &contents.readings {
                writer.write_all(serde_json::to_string(reading)?.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            for line in &contents.unparsed {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Load, modify and save under an exclusive lock
    fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<GlucoseReading>) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut contents| {
            let value = f(&mut contents.readings)?;
            self.save(&contents)?;
            Ok(value)
        });

        lock.unlock()?;
        result
    }
}

impl ReadingStore for JsonlStore {
    fn create(&mut self, owner: &UserId, fields: NewReading) -> Result<GlucoseReading> {
        let reading = self
            .mutate(|readings| Ok(insert_new(readings, owner, vec![fields])))?
            .pop()
            .ok_or_else(|| Error::Other("reading was not created".into()))?;
        tracing::debug!("Created reading {} for {}", reading.id, owner);
        Ok(reading)
    }

    fn list_all(&self, owner: &UserId) -> Result<Vec<GlucoseReading>> {
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let contents = self.load();
        lock.unlock()?;

        Ok(contents?
            .readings
            .into_iter()
            .filter(|r| &r.owner_id == owner)
            .collect())
    }

    fn update(&mut self, id: ReadingId, owner: &UserId, fields: NewReading) -> Result<GlucoseReading> {
        let reading = self.mutate(|readings| replace_owned(readings, id, owner, fields))?;
        tracing::debug!("Updated reading {}", id);
        Ok(reading)
    }

    fn delete(&mut self, id: ReadingId, owner: &UserId) -> Result<GlucoseReading> {
        let reading = self.mutate(|readings| remove_owned(readings, id, owner))?;
        tracing::debug!("Deleted reading {}", id);
        Ok(reading)
    }

    fn create_many(&mut self, owner: &UserId, batch: Vec<NewReading>) -> Result<Vec<GlucoseReading>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.mutate(|readings| Ok(insert_new(readings, owner, batch)))?;
        tracing::info!("Stored batch of {} readings for {}", created.len(), owner);
        Ok(created)
    }
}
