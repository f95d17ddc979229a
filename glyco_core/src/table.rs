//! Tabular (spreadsheet) codec for readings.
//!
//! Header names and label strings are an external contract: files exported
//! by earlier versions must import unchanged.

use crate::{
    Condition, GlucoseReading, RawReadingInput, RawValue, Result, Source, Vocabulary,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

pub const UNIT: &str = "mg/dL";

/// Column headers, in export order
pub const HEADERS: [&str; 8] = [
    "Date",
    "Time",
    "Blood Sugar",
    "Status",
    "Age",
    "Type",
    "Condition",
    "Description",
];

/// One row of the external table, every cell as display text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Time", default)]
    pub time: String,
    #[serde(rename = "Blood Sugar", alias = "Blood Sugar (mg/dL)", default)]
    pub value: String,
    /// Derived on export, ignored on import
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Age", default)]
    pub age: String,
    #[serde(rename = "Type", default)]
    pub source: String,
    #[serde(rename = "Condition", default)]
    pub condition: String,
    #[serde(rename = "Description", default)]
    pub note: String,
}

impl TableRow {
    pub fn cells(&self) -> [&str; 8] {
        [
            &self.date,
            &self.time,
            &self.value,
            &self.status,
            &self.age,
            &self.source,
            &self.condition,
            &self.note,
        ]
    }
}

impl From<&GlucoseReading> for TableRow {
    fn from(reading: &GlucoseReading) -> Self {
        TableRow {
            date: reading.date.format(crate::validation::DATE_FORMAT).to_string(),
            time: reading.time.format(crate::validation::TIME_FORMAT).to_string(),
            value: format!("{} {}", reading.value, UNIT),
            status: reading.status().label().to_string(),
            age: reading.age_years.map(|a| a.to_string()).unwrap_or_default(),
            source: reading.source.label().into_owned(),
            condition: reading.condition.label().into_owned(),
            note: reading.note.clone().unwrap_or_default(),
        }
    }
}

/// Render readings as display rows, in input order
pub fn to_table(readings: &[GlucoseReading]) -> Vec<TableRow> {
    readings.iter().map(TableRow::from).collect()
}

/// Map rows back to raw input; validation happens downstream
pub fn from_table(rows: &[TableRow]) -> Vec<RawReadingInput> {
    rows.iter().map(row_to_input).collect()
}

fn row_to_input(row: &TableRow) -> RawReadingInput {
    RawReadingInput {
        date: Some(row.date.trim().to_string()),
        time: Some(row.time.trim().to_string()),
        value: Some(RawValue::Text(strip_unit(&row.value).to_string())),
        age_years: Some(RawValue::Text(row.age.trim().to_string())),
        source: Some(label_to_token::<Source>(&row.source)),
        condition: Some(label_to_token::<Condition>(&row.condition)),
        note: Some(row.note.clone()),
    }
}

fn strip_unit(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_suffix(UNIT).unwrap_or(cell).trim_end()
}

/// Unknown labels pass through untouched so validation reports them
fn label_to_token<T: Vocabulary>(label: &str) -> String {
    let label = label.trim();
    T::from_label(label)
        .map(|v| v.token().to_string())
        .unwrap_or_else(|| label.to_string())
}

/// Write rows as CSV with a header line, even when there are no rows
pub fn write_csv<W: io::Write>(writer: W, rows: &[TableRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read CSV rows; missing columns become empty cells.
///
/// Cells that are not valid UTF-8 are decoded lossily, so one damaged row
/// fails its own validation instead of the whole file.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<TableRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = decode_record(reader.byte_headers()?);
    let mut rows = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        let record = decode_record(&result?);
        match record.deserialize::<TableRow>(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                // keep the slot so row numbers in the import report stay aligned
                tracing::warn!("Could not decode table row {}: {}", idx + 1, e);
                rows.push(TableRow::default());
            }
        }
    }
    tracing::debug!("Read {} table rows", rows.len());
    Ok(rows)
}

fn decode_record(record: &csv::ByteRecord) -> csv::StringRecord {
    let mut decoded: csv::StringRecord = record.iter().map(String::from_utf8_lossy).collect();
    decoded.trim();
    decoded
}

/// Export readings to a CSV file, syncing it to disk
pub fn export_csv_file(path: &Path, readings: &[GlucoseReading]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let rows = to_table(readings);
    write_csv(&file, &rows)?;
    file.sync_all()?;

    tracing::info!("Exported {} readings to {:?}", rows.len(), path);
    Ok(rows.len())
}

pub fn read_csv_file(path: &Path) -> Result<Vec<TableRow>> {
    read_csv(File::open(path)?)
}
