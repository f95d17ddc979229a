#![forbid(unsafe_code)]

//! Core domain model and business logic for the Glyco glucose journal.
//!
//! This crate provides:
//! - Domain types (readings, sources, conditions, status)
//! - Input validation and age-banded classification
//! - Aggregation (daily summary, time-of-day buckets, distributions)
//! - Spreadsheet codec and paginated document rendering
//! - Persistence (record store façade, JSONL store) and the reading service

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod validation;
pub mod classify;
pub mod aggregate;
pub mod table;
pub mod document;
pub mod store;
pub mod jsonl_store;
pub mod service;

// Re-export commonly used types
pub use error::{Error, Field, ImportFailure, Result, RowFailure, ValidationError, ValidationReason};
pub use types::*;
pub use config::Config;
pub use validation::validate_and_normalize;
pub use classify::{classify, classify_reported, AgeBand};
pub use aggregate::{
    bucket_by_time_of_day, compare_source_by_date, distribution_by_condition, summarize_by_day,
    DailyStat, SourceComparison, TimeBucket, TimeBucketStat,
};
pub use table::{from_table, to_table, TableRow};
pub use document::{render_document, Document, DocumentOptions};
pub use store::{MemoryStore, ReadingStore};
pub use jsonl_store::JsonlStore;
pub use service::{ImportMode, ImportReport, ReadingFilter, ReadingService};
