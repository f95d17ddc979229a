//! Aggregation over an owner's full set of readings.
//!
//! Every function recomputes from scratch: readings are grouped first, then
//! each group is reduced to a value object. Inputs are never mutated and an
//! empty input yields an empty result.

use crate::{Condition, GlucoseReading, Lenient, Source};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-day summary statistics
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_count: usize,
    /// Mean value, rounded half-up to an integer
    pub avg: i64,
    pub min: f64,
    pub max: f64,
    pub food_count: usize,
    pub drink_count: usize,
    /// Stored readings whose source token is unrecognized
    pub other_count: usize,
}

/// Named time-of-day interval, keyed by the hour of the reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TimeBucket {
    Morning,
    Midday,
    Afternoon,
    Evening,
    Overnight,
}

impl TimeBucket {
    /// Half-open hour ranges; anything not matched earlier is overnight
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            4..=9 => TimeBucket::Morning,
            10..=14 => TimeBucket::Midday,
            15..=17 => TimeBucket::Afternoon,
            18..=21 => TimeBucket::Evening,
            _ => TimeBucket::Overnight,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBucket::Morning => "Morning (04:00-10:00)",
            TimeBucket::Midday => "Midday (10:00-15:00)",
            TimeBucket::Afternoon => "Afternoon (15:00-18:00)",
            TimeBucket::Evening => "Evening (18:00-22:00)",
            TimeBucket::Overnight => "Overnight (22:00-04:00)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeBucketStat {
    pub count: usize,
    pub avg: i64,
}

/// Food/drink counts for one date
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceComparison {
    pub date: NaiveDate,
    pub food_count: usize,
    pub drink_count: usize,
}

/// Arithmetic mean rounded half-up. Callers never pass an empty slice.
fn rounded_mean(values: &[f64]) -> i64 {
    let sum: f64 = values.iter().sum();
    (sum / values.len() as f64 + 0.5).floor() as i64
}

/// One entry per distinct date, ascending by date
pub fn summarize_by_day(readings: &[GlucoseReading]) -> Vec<DailyStat> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&GlucoseReading>> = BTreeMap::new();
    for reading in readings {
        by_date.entry(reading.date).or_default().push(reading);
    }

    by_date
        .into_iter()
        .map(|(date, group)| {
            let values: Vec<f64> = group.iter().map(|r| r.value).collect();
            let count_source = |source: Source| {
                group
                    .iter()
                    .filter(|r| r.source.known() == Some(source))
                    .count()
            };
            let food_count = count_source(Source::Food);
            let drink_count = count_source(Source::Drink);

            DailyStat {
                date,
                total_count: group.len(),
                avg: rounded_mean(&values),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                food_count,
                drink_count,
                other_count: group.len() - food_count - drink_count,
            }
        })
        .collect()
}

/// Count and rounded mean per time-of-day bucket; empty buckets are omitted
pub fn bucket_by_time_of_day(readings: &[GlucoseReading]) -> BTreeMap<TimeBucket, TimeBucketStat> {
    let mut by_bucket: BTreeMap<TimeBucket, Vec<f64>> = BTreeMap::new();
    for reading in readings {
        by_bucket
            .entry(TimeBucket::for_hour(reading.hour()))
            .or_default()
            .push(reading.value);
    }

    by_bucket
        .into_iter()
        .map(|(bucket, values)| {
            let stat = TimeBucketStat {
                count: values.len(),
                avg: rounded_mean(&values),
            };
            (bucket, stat)
        })
        .collect()
}

/// Count per condition actually present; absent conditions are not zero-filled
pub fn distribution_by_condition(readings: &[GlucoseReading]) -> BTreeMap<Lenient<Condition>, usize> {
    let mut counts = BTreeMap::new();
    for reading in readings {
        *counts.entry(reading.condition.clone()).or_insert(0) += 1;
    }
    counts
}

/// Food/drink counts per date, in order of each date's first occurrence.
///
/// This does not sort; callers wanting date order sort the result themselves.
pub fn compare_source_by_date(readings: &[GlucoseReading]) -> Vec<SourceComparison> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut groups: BTreeMap<NaiveDate, Vec<&GlucoseReading>> = BTreeMap::new();
    for reading in readings {
        let group = groups.entry(reading.date).or_default();
        if group.is_empty() {
            order.push(reading.date);
        }
        group.push(reading);
    }

    order
        .into_iter()
        .map(|date| {
            let group = groups.get(&date).map(Vec::as_slice).unwrap_or_default();
            let count_source = |source: Source| {
                group
                    .iter()
                    .filter(|r| r.source.known() == Some(source))
                    .count()
            };
            SourceComparison {
                date,
                food_count: count_source(Source::Food),
                drink_count: count_source(Source::Drink),
            }
        })
        .collect()
}
