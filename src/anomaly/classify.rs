//! Threshold and minimum-volume rules that turn z-scores into anomaly flags.

use chrono::NaiveDate;
use serde::Serialize;

use super::rolling::RollingStats;
use crate::error::{Error, Result};

/// Inclusive date range a caller asked to be judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::invalid(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One judged day of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRow {
    pub date: NaiveDate,
    pub avg_dep_delay: Option<f64>,
    pub num_flights: u32,
    pub z_score: f64,
    pub is_anomaly: bool,
}

/// A day flagged as anomalous.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyResult {
    pub date: NaiveDate,
    pub avg_dep_delay: Option<f64>,
    pub num_flights: u32,
    pub z_score: f64,
}

impl From<&AnomalyRow> for AnomalyResult {
    fn from(row: &AnomalyRow) -> Self {
        Self {
            date: row.date,
            avg_dep_delay: row.avg_dep_delay,
            num_flights: row.num_flights,
            z_score: row.z_score,
        }
    }
}

/// Restricts `stats` to `range`, drops days with fewer than `min_flights`
/// flights and flags `|z_score| > threshold`.
///
/// Output is ascending by date. Dropped days are neither anomalies nor
/// non-anomalies; they simply do not appear.
pub fn classify(
    stats: &[RollingStats],
    range: DateRange,
    threshold: f64,
    min_flights: u32,
) -> Vec<AnomalyRow> {
    let mut rows: Vec<AnomalyRow> = stats
        .iter()
        .filter(|s| range.contains(s.date))
        .filter(|s| s.num_flights >= min_flights)
        .map(|s| AnomalyRow {
            date: s.date,
            avg_dep_delay: s.avg_dep_delay,
            num_flights: s.num_flights,
            z_score: s.z_score,
            is_anomaly: s.z_score.abs() > threshold,
        })
        .collect();

    rows.sort_by_key(|r| r.date);
    rows
}

/// Only the flagged rows of a report.
pub fn anomalies_only(rows: &[AnomalyRow]) -> Vec<AnomalyResult> {
    rows.iter()
        .filter(|r| r.is_anomaly)
        .map(AnomalyResult::from)
        .collect()
}
