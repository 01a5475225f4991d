//! Output formatting and persistence for anomaly and training reports.
//!
//! Supports JSON on stdout, CSV report files, and an append-only metrics log.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::anomaly::{AnomalyResult, AnomalyRow};
use crate::model::TrainingReport;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Prints any serializable report to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A row type with a fixed CSV header, so an empty report still carries one.
pub trait CsvRecord: Serialize {
    /// Column names in field order.
    const HEADER: &'static [&'static str];
}

impl CsvRecord for AnomalyRow {
    const HEADER: &'static [&'static str] =
        &["date", "avg_dep_delay", "num_flights", "z_score", "is_anomaly"];
}

impl CsvRecord for AnomalyResult {
    const HEADER: &'static [&'static str] = &["date", "avg_dep_delay", "num_flights", "z_score"];
}

/// Writes `rows` to a fresh CSV file at `path`, header first even when
/// there are no rows.
pub fn write_records<T: CsvRecord>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}

/// One line of the training metrics log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsLogRow {
    pub timestamp: DateTime<Utc>,
    pub extracted_rows: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub roc_auc: f64,
}

impl MetricsLogRow {
    pub fn from_report(report: &TrainingReport, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            extracted_rows: report.extracted_rows,
            train_rows: report.train_rows,
            validation_rows: report.validation_rows,
            accuracy: report.metrics.accuracy,
            precision: report.metrics.precision,
            recall: report.metrics.recall,
            roc_auc: report.metrics.roc_auc,
        }
    }
}

/// Appends a [`MetricsLogRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, row: &MetricsLogRow) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationMetrics;
    use chrono::NaiveDate;

    fn report() -> TrainingReport {
        TrainingReport {
            metrics: ValidationMetrics {
                accuracy: 0.8,
                precision: 0.5,
                recall: 0.25,
                roc_auc: 0.71,
            },
            thresholds: Vec::new(),
            classes: Vec::new(),
            extracted_rows: 120,
            train_rows: 96,
            validation_rows: 24,
        }
    }

    fn row() -> MetricsLogRow {
        MetricsLogRow::from_report(&report(), Utc::now())
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&report()).unwrap();
    }

    #[test]
    fn test_append_record_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("metrics.csv");

        append_record(&path, &row()).unwrap();

        assert!(path.exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("roc_auc"));
        assert!(content.contains("0.71"));
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        append_record(&path, &row()).unwrap();
        append_record(&path, &row()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_write_records_anomaly_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let rows = vec![AnomalyResult {
            date: NaiveDate::from_ymd_opt(2023, 2, 10).unwrap(),
            avg_dep_delay: Some(61.5),
            num_flights: 44,
            z_score: 4.2,
        }];

        write_records(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "date,avg_dep_delay,num_flights,z_score");
        assert_eq!(lines[1], "2023-02-10,61.5,44,4.2");
    }

    #[test]
    fn test_write_records_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "stale\nstale\nstale\n").unwrap();

        write_records::<AnomalyResult>(&path, &[]).unwrap();

        assert!(!fs::read_to_string(&path).unwrap().contains("stale"));
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_records::<AnomalyRow>(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "date,avg_dep_delay,num_flights,z_score,is_anomaly\n");
    }

    #[test]
    fn test_header_matches_serialized_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let row = AnomalyRow {
            date: NaiveDate::from_ymd_opt(2023, 2, 10).unwrap(),
            avg_dep_delay: None,
            num_flights: 30,
            z_score: 0.0,
            is_anomaly: false,
        };

        write_records(&path, &[row]).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, AnomalyRow::HEADER);
        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(record.len(), AnomalyRow::HEADER.len());
        assert_eq!(&record[1], "");
    }
}
