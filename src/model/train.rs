//! Training entry point: extract, assemble, split, fit, evaluate, persist.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::artifact::ModelArtifact;
use super::logistic::LogisticConfig;
use super::metrics::{
    ClassReport, REPORT_THRESHOLDS, ThresholdMetrics, ValidationMetrics, classification_report,
    threshold_metrics, validation_metrics,
};
use super::pipeline::DelayPipeline;
use super::split::stratified_split;
use crate::error::{Error, Result};
use crate::features::{FeatureSchema, FeatureVector, assemble_training};
use crate::warehouse::{TrainingRecord, Warehouse};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    /// Fraction of rows held out for validation.
    pub test_size: f64,
    /// Optional row limit on the warehouse extract.
    pub limit: Option<usize>,
    /// Seed of the stratified split.
    pub random_state: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            limit: None,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub metrics: ValidationMetrics,
    pub thresholds: Vec<ThresholdMetrics>,
    pub classes: Vec<ClassReport>,
    pub extracted_rows: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
}

/// Fits a new artifact from raw extract records without touching storage.
///
/// # Errors
///
/// [`Error::InsufficientData`] if no complete row survives or only one label
/// class is present.
pub fn fit_artifact(
    records: Vec<TrainingRecord>,
    options: &TrainOptions,
) -> Result<(ModelArtifact, TrainingReport)> {
    let extracted_rows = records.len();
    let examples = assemble_training(records);
    if examples.is_empty() {
        return Err(Error::insufficient(format!(
            "none of the {} extracted rows has every required field",
            extracted_rows
        )));
    }

    let (rows, labels): (Vec<FeatureVector>, Vec<bool>) =
        examples.into_iter().map(|e| (e.features, e.delayed)).unzip();

    let delayed = labels.iter().filter(|l| **l).count();
    if delayed == 0 || delayed == labels.len() {
        return Err(Error::insufficient(format!(
            "all {} rows share one label; both delayed and on-time flights are needed",
            labels.len()
        )));
    }

    let split = stratified_split(&labels, options.test_size, options.random_state)?;
    let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<bool>) {
        idx.iter().map(|&i| (rows[i].clone(), labels[i])).unzip()
    };
    let (train_x, train_y) = pick(&split.train);
    let (valid_x, valid_y) = pick(&split.validation);

    info!(
        train_rows = train_x.len(),
        validation_rows = valid_x.len(),
        delayed_share = delayed as f64 / labels.len() as f64,
        "Training logistic regression"
    );
    let pipeline = DelayPipeline::fit(
        &train_x,
        &train_y,
        FeatureSchema::canonical(),
        &LogisticConfig::default(),
    )?;

    let proba = pipeline.predict_proba_batch(&valid_x)?;
    let thresholds: Vec<ThresholdMetrics> = REPORT_THRESHOLDS
        .iter()
        .map(|&t| threshold_metrics(&valid_y, &proba, t))
        .collect();
    for m in &thresholds {
        info!(
            threshold = m.threshold,
            accuracy = m.accuracy,
            precision = m.precision,
            recall = m.recall,
            "Metrics at threshold"
        );
    }

    let metrics = validation_metrics(&valid_y, &proba);
    info!(
        accuracy = metrics.accuracy,
        precision = metrics.precision,
        recall = metrics.recall,
        roc_auc = metrics.roc_auc,
        "Validation metrics"
    );

    let classes = classification_report(&valid_y, &proba);
    for c in &classes {
        info!(
            class = %c.label,
            precision = c.precision,
            recall = c.recall,
            f1 = c.f1,
            support = c.support,
            "Classification report"
        );
    }

    let report = TrainingReport {
        metrics,
        thresholds,
        classes,
        extracted_rows,
        train_rows: train_x.len(),
        validation_rows: valid_x.len(),
    };
    Ok((ModelArtifact::new(pipeline, metrics), report))
}

/// Trains on the warehouse extract and replaces the artifact at `model_path`.
///
/// The fit runs on a blocking worker thread; the previous artifact stays
/// readable until the new one is renamed into place.
#[tracing::instrument(skip(warehouse, model_path), fields(model_path = %model_path.display()))]
pub async fn train_model<W: Warehouse + ?Sized>(
    warehouse: &W,
    options: &TrainOptions,
    model_path: &Path,
) -> Result<TrainingReport> {
    let records = warehouse.training_extract(options.limit).await?;
    info!(rows = records.len(), "Training extract loaded");

    let opts = *options;
    let (artifact, report) =
        tokio::task::spawn_blocking(move || fit_artifact(records, &opts)).await??;

    artifact.save(model_path)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Rain and evening departures make delays likely; the rest mostly on time.
    fn synthetic_records(n: usize) -> Vec<TrainingRecord> {
        let origin: NaiveDate = "2023-01-01".parse().unwrap();
        (0..n)
            .map(|i| {
                let wet = i % 3 == 0;
                let evening = i % 4 == 0;
                let delayed = (wet && evening) || (wet && i % 5 != 0) || i % 17 == 0;
                TrainingRecord {
                    flight_date: origin + Duration::days((i % 40) as i64),
                    dep_airport_id: Some(["JFK", "ATL", "ORD"][i % 3].into()),
                    arr_airport_id: Some(["LAX", "SFO"][i % 2].into()),
                    airline_id: Some(["DL", "AA", "UA", "WN"][i % 4].into()),
                    dep_time_label: Some(if evening { "Evening" } else { "Morning" }.into()),
                    month: Some(1 + (i % 12) as u32),
                    day_of_week: Some(1 + (i % 7) as u32),
                    is_weekend: Some(i % 7 >= 5),
                    tavg: Some(5.0 + (i % 11) as f64),
                    prcp: Some(if wet { 12.0 + (i % 5) as f64 } else { (i % 2) as f64 * 0.2 }),
                    wspd: Some(8.0 + (i % 6) as f64),
                    is_delayed_15: Some(delayed),
                }
            })
            .collect()
    }

    #[test]
    fn test_fit_artifact_reports_metrics() {
        let (artifact, report) = fit_artifact(synthetic_records(600), &TrainOptions::default())
            .unwrap();

        assert_eq!(report.train_rows + report.validation_rows, 600);
        assert_eq!(report.thresholds.len(), 3);
        assert_eq!(report.classes.len(), 2);
        assert!(report.metrics.roc_auc > 0.7, "auc = {}", report.metrics.roc_auc);
        assert_eq!(artifact.schema(), FeatureSchema::canonical());
        assert_eq!(artifact.metrics, report.metrics);
    }

    #[test]
    fn test_same_seed_same_metrics() {
        let options = TrainOptions::default();
        let (_, a) = fit_artifact(synthetic_records(300), &options).unwrap();
        let (_, b) = fit_artifact(synthetic_records(300), &options).unwrap();
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_single_class_is_insufficient() {
        let mut records = synthetic_records(100);
        records.iter_mut().for_each(|r| r.is_delayed_15 = Some(false));
        assert!(matches!(
            fit_artifact(records, &TrainOptions::default()),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_all_rows_incomplete_is_insufficient() {
        let mut records = synthetic_records(50);
        records.iter_mut().for_each(|r| r.wspd = None);
        assert!(matches!(
            fit_artifact(records, &TrainOptions::default()),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_empty_extract_is_insufficient() {
        assert!(matches!(
            fit_artifact(Vec::new(), &TrainOptions::default()),
            Err(Error::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_train_model_persists_artifact() {
        use crate::warehouse::{FlightFactRow, MemoryWarehouse};

        let rows: Vec<FlightFactRow> = synthetic_records(200)
            .into_iter()
            .map(|r| FlightFactRow {
                flight_date: r.flight_date,
                dep_airport_id: r.dep_airport_id,
                arr_airport_id: r.arr_airport_id,
                airline_id: r.airline_id,
                dep_time_label: r.dep_time_label,
                dep_delay_min: None,
                is_delayed_15: r.is_delayed_15.map(|d| d.to_string()),
                tavg: r.tavg,
                prcp: r.prcp,
                wspd: r.wspd,
            })
            .collect();
        let warehouse = MemoryWarehouse::new(rows);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logreg_delay.json");

        let report = train_model(&warehouse, &TrainOptions::default(), &path)
            .await
            .unwrap();

        let stored = ModelArtifact::load(&path).unwrap();
        assert!((stored.metrics.roc_auc - report.metrics.roc_auc).abs() < 1e-12);
        assert_eq!(stored.schema(), FeatureSchema::canonical());
    }
}
