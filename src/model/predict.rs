//! Single-row inference against the most recently persisted artifact.

use std::path::Path;

use tracing::debug;

use super::artifact::ModelArtifact;
use crate::error::Result;
use crate::features::PredictionInput;

/// P(departure delay >= 15 min) for a fully specified request.
///
/// Reads the artifact at `model_path` on every call. Validation of the input
/// happens before the artifact is touched.
///
/// # Errors
///
/// [`crate::Error::MissingInput`] for absent fields, [`crate::Error::ModelNotFound`]
/// if no model has been trained.
#[tracing::instrument(skip(input, model_path), fields(model_path = %model_path.display()))]
pub fn predict_with_input(model_path: &Path, input: PredictionInput) -> Result<f64> {
    let features = input.into_feature_vector()?;
    let artifact = ModelArtifact::load(model_path)?;
    let proba = artifact.predict_proba(&features)?;

    debug!(
        dep_airport_id = %features.dep_airport_id,
        airline_id = %features.airline_id,
        proba,
        "Delay probability predicted"
    );
    Ok(proba)
}

/// Delay probability with the fixed calendar defaults for unexposed fields
/// (arrival = departure airport, month 1, Monday, not a weekend).
#[allow(clippy::too_many_arguments)]
pub fn predict_delay_proba(
    model_path: &Path,
    airport_id: &str,
    airline_id: &str,
    dep_time_label: &str,
    tavg: f64,
    prcp: f64,
    wspd: f64,
    num_departures_same_slot_airport: u32,
) -> Result<f64> {
    predict_with_input(
        model_path,
        PredictionInput {
            airport_id: Some(airport_id.to_string()),
            airline_id: Some(airline_id.to_string()),
            dep_time_label: Some(dep_time_label.to_string()),
            tavg: Some(tavg),
            prcp: Some(prcp),
            wspd: Some(wspd),
            num_departures_same_slot_airport: Some(num_departures_same_slot_airport),
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::features::{FeatureSchema, FeatureVector};
    use crate::model::logistic::LogisticConfig;
    use crate::model::metrics::ValidationMetrics;
    use crate::model::pipeline::DelayPipeline;
    use proptest::prelude::*;

    fn row(airport: &str, label: &str, prcp: f64, slot: u32) -> FeatureVector {
        FeatureVector {
            dep_airport_id: airport.into(),
            arr_airport_id: "LAX".into(),
            airline_id: "DL".into(),
            dep_time_label: label.into(),
            month: 6,
            day_of_week: 4,
            is_weekend: false,
            tavg: 18.0,
            prcp,
            wspd: 9.0,
            num_departures_same_slot_airport: slot,
        }
    }

    fn trained_model(dir: &Path) -> std::path::PathBuf {
        let rows: Vec<FeatureVector> = (0..80)
            .map(|i| {
                row(
                    ["JFK", "ATL"][i % 2],
                    ["Morning", "Evening"][i % 3 % 2],
                    (i % 8) as f64,
                    (i % 30) as u32,
                )
            })
            .collect();
        let labels: Vec<bool> = (0..80).map(|i| i % 8 >= 5).collect();
        let pipeline = DelayPipeline::fit(
            &rows,
            &labels,
            FeatureSchema::canonical(),
            &LogisticConfig::default(),
        )
        .unwrap();
        let metrics = ValidationMetrics {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            roc_auc: 0.5,
        };

        let path = dir.join("logreg_delay.json");
        ModelArtifact::new(pipeline, metrics).save(&path).unwrap();
        path
    }

    #[test]
    fn test_predict_before_training_is_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = predict_delay_proba(
            &dir.path().join("logreg_delay.json"),
            "JFK",
            "Delta Air Lines Inc",
            "Morning",
            5.0,
            0.1,
            10.0,
            20,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
    }

    #[test]
    fn test_missing_input_checked_before_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = predict_with_input(&dir.path().join("absent.json"), PredictionInput::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn test_unseen_airport_still_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = trained_model(dir.path());
        let p = predict_delay_proba(&path, "XYZ", "Unknown Air", "Night", 5.0, 7.0, 10.0, 3)
            .unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_inference_row_covers_stored_schema() {
        let dir = tempfile::tempdir().unwrap();
        let stored = ModelArtifact::load(&trained_model(dir.path())).unwrap().schema();

        let features = PredictionInput {
            airport_id: Some("JFK".into()),
            airline_id: Some("DL".into()),
            dep_time_label: Some("Morning".into()),
            tavg: Some(1.0),
            prcp: Some(0.0),
            wspd: Some(3.0),
            num_departures_same_slot_airport: Some(4),
            ..Default::default()
        }
        .into_feature_vector()
        .unwrap();

        // every trained name is supplied at inference, and nothing beyond them
        assert_eq!(
            stored.categorical_values(&features).unwrap().len(),
            stored.categorical.len()
        );
        assert_eq!(stored.numeric_values(&features).unwrap().len(), stored.numeric.len());
        assert_eq!(stored, FeatureSchema::canonical());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_probability_in_unit_interval(
            airport in "[A-Z]{3}",
            airline in "[A-Za-z][A-Za-z ]{0,19}",
            label in prop_oneof![Just("Morning"), Just("Evening"), Just("Night")],
            tavg in -60.0f64..60.0,
            prcp in 0.0f64..500.0,
            wspd in 0.0f64..200.0,
            slot in 0u32..10_000,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = trained_model(dir.path());
            let p = predict_delay_proba(&path, &airport, &airline, label, tavg, prcp, wspd, slot)
                .unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
