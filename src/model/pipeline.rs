//! Preprocessing and classifier fitted and applied as one unit.

use serde::{Deserialize, Serialize};

use super::encoding::Preprocessor;
use super::logistic::{LogisticConfig, LogisticRegression};
use crate::error::{Error, Result};
use crate::features::{FeatureSchema, FeatureVector};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayPipeline {
    preprocessor: Preprocessor,
    classifier: LogisticRegression,
}

impl DelayPipeline {
    /// Fits the preprocessing stage on `rows`, then the classifier on the
    /// encoded rows. Nothing is returned unless both stages succeed.
    pub fn fit(
        rows: &[FeatureVector],
        labels: &[bool],
        schema: FeatureSchema,
        config: &LogisticConfig,
    ) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(Error::invalid(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let preprocessor = Preprocessor::fit(rows, schema)?;
        let encoded = rows
            .iter()
            .map(|r| preprocessor.transform(r))
            .collect::<Result<Vec<_>>>()?;
        let classifier = LogisticRegression::fit(&encoded, labels, preprocessor.width(), config)?;

        Ok(Self {
            preprocessor,
            classifier,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.preprocessor.schema()
    }

    /// Probability that the flight departs 15 or more minutes late.
    pub fn predict_proba(&self, row: &FeatureVector) -> Result<f64> {
        let encoded = self.preprocessor.transform(row)?;
        Ok(self.classifier.predict_proba(&encoded))
    }

    pub fn predict_proba_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict_proba(r)).collect()
    }
}
