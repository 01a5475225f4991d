//! The persisted model artifact and its atomic replace-on-write storage.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::metrics::ValidationMetrics;
use super::pipeline::DelayPipeline;
use crate::error::{Error, Result};
use crate::features::{FeatureSchema, FeatureVector};

pub const SCHEMA_VERSION: u8 = 1;

/// Fitted pipeline plus the exact ordered feature names it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u8,
    pub trained_at: DateTime<Utc>,
    pub categorical_features: Vec<String>,
    pub numeric_features: Vec<String>,
    pub metrics: ValidationMetrics,
    pipeline: DelayPipeline,
}

impl ModelArtifact {
    pub fn new(pipeline: DelayPipeline, metrics: ValidationMetrics) -> Self {
        let schema = pipeline.schema().clone();
        Self {
            schema_version: SCHEMA_VERSION,
            trained_at: Utc::now(),
            categorical_features: schema.categorical,
            numeric_features: schema.numeric,
            metrics,
            pipeline,
        }
    }

    /// Feature names as stored in the artifact.
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema {
            categorical: self.categorical_features.clone(),
            numeric: self.numeric_features.clone(),
        }
    }

    /// Class-1 probability for one row, encoded with the stored feature names.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaDrift`] if the stored names disagree with the fitted
    /// pipeline or name a feature [`FeatureVector`] cannot supply.
    pub fn predict_proba(&self, row: &FeatureVector) -> Result<f64> {
        let stored = self.schema();
        if &stored != self.pipeline.schema() {
            return Err(Error::SchemaDrift(
                "stored feature names differ from the fitted pipeline".into(),
            ));
        }
        // resolve every stored name before encoding so nothing is dropped silently
        stored.categorical_values(row)?;
        stored.numeric_values(row)?;

        self.pipeline.predict_proba(row)
    }

    /// Writes the artifact to a uniquely named temporary file beside `path`
    /// and renames it into place, so readers see either the old or the new
    /// artifact even when several saves race.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir
            }
            None => Path::new("."),
        };

        // dropped (and removed) on any error before persist
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!(path = %path.display(), "Model artifact saved");
        Ok(())
    }

    /// Loads the artifact at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ModelNotFound`] when nothing has been trained yet.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ModelNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        if artifact.schema_version != SCHEMA_VERSION {
            return Err(Error::SchemaDrift(format!(
                "artifact schema version {} is not supported (expected {})",
                artifact.schema_version, SCHEMA_VERSION
            )));
        }

        debug!(path = %path.display(), trained_at = %artifact.trained_at, "Model artifact loaded");
        Ok(artifact)
    }
}
