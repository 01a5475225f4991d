//! Error taxonomy shared by the anomaly and delay-model entry points.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed windowing parameters, unsorted series, bad ranges.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Empty or single-class training set.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("model not found at {}: train the model first", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("missing input: {}", fields.join(", "))]
    MissingInput { fields: Vec<String> },

    /// The stored artifact and the current feature code disagree on the schema.
    #[error("feature schema drift: {0}")]
    SchemaDrift(String),

    #[error(transparent)]
    Warehouse(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("model artifact could not be (de)serialized: {0}")]
    Artifact(#[from] serde_json::Error),

    #[error("training worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }
}
