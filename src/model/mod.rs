//! Delay-probability model: preprocessing, logistic regression, evaluation,
//! artifact storage and the train / predict entry points.

pub mod artifact;
pub mod encoding;
pub mod logistic;
pub mod metrics;
pub mod pipeline;
pub mod predict;
pub mod split;
pub mod train;

pub use artifact::ModelArtifact;
pub use metrics::{ClassReport, ThresholdMetrics, ValidationMetrics};
pub use predict::{predict_delay_proba, predict_with_input};
pub use train::{TrainOptions, TrainingReport, fit_artifact, train_model};
