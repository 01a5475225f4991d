//! Feature construction shared by model training and inference.

pub mod congestion;
pub mod inference;
pub mod vector;

pub use congestion::{DepartureSlot, attach_congestion, same_slot_counts};
pub use inference::{DEFAULT_CALENDAR, PredictionInput};
pub use vector::{
    CATEGORICAL_FEATURES, FeatureSchema, FeatureVector, LabeledExample, NUMERIC_FEATURES,
    assemble_training,
};
