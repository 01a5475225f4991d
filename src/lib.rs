pub mod anomaly;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod output;
pub mod stats;
pub mod warehouse;

pub use error::{Error, Result};
