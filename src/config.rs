//! Runtime configuration read from the environment (and `.env`, loaded by the CLI).

use std::path::PathBuf;

pub const DEFAULT_WAREHOUSE_PATH: &str = "data/fact_flights.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/logreg_delay.json";
pub const DEFAULT_LOG_FILE_PATH: &str = "logs/delay_insights.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Joined fact-table extract consumed by [`crate::warehouse::CsvWarehouse`].
    pub warehouse_path: PathBuf,
    /// Single well-known location of the trained model artifact.
    pub model_path: PathBuf,
    pub log_file_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            warehouse_path: PathBuf::from(DEFAULT_WAREHOUSE_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
        }
    }
}

impl Settings {
    /// Reads `WAREHOUSE_PATH`, `MODEL_PATH` and `LOG_FILE_PATH`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path_or = |key: &str, fallback: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };

        Self {
            warehouse_path: path_or("WAREHOUSE_PATH", defaults.warehouse_path),
            model_path: path_or("MODEL_PATH", defaults.model_path),
            log_file_path: path_or("LOG_FILE_PATH", defaults.log_file_path),
        }
    }

    /// Applies CLI overrides on top of the environment values.
    pub fn with_overrides(mut self, warehouse: Option<PathBuf>, model: Option<PathBuf>) -> Self {
        if let Some(path) = warehouse {
            self.warehouse_path = path;
        }
        if let Some(path) = model {
            self.model_path = path;
        }
        self
    }
}
