//! The feature vector shared by training and inference, and its training-side
//! assembly from warehouse records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::congestion::{DepartureSlot, attach_congestion};
use crate::error::{Error, Result};
use crate::warehouse::TrainingRecord;

/// Categorical feature names, in canonical order.
pub const CATEGORICAL_FEATURES: [&str; 7] = [
    "dep_airport_id",
    "arr_airport_id",
    "airline_id",
    "dep_time_label",
    "month",
    "day_of_week",
    "is_weekend",
];

/// Numeric feature names, in canonical order.
pub const NUMERIC_FEATURES: [&str; 4] = ["tavg", "prcp", "wspd", "num_departures_same_slot_airport"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub dep_airport_id: String,
    pub arr_airport_id: String,
    pub airline_id: String,
    pub dep_time_label: String,
    pub month: u32,
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub tavg: f64,
    pub prcp: f64,
    pub wspd: f64,
    pub num_departures_same_slot_airport: u32,
}

impl FeatureVector {
    /// Categorical value by feature name, rendered as the category label the
    /// encoder sees. `None` for names this vector does not define.
    pub fn categorical(&self, name: &str) -> Option<String> {
        let value = match name {
            "dep_airport_id" => self.dep_airport_id.clone(),
            "arr_airport_id" => self.arr_airport_id.clone(),
            "airline_id" => self.airline_id.clone(),
            "dep_time_label" => self.dep_time_label.clone(),
            "month" => self.month.to_string(),
            "day_of_week" => self.day_of_week.to_string(),
            "is_weekend" => self.is_weekend.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Numeric value by feature name. `None` for unknown names.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        match name {
            "tavg" => Some(self.tavg),
            "prcp" => Some(self.prcp),
            "wspd" => Some(self.wspd),
            "num_departures_same_slot_airport" => {
                Some(f64::from(self.num_departures_same_slot_airport))
            }
            _ => None,
        }
    }
}

/// Ordered categorical and numeric feature names a pipeline is fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl FeatureSchema {
    pub fn canonical() -> Self {
        Self {
            categorical: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            numeric: NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Every name, categorical first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .map(String::as_str)
    }

    /// Reads the categorical values of `row` in schema order.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaDrift`] if a name cannot be supplied by [`FeatureVector`].
    pub fn categorical_values(&self, row: &FeatureVector) -> Result<Vec<String>> {
        self.categorical
            .iter()
            .map(|name| {
                row.categorical(name).ok_or_else(|| {
                    Error::SchemaDrift(format!("no categorical feature named '{}'", name))
                })
            })
            .collect()
    }

    /// Reads the numeric values of `row` in schema order.
    pub fn numeric_values(&self, row: &FeatureVector) -> Result<Vec<f64>> {
        self.numeric
            .iter()
            .map(|name| {
                row.numeric(name).ok_or_else(|| {
                    Error::SchemaDrift(format!("no numeric feature named '{}'", name))
                })
            })
            .collect()
    }
}

/// A feature vector with its delay label (delayed by 15 minutes or more).
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    pub delayed: bool,
}

/// A training record with every required field present.
struct CompleteRecord {
    flight_date: NaiveDate,
    dep_airport_id: String,
    arr_airport_id: String,
    airline_id: String,
    dep_time_label: String,
    month: u32,
    day_of_week: u32,
    is_weekend: bool,
    tavg: f64,
    prcp: f64,
    wspd: f64,
    delayed: bool,
}

impl CompleteRecord {
    fn from_record(r: TrainingRecord) -> Option<Self> {
        Some(Self {
            flight_date: r.flight_date,
            dep_airport_id: r.dep_airport_id.filter(|s| !s.is_empty())?,
            arr_airport_id: r.arr_airport_id.filter(|s| !s.is_empty())?,
            airline_id: r.airline_id.filter(|s| !s.is_empty())?,
            dep_time_label: r.dep_time_label.filter(|s| !s.is_empty())?,
            month: r.month?,
            day_of_week: r.day_of_week?,
            is_weekend: r.is_weekend?,
            tavg: r.tavg.filter(|v| v.is_finite())?,
            prcp: r.prcp.filter(|v| v.is_finite())?,
            wspd: r.wspd.filter(|v| v.is_finite())?,
            delayed: r.is_delayed_15?,
        })
    }

    fn into_example(self, num_departures_same_slot_airport: u32) -> LabeledExample {
        LabeledExample {
            features: FeatureVector {
                dep_airport_id: self.dep_airport_id,
                arr_airport_id: self.arr_airport_id,
                airline_id: self.airline_id,
                dep_time_label: self.dep_time_label,
                month: self.month,
                day_of_week: self.day_of_week,
                is_weekend: self.is_weekend,
                tavg: self.tavg,
                prcp: self.prcp,
                wspd: self.wspd,
                num_departures_same_slot_airport,
            },
            delayed: self.delayed,
        }
    }
}

impl DepartureSlot for CompleteRecord {
    fn slot_date(&self) -> NaiveDate {
        self.flight_date
    }
    fn slot_airport(&self) -> &str {
        &self.dep_airport_id
    }
    fn slot_label(&self) -> &str {
        &self.dep_time_label
    }
}

/// Builds labelled feature vectors from the warehouse extract.
///
/// Rows missing any required field (or the label) are dropped first; the
/// congestion count is then computed over the surviving rows.
pub fn assemble_training(records: Vec<TrainingRecord>) -> Vec<LabeledExample> {
    let total = records.len();
    let complete: Vec<CompleteRecord> = records
        .into_iter()
        .filter_map(CompleteRecord::from_record)
        .collect();

    let dropped = total - complete.len();
    if dropped > 0 {
        warn!(dropped, total, "Dropped training rows with missing required fields");
    }

    let examples: Vec<LabeledExample> = attach_congestion(complete)
        .into_iter()
        .map(|(record, count)| record.into_example(count))
        .collect();

    debug!(rows = examples.len(), "Training features assembled");
    examples
}
