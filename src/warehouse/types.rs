//! Row shapes crossing the warehouse boundary.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Departure delay (minutes) at or above which a flight counts as delayed.
pub const DELAY_THRESHOLD_MIN: f64 = 15.0;

/// One airport's mean departure delay for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDelayPoint {
    pub date: NaiveDate,
    /// `None` when no flight of the day carried a delay value.
    pub avg_dep_delay: Option<f64>,
    pub num_flights: u32,
}

impl DailyDelayPoint {
    pub fn new(date: NaiveDate, avg_dep_delay: Option<f64>, num_flights: u32) -> Self {
        Self {
            date,
            avg_dep_delay,
            num_flights,
        }
    }

    /// The delay as an observation, treating NaN as absent.
    pub fn observed_delay(&self) -> Option<f64> {
        self.avg_dep_delay.filter(|v| !v.is_nan())
    }
}

/// A single row of the joined fact-table CSV extract.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightFactRow {
    pub flight_date: NaiveDate,
    pub dep_airport_id: Option<String>,
    pub arr_airport_id: Option<String>,
    pub airline_id: Option<String>,
    pub dep_time_label: Option<String>,
    pub dep_delay_min: Option<f64>,
    pub is_delayed_15: Option<String>,
    pub tavg: Option<f64>,
    pub prcp: Option<f64>,
    pub wspd: Option<f64>,
}

/// Source columns of the feature extract plus the delay label, one per flight.
///
/// Fields are optional because the extract is a left join; rows missing any
/// required field are dropped during feature assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub flight_date: NaiveDate,
    pub dep_airport_id: Option<String>,
    pub arr_airport_id: Option<String>,
    pub airline_id: Option<String>,
    pub dep_time_label: Option<String>,
    pub month: Option<u32>,
    pub day_of_week: Option<u32>,
    pub is_weekend: Option<bool>,
    pub tavg: Option<f64>,
    pub prcp: Option<f64>,
    pub wspd: Option<f64>,
    pub is_delayed_15: Option<bool>,
}

/// Calendar attributes as the date dimension stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAttrs {
    pub month: u32,
    /// Monday = 1 .. Sunday = 7
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl CalendarAttrs {
    pub fn from_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().number_from_monday();
        Self {
            month: date.month(),
            day_of_week,
            is_weekend: day_of_week >= 6,
        }
    }
}

impl FlightFactRow {
    /// Projects the fact row onto the feature extract, deriving calendar
    /// attributes from the flight date.
    ///
    /// When the explicit label is absent it is derived from the departure delay.
    pub fn into_training_record(self) -> anyhow::Result<TrainingRecord> {
        let calendar = CalendarAttrs::from_date(self.flight_date);
        let label = match self.is_delayed_15.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_flag(raw)?),
            _ => self.dep_delay_min.map(|d| d >= DELAY_THRESHOLD_MIN),
        };

        Ok(TrainingRecord {
            flight_date: self.flight_date,
            dep_airport_id: self.dep_airport_id.map(|a| normalize_airport(&a)),
            arr_airport_id: self.arr_airport_id.map(|a| normalize_airport(&a)),
            airline_id: self.airline_id.map(|a| a.trim().to_string()),
            dep_time_label: self.dep_time_label.map(|l| l.trim().to_string()),
            month: Some(calendar.month),
            day_of_week: Some(calendar.day_of_week),
            is_weekend: Some(calendar.is_weekend),
            tavg: self.tavg,
            prcp: self.prcp,
            wspd: self.wspd,
            is_delayed_15: label,
        })
    }
}

/// Airport ids are IATA codes compared trimmed and upper-cased.
pub fn normalize_airport(id: &str) -> String {
    id.trim().to_uppercase()
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Ok(true),
        "false" | "f" | "0" | "no" => Ok(false),
        other => Err(anyhow::anyhow!("unrecognised boolean value '{}'", other)),
    }
}
