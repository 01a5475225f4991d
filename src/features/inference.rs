//! Inference-side feature assembly from caller-supplied parameters.

use chrono::NaiveDate;

use super::vector::FeatureVector;
use crate::error::{Error, Result};
use crate::warehouse::{CalendarAttrs, normalize_airport};

/// Calendar used when no target date is supplied. This is an approximation:
/// the model was trained on real calendar attributes.
pub const DEFAULT_CALENDAR: CalendarAttrs = CalendarAttrs {
    month: 1,
    day_of_week: 1,
    is_weekend: false,
};

/// Parameters of a single prediction as received from a caller.
///
/// The first seven fields are required; they are optional here so that every
/// missing one can be reported at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInput {
    pub airport_id: Option<String>,
    pub airline_id: Option<String>,
    pub dep_time_label: Option<String>,
    pub tavg: Option<f64>,
    pub prcp: Option<f64>,
    pub wspd: Option<f64>,
    pub num_departures_same_slot_airport: Option<u32>,
    /// Defaults to the departure airport.
    pub arr_airport_id: Option<String>,
    /// When present, month / day-of-week / weekend are derived from it
    /// instead of [`DEFAULT_CALENDAR`].
    pub target_date: Option<NaiveDate>,
}

impl PredictionInput {
    /// Builds the full feature vector.
    ///
    /// # Errors
    ///
    /// [`Error::MissingInput`] naming every absent or blank required field,
    /// [`Error::InvalidInput`] for non-finite numbers.
    pub fn into_feature_vector(self) -> Result<FeatureVector> {
        let mut missing = Vec::new();

        let airport = non_blank(self.airport_id);
        let airline = non_blank(self.airline_id);
        let label = non_blank(self.dep_time_label);

        if airport.is_none() {
            missing.push("airport_id");
        }
        if airline.is_none() {
            missing.push("airline_id");
        }
        if label.is_none() {
            missing.push("dep_time_label");
        }
        if self.tavg.is_none() {
            missing.push("tavg");
        }
        if self.prcp.is_none() {
            missing.push("prcp");
        }
        if self.wspd.is_none() {
            missing.push("wspd");
        }
        if self.num_departures_same_slot_airport.is_none() {
            missing.push("num_departures_same_slot_airport");
        }

        let (
            Some(airport),
            Some(airline),
            Some(label),
            Some(tavg),
            Some(prcp),
            Some(wspd),
            Some(num_departures),
        ) = (
            airport,
            airline,
            label,
            self.tavg,
            self.prcp,
            self.wspd,
            self.num_departures_same_slot_airport,
        )
        else {
            return Err(Error::MissingInput {
                fields: missing.into_iter().map(String::from).collect(),
            });
        };

        for (name, value) in [("tavg", tavg), ("prcp", prcp), ("wspd", wspd)] {
            if !value.is_finite() {
                return Err(Error::invalid(format!("{} must be a finite number", name)));
            }
        }

        let dep_airport = normalize_airport(&airport);
        let arr_airport = non_blank(self.arr_airport_id)
            .map(|a| normalize_airport(&a))
            .unwrap_or_else(|| dep_airport.clone());
        let calendar = self
            .target_date
            .map(CalendarAttrs::from_date)
            .unwrap_or(DEFAULT_CALENDAR);

        Ok(FeatureVector {
            dep_airport_id: dep_airport,
            arr_airport_id: arr_airport,
            airline_id: airline,
            dep_time_label: label,
            month: calendar.month,
            day_of_week: calendar.day_of_week,
            is_weekend: calendar.is_weekend,
            tavg,
            prcp,
            wspd,
            num_departures_same_slot_airport: num_departures,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
