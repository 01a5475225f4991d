//! Entry points: load a per-airport series with lookback, window it and judge it.

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use super::classify::{AnomalyResult, AnomalyRow, DateRange, anomalies_only, classify};
use super::rolling::{RollingWindow, compute_rolling_stats};
use crate::error::{Error, Result};
use crate::warehouse::{DailyDelayPoint, Warehouse, normalize_airport};

/// Tunables of a detection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyParams {
    /// `|z| > threshold` flags a day.
    pub threshold: f64,
    /// Trailing window in days; also the lookback fetched before `start`.
    pub window: usize,
    pub min_periods: usize,
    pub min_flights_per_day: u32,
}

impl Default for AnomalyParams {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            window: 30,
            min_periods: 10,
            min_flights_per_day: 20,
        }
    }
}

impl AnomalyParams {
    fn validate(&self) -> Result<RollingWindow> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::invalid(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        RollingWindow::new(self.window, self.min_periods)
    }
}

/// Fetches the daily series for `airport_id` over `[start - lookback_days, end]`,
/// sorted ascending by date. A lookback reaching past the calendar starts
/// at [`NaiveDate::MIN`].
pub async fn load_daily_delays<W: Warehouse + ?Sized>(
    warehouse: &W,
    airport_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    lookback_days: usize,
) -> Result<Vec<DailyDelayPoint>> {
    let hist_start = i64::try_from(lookback_days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|lookback| start.checked_sub_signed(lookback))
        .unwrap_or(NaiveDate::MIN);
    let mut points = warehouse.daily_delays(airport_id, hist_start, end).await?;
    points.sort_by_key(|p| p.date);

    debug!(
        airport_id,
        from = %hist_start,
        to = %end,
        days = points.len(),
        "Daily delay series loaded"
    );
    Ok(points)
}

/// Judges every day of `[start_date, end_date]` for one airport.
///
/// Returns rows ascending by date, restricted to the requested range and to
/// days with at least `min_flights_per_day` flights. An airport without data
/// yields an empty report.
#[tracing::instrument(skip(warehouse, params), fields(threshold = params.threshold, window = params.window))]
pub async fn detect_anomalies<W: Warehouse + ?Sized>(
    warehouse: &W,
    airport_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    params: &AnomalyParams,
) -> Result<Vec<AnomalyRow>> {
    let window = params.validate()?;
    let range = DateRange::new(start_date, end_date)?;
    let airport = normalize_airport(airport_id);

    let points = load_daily_delays(warehouse, &airport, start_date, end_date, window.window()).await?;
    if points.is_empty() {
        info!(airport = %airport, "No daily delay data in range");
        return Ok(Vec::new());
    }

    let stats = compute_rolling_stats(&points, window.window(), window.min_periods())?;
    let rows = classify(&stats, range, params.threshold, params.min_flights_per_day);

    info!(
        airport = %airport,
        days = rows.len(),
        anomalies = rows.iter().filter(|r| r.is_anomaly).count(),
        "Anomaly detection finished"
    );
    Ok(rows)
}

/// Like [`detect_anomalies`] but returns only the anomalous days.
pub async fn detect_anomalies_list<W: Warehouse + ?Sized>(
    warehouse: &W,
    airport_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    params: &AnomalyParams,
) -> Result<Vec<AnomalyResult>> {
    let rows = detect_anomalies(warehouse, airport_id, start_date, end_date, params).await?;
    Ok(anomalies_only(&rows))
}
