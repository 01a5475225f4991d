//! Trailing-window statistics over a daily delay series.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::stats::moments;
use crate::warehouse::DailyDelayPoint;

/// Window length and minimum observation count for trailing statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    window: usize,
    min_periods: usize,
}

impl RollingWindow {
    pub fn new(window: usize, min_periods: usize) -> Result<Self> {
        if window == 0 {
            return Err(Error::invalid("window must be at least 1"));
        }
        if min_periods > window {
            return Err(Error::invalid(format!(
                "min_periods ({}) must not exceed window ({})",
                min_periods, window
            )));
        }
        Ok(Self {
            window,
            min_periods,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }
}

/// A [`DailyDelayPoint`] enriched with its trailing mean, trailing population
/// standard deviation and z-score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingStats {
    pub date: NaiveDate,
    pub avg_dep_delay: Option<f64>,
    pub num_flights: u32,
    pub rolling_mean: Option<f64>,
    pub rolling_std: Option<f64>,
    /// 0.0 whenever the trailing statistics are undefined or flat.
    pub z_score: f64,
}

/// Computes [`RollingStats`] for every point of an ascending series.
///
/// The window at index `i` covers the `window` observations ending at `i`
/// (fewer at the start of the series). Only non-null delays count towards
/// `min_periods` and enter the mean and standard deviation.
///
/// # Errors
///
/// [`Error::InvalidInput`] if dates are not strictly ascending or the window
/// parameters are inconsistent.
pub fn compute_rolling_stats(
    points: &[DailyDelayPoint],
    window: usize,
    min_periods: usize,
) -> Result<Vec<RollingStats>> {
    let win = RollingWindow::new(window, min_periods)?;
    ensure_ascending(points)?;
    Ok(rolling_over(points, win))
}

fn ensure_ascending(points: &[DailyDelayPoint]) -> Result<()> {
    if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
        return Err(Error::invalid(format!(
            "series must be sorted ascending by date with one point per day ({} is followed by {})",
            pair[0].date, pair[1].date
        )));
    }
    Ok(())
}

fn rolling_over(points: &[DailyDelayPoint], win: RollingWindow) -> Vec<RollingStats> {
    // a window with no observation never has statistics
    let required = win.min_periods.max(1);
    let mut observed = Vec::with_capacity(win.window.min(points.len()));

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = (i + 1).saturating_sub(win.window);
            observed.clear();
            observed.extend(points[start..=i].iter().filter_map(DailyDelayPoint::observed_delay));

            let (rolling_mean, rolling_std) = if observed.len() < required {
                (None, None)
            } else {
                let (m, s) = moments(&observed);
                (Some(m), Some(s))
            };

            RollingStats {
                date: point.date,
                avg_dep_delay: point.avg_dep_delay,
                num_flights: point.num_flights,
                rolling_mean,
                rolling_std,
                z_score: z_score(point.observed_delay(), rolling_mean, rolling_std),
            }
        })
        .collect()
}

fn z_score(value: Option<f64>, mean: Option<f64>, std: Option<f64>) -> f64 {
    match (value, mean, std) {
        (Some(v), Some(m), Some(s)) if s != 0.0 => (v - m) / s,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn series(values: &[Option<f64>]) -> Vec<DailyDelayPoint> {
        let start: NaiveDate = "2023-01-01".parse().unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyDelayPoint::new(start + Duration::days(i as i64), *v, 25))
            .collect()
    }

    #[test]
    fn test_spike_stands_out_and_flat_day_does_not() {
        let mut values = vec![Some(10.0); 60];
        values[40] = Some(60.0);

        let stats = compute_rolling_stats(&series(&values), 30, 10).unwrap();

        assert_eq!(stats.len(), 60);
        assert!(stats[40].z_score.abs() > 3.0, "spike z = {}", stats[40].z_score);
        assert!(stats[20].z_score.abs() < 1.5, "flat z = {}", stats[20].z_score);
    }

    #[test]
    fn test_stats_undefined_before_min_periods() {
        let stats = compute_rolling_stats(&series(&[Some(1.0); 12]), 30, 10).unwrap();

        for s in &stats[..9] {
            assert_eq!(s.rolling_mean, None);
            assert_eq!(s.rolling_std, None);
            assert_eq!(s.z_score, 0.0);
        }
        assert_eq!(stats[9].rolling_mean, Some(1.0));
        assert_eq!(stats[9].rolling_std, Some(0.0));
    }

    #[test]
    fn test_nulls_do_not_count_towards_min_periods() {
        let mut values = vec![Some(5.0), None, Some(7.0), None];
        values.push(Some(9.0));
        let stats = compute_rolling_stats(&series(&values), 5, 3).unwrap();

        assert_eq!(stats[3].rolling_mean, None);
        assert_eq!(stats[4].rolling_mean, Some(7.0));
        // null day keeps a zero z-score
        assert_eq!(stats[3].z_score, 0.0);
    }

    #[test]
    fn test_window_is_trailing_only() {
        let stats = compute_rolling_stats(&series(&[Some(1.0), Some(3.0), Some(100.0)]), 2, 1)
            .unwrap();
        assert_eq!(stats[1].rolling_mean, Some(2.0));
        assert_eq!(stats[1].rolling_std, Some(1.0));
        assert_eq!(stats[2].rolling_mean, Some(51.5));
    }

    #[test]
    fn test_population_std_zscore() {
        let stats = compute_rolling_stats(&series(&[Some(2.0), Some(4.0)]), 2, 2).unwrap();
        // mean 3, population std 1
        assert_eq!(stats[1].z_score, 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let s = series(&[Some(1.0)]);
        assert!(matches!(
            compute_rolling_stats(&s, 0, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            compute_rolling_stats(&s, 5, 6),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unsorted_series_rejected() {
        let mut s = series(&[Some(1.0), Some(2.0), Some(3.0)]);
        s.swap(0, 2);
        assert!(matches!(
            compute_rolling_stats(&s, 3, 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let mut s = series(&[Some(1.0), Some(2.0)]);
        s[1].date = s[0].date;
        assert!(compute_rolling_stats(&s, 3, 1).is_err());
    }

    #[test]
    fn test_window_longer_than_series() {
        let stats = compute_rolling_stats(&series(&[Some(2.0), Some(4.0)]), usize::MAX, 1).unwrap();
        assert_eq!(stats[1].rolling_mean, Some(3.0));
        assert_eq!(stats[1].z_score, 1.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(compute_rolling_stats(&[], 30, 10).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_constant_series_has_zero_zscores(
            value in -500.0f64..500.0,
            window in 1usize..40,
            extra in 1usize..40,
        ) {
            let min_periods = window.min(10);
            let stats = compute_rolling_stats(
                &series(&vec![Some(value); window + extra]),
                window,
                min_periods,
            ).unwrap();

            for s in &stats {
                prop_assert_eq!(s.z_score, 0.0);
                if let Some(std) = s.rolling_std {
                    prop_assert_eq!(std, 0.0);
                }
            }
        }

        #[test]
        fn prop_sparse_windows_have_null_stats(
            values in proptest::collection::vec(proptest::option::of(0.0f64..120.0), 1..80),
            window in 1usize..30,
            min_periods_seed in 0usize..30,
        ) {
            let min_periods = min_periods_seed.min(window);
            let points = series(&values);
            let stats = compute_rolling_stats(&points, window, min_periods).unwrap();

            for (i, s) in stats.iter().enumerate() {
                let start = (i + 1).saturating_sub(window);
                let non_null = values[start..=i].iter().filter(|v| v.is_some()).count();
                if non_null < min_periods.max(1) {
                    prop_assert!(s.rolling_mean.is_none());
                    prop_assert!(s.rolling_std.is_none());
                } else {
                    prop_assert!(s.rolling_mean.is_some());
                }
                prop_assert!(s.z_score.is_finite());
            }
        }
    }
}
