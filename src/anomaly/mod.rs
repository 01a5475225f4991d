//! Rolling z-score anomaly detection over per-airport daily delay series.
//!
//! [`rolling`] computes trailing statistics, [`classify`] applies the
//! threshold and minimum-volume rules, and [`detect`] wires both to the
//! warehouse boundary.

pub mod classify;
pub mod detect;
pub mod rolling;

pub use classify::{AnomalyResult, AnomalyRow, DateRange};
pub use detect::{AnomalyParams, detect_anomalies, detect_anomalies_list, load_daily_delays};
pub use rolling::{RollingStats, RollingWindow, compute_rolling_stats};
