use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use super::Warehouse;
use super::types::{DailyDelayPoint, FlightFactRow, TrainingRecord, normalize_airport};

/// Warehouse backed by a joined fact-table CSV extract.
///
/// Expected header:
/// `flight_date,dep_airport_id,arr_airport_id,airline_id,dep_time_label,dep_delay_min,is_delayed_15,tavg,prcp,wspd`
/// with empty cells standing for SQL nulls.
pub struct CsvWarehouse {
    path: PathBuf,
}

impl CsvWarehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self, limit: Option<usize>) -> Result<Vec<FlightFactRow>> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("failed to open warehouse extract {}", self.path.display()))?;

        let mut rows = Vec::new();
        for (line, result) in rdr.deserialize().enumerate() {
            if limit.is_some_and(|l| rows.len() >= l) {
                break;
            }
            let record: FlightFactRow = result
                .with_context(|| format!("malformed row {} in {}", line + 1, self.path.display()))?;
            rows.push(record);
        }

        debug!(path = %self.path.display(), rows = rows.len(), "Warehouse extract read");
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl Warehouse for CsvWarehouse {
    async fn daily_delays(
        &self,
        airport_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyDelayPoint>> {
        let airport = normalize_airport(airport_id);
        let rows = self.read_rows(None)?;
        Ok(aggregate_daily(&airport, from, to, &rows))
    }

    async fn training_extract(&self, limit: Option<usize>) -> Result<Vec<TrainingRecord>> {
        self.read_rows(limit)?
            .into_iter()
            .map(FlightFactRow::into_training_record)
            .collect()
    }
}

/// Groups fact rows into one [`DailyDelayPoint`] per day, averaging only
/// non-null delays.
pub(crate) fn aggregate_daily(
    airport: &str,
    from: NaiveDate,
    to: NaiveDate,
    rows: &[FlightFactRow],
) -> Vec<DailyDelayPoint> {
    let mut per_day: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

    for row in rows {
        if row.flight_date < from || row.flight_date > to {
            continue;
        }
        let Some(dep) = row.dep_airport_id.as_deref() else {
            continue;
        };
        if normalize_airport(dep) != airport {
            continue;
        }
        let Some(delay) = row.dep_delay_min else {
            continue;
        };

        let entry = per_day.entry(row.flight_date).or_insert((0.0, 0));
        entry.0 += delay;
        entry.1 += 1;
    }

    per_day
        .into_iter()
        .map(|(date, (sum, count))| DailyDelayPoint::new(date, Some(sum / count as f64), count))
        .collect()
}
