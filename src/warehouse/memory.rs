use anyhow::Result;
use chrono::NaiveDate;

use super::Warehouse;
use super::csv_store::aggregate_daily;
use super::types::{DailyDelayPoint, FlightFactRow, TrainingRecord, normalize_airport};

/// Warehouse over fact rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    rows: Vec<FlightFactRow>,
}

impl MemoryWarehouse {
    pub fn new(rows: Vec<FlightFactRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: FlightFactRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl Warehouse for MemoryWarehouse {
    async fn daily_delays(
        &self,
        airport_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyDelayPoint>> {
        Ok(aggregate_daily(
            &normalize_airport(airport_id),
            from,
            to,
            &self.rows,
        ))
    }

    async fn training_extract(&self, limit: Option<usize>) -> Result<Vec<TrainingRecord>> {
        let take = limit.unwrap_or(self.rows.len());
        self.rows
            .iter()
            .take(take)
            .cloned()
            .map(FlightFactRow::into_training_record)
            .collect()
    }
}
