//! Warehouse query boundary.
//!
//! [`Warehouse`] is the session object handed to every data-access call.
//! [`CsvWarehouse`] reads a joined fact-table extract from disk and
//! [`MemoryWarehouse`] serves in-memory rows for tests and embedding.

mod csv_store;
mod memory;
pub mod types;

pub use csv_store::CsvWarehouse;
pub use memory::MemoryWarehouse;
pub use types::{CalendarAttrs, DailyDelayPoint, FlightFactRow, TrainingRecord, normalize_airport};

use anyhow::Result;
use chrono::NaiveDate;

#[async_trait::async_trait]
pub trait Warehouse: Send + Sync {
    /// Daily mean departure delay and flight count for one airport over
    /// `[from, to]`. Days without any delay observation are absent.
    async fn daily_delays(
        &self,
        airport_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyDelayPoint>>;

    /// Feature source columns joined with the delay label across the fact
    /// table, optionally truncated to `limit` rows.
    async fn training_extract(&self, limit: Option<usize>) -> Result<Vec<TrainingRecord>>;
}
