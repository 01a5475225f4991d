//! Same-slot departure counts used as a congestion proxy.

use std::collections::HashMap;

use chrono::NaiveDate;

/// Identifies the departure slot a flight belongs to: same day, same
/// departure airport, same departure-time label.
pub trait DepartureSlot {
    fn slot_date(&self) -> NaiveDate;
    fn slot_airport(&self) -> &str;
    fn slot_label(&self) -> &str;
}

/// Returns, index-aligned with `flights`, the number of flights sharing each
/// flight's slot (itself included).
pub fn same_slot_counts<T: DepartureSlot>(flights: &[T]) -> Vec<u32> {
    let mut sizes: HashMap<(NaiveDate, &str, &str), u32> = HashMap::new();
    for f in flights {
        *sizes
            .entry((f.slot_date(), f.slot_airport(), f.slot_label()))
            .or_default() += 1;
    }

    flights
        .iter()
        .map(|f| sizes[&(f.slot_date(), f.slot_airport(), f.slot_label())])
        .collect()
}

/// Pairs every flight with its same-slot departure count.
pub fn attach_congestion<T: DepartureSlot>(flights: Vec<T>) -> Vec<(T, u32)> {
    let counts = same_slot_counts(&flights);
    flights.into_iter().zip(counts).collect()
}
