use shared_types::{ExpenseRecord, TransportationExpense};
use tracing::warn;

/// True when an already accepted ride describes the same trip as `candidate`
pub fn is_duplicate(candidate: &TransportationExpense, accumulated: &[TransportationExpense]) -> bool {
    accumulated.iter().any(|accepted| accepted.same_trip(candidate))
}

/// Keeps the first of every group of identical rides, in batch order.
/// Non-ride records pass through untouched.
pub fn drop_duplicate_rides(records: Vec<ExpenseRecord>) -> Vec<ExpenseRecord> {
    let mut accepted_rides: Vec<TransportationExpense> = Vec::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if let ExpenseRecord::Transportation(ride) = &record {
            if is_duplicate(ride, &accepted_rides) {
                warn!(
                    "Dropping duplicate {:?} trip from message {} ({} on {})",
                    ride.service, ride.id, ride.total_euros, ride.date
                );
                continue;
            }
            accepted_rides.push(ride.clone());
        }
        kept.push(record);
    }

    kept
}
