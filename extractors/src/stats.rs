//! Monthly spending totals over extracted records.

use serde::Serialize;
use shared_types::ExpenseRecord;
use std::collections::BTreeMap;
use tracing::warn;

/// Amounts of one `YYYY-MM` bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub amounts: Vec<f64>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpendingStats {
    /// Keyed by `YYYY-MM`, oldest month first
    pub months: BTreeMap<String, MonthTotal>,
    pub total: f64,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn amount(record: &ExpenseRecord) -> Option<f64> {
    match record {
        ExpenseRecord::Food(food) => food.total_euros,
        ExpenseRecord::Transportation(ride) => Some(ride.total_euros),
        // Statement lines mix credits and debits
        ExpenseRecord::Bank(_) => None,
    }
}

/// Groups food and ride totals by month. Records without an amount or a
/// usable date are left out.
pub fn monthly_totals(records: &[ExpenseRecord]) -> SpendingStats {
    let mut stats = SpendingStats::default();

    for record in records {
        let Some(value) = amount(record) else {
            continue;
        };
        let month = match record.date().get(..7) {
            Some(month) if record.date().as_bytes().get(4) == Some(&b'-') => month.to_string(),
            _ => {
                warn!("Record {} has no usable date, left out of stats", record.id());
                continue;
            }
        };

        let bucket = stats.months.entry(month).or_insert_with(|| MonthTotal {
            amounts: Vec::new(),
            total: 0.0,
        });
        bucket.amounts.push(value);
        bucket.total = round_cents(bucket.total + value);
    }

    stats.total = round_cents(stats.months.values().map(|month| month.total).sum());
    stats
}

/// One line per month followed by the overall total
pub fn format_stats(stats: &SpendingStats) -> Vec<String> {
    let mut lines: Vec<String> = stats
        .months
        .iter()
        .map(|(month, bucket)| {
            format!(
                "{}\t{:.2}€\t({} expenses)",
                month,
                bucket.total,
                bucket.amounts.len()
            )
        })
        .collect();
    lines.push(format!("Total\t{:.2}€", stats.total));
    lines
}
