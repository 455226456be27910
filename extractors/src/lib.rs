//! Extractors Crate
//!
//! Turns receipt and statement emails into expense records.
//!
//! # Architecture
//!
//! - **Types**: records, raw messages and the `ExpenseExtractor` trait live in `shared-types`
//! - **text_normalizer**: filter tables, restaurant name cleanup, amount and date parsing
//! - **fields**: per-field matchers, each a primary pattern followed by fallbacks
//! - **builders**: one `ExpenseParser` variant per provider, plus the batch driver
//! - **dedup** and **export**: post-processing of a built batch
//! - **stats**: monthly totals over a batch
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{export, parse_messages, ExpenseParser, FilterTables};
//!
//! let parser = ExpenseParser::bolt_food(&FilterTables::builtin());
//! let batch = parse_messages(&parser, &messages);
//! let rows = export(&batch.records);
//! ```

pub mod builders;
pub mod dedup;
pub mod export;
pub mod fields;
pub mod stats;
pub mod text_normalizer;

pub use builders::{parse_messages, ExpenseParser, ParsedBatch, Selection};
pub use dedup::{drop_duplicate_rides, is_duplicate};
pub use export::{export, to_json_string, write_json_file, ExportError};
pub use fields::header_date::{parse_header_date, HeaderDateFallback};
pub use fields::html::html_to_text;
pub use stats::{format_stats, monthly_totals, MonthTotal, SpendingStats};
pub use text_normalizer::{FilterTableError, FilterTables};

// Re-export the extractor trait from shared-types for convenience
pub use shared_types::ExpenseExtractor;
