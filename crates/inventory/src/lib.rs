//! Inventory data module.
//!
//! Historical borrowing observations per (book, branch, period) and the pure
//! aggregations built on top of them: the latest stock position per pair and
//! recent-usage summaries used as next-period features. No IO, no HTTP, no
//! storage.

pub mod demo;
pub mod observation;
pub mod snapshot;
pub mod usage;

pub use demo::{Book, Branch, DemoConfig, DemoDataset, MAX_DEMO_ROWS};
pub use observation::Observation;
pub use snapshot::{StockPosition, latest_positions};
pub use usage::{DEFAULT_USAGE_WINDOW, UsageSummary, recent_usage, validate_all};
