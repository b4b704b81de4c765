//! Run summary output
//!
//! - `FilterStats`: counters and calls returned by one filtering pass
//! - `RunSummary`: everything recorded about a run, written as JSON
//! - `OutputCollector`: builder that assembles a `RunSummary`
//!
//! # Example
//!
//! ```ignore
//! use fgfr1_itd::output::OutputCollector;
//!
//! let collector = OutputCollector::new()
//!     .with_sample("S1", "hg38")
//!     .with_windows(windows)
//!     .with_filter(stats);
//!
//! collector.write_json(Path::new("S1.summary.json"))?;
//! ```

pub mod collector;
pub mod schema;
pub mod types;

pub use collector::OutputCollector;
pub use types::{CallerReport, FilterStats, ItdCall, RunSummary};
