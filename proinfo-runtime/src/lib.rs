//! ProInfo Runtime
//!
//! Coordinates analysis of targets against the intelligence sources:
//! - [`Correlator`]: one target through resolve, source fan-out, merge and scoring
//! - [`BatchOrchestrator`]: many targets in fixed-size waves with progressive snapshots
//! - [`PivotExpander`]: linked assets spliced under their parent record
//! - [`HistoryArchive`]: append-only record of completed batches

pub mod config;
pub mod correlator;
pub mod batch;
pub mod pivot;
pub mod history;

#[cfg(test)]
pub(crate) mod testing;

pub use config::*;
pub use correlator::*;
pub use batch::*;
pub use pivot::*;
pub use history::*;
