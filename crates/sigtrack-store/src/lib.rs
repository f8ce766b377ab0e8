//! File-backed storage for interaction signals and fallback escalations.
//!
//! Both logs are pretty-printed JSON arrays. Every operation re-reads the
//! file, so there is no in-memory copy to drift from what is on disk. Writes
//! go through [`JsonArrayFile::append`], which holds a file lock for each
//! read-modify-write cycle, so concurrent writers in any process keep every
//! record.

pub mod aggregate;
pub mod error;
pub mod escalation_log;
pub mod json_file;
pub mod signal_store;

pub use aggregate::{aggregate, AggregateResult, AggregateStats, Aggregator, RecentSignal};
pub use error::StoreError;
pub use escalation_log::EscalationLog;
pub use json_file::{BestEffort, JsonArrayFile};
pub use signal_store::SignalStore;
