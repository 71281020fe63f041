//! Table compaction: merge a table's shards into one file, apply retention, and
//! periodically rewrite stale compacted files.

/// Compaction error taxonomy.
mod error;
/// Blocking merge/rewrite over staged shard files.
mod merge;
/// Table state classification.
mod state;
/// Per-table compaction run.
mod table;

pub use error::CompactionError;
pub use state::TableState;
pub use table::{CompactionOutcome, TableCompactor};
