//! Structured log events emitted by a compaction run.
//!
//! Every event goes to the `shard_compactor` target and carries `component` (the
//! subsystem: "compaction", "store" or "fs") and a snake_case `event` name. Run-level
//! events also carry the `table` name, so one table's run can be followed across
//! concurrently compacted tables. Installing a subscriber is left to the embedding
//! service.

/// Target shared by every event of this crate.
pub(crate) const COMPACTOR_TARGET: &str = "shard_compactor";

/// Info-level event: one per run milestone (listed, published, emptied, skipped).
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::COMPACTOR_TARGET, $($field)*)
    };
}

/// Debug-level event: per-shard progress.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::COMPACTOR_TARGET, $($field)*)
    };
}

/// Warn-level event: the run continues or stops with a recoverable condition.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::COMPACTOR_TARGET, $($field)*)
    };
}

/// Error-level event: failures nothing else reports, such as cleanup on drop.
macro_rules! log_error {
    ($($field:tt)*) => {
        ::tracing::error!(target: $crate::observability::COMPACTOR_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
