use thiserror::Error;
use tokio::task::JoinError;

use crate::{retention::RetentionError, store::StoreError};

/// Errors that abort a table compaction run.
///
/// Every variant leaves the store as it was before the run, except a failed
/// [`CompactionError::Storage`] delete which may have removed some originals;
/// the next run converges by listing again.
#[derive(Debug, Error)]
pub enum CompactionError {
    /// A downloaded file does not open as an index database.
    #[error("shard {name} is not a valid index database: {source}")]
    CorruptShard {
        /// Shard name within the table.
        name: String,
        /// Error raised while opening it.
        #[source]
        source: redb::DatabaseError,
    },
    /// The retention marker failed.
    #[error("retention marker failed: {0}")]
    RetentionMarker(#[source] RetentionError),
    /// Uploading the compacted file failed; originals are untouched.
    #[error("failed to publish {name}: {source}")]
    PublishFailed {
        /// Name the file was being published under.
        name: String,
        /// Error raised by the store.
        #[source]
        source: StoreError,
    },
    /// Listing, downloading or deleting shards failed.
    #[error("compaction storage error: {0}")]
    Storage(#[from] StoreError),
    /// Reading or writing a staged database failed.
    #[error("compaction database error: {0}")]
    Database(#[from] redb::Error),
    /// Local filesystem failure in the working directory.
    #[error("compaction io error: {0}")]
    Io(#[from] std::io::Error),
    /// A blocking task panicked or was aborted.
    #[error("compaction background task failed: {0}")]
    Background(#[from] JoinError),
    /// The run was cancelled by its caller.
    #[error("compaction cancelled")]
    Cancelled,
}
