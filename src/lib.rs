#![deny(missing_docs)]
//! Compaction and retention for object-store backed index tables.
//!
//! Every table is a prefix in an object store holding small redb shard files.
//! [`TableCompactor`] merges them into one compacted file, applies a
//! [`RetentionMarker`], rewrites stale compacted files to reclaim space, and
//! publishes the result so readers only ever see the old file set or the new one.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use object_store::local::LocalFileSystem;
//! use shard_compactor::{CompactorOption, ObjectShardStore, TableCompactor};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let objects = LocalFileSystem::new_with_prefix("/var/lib/index")?;
//! let store = Arc::new(ObjectShardStore::new(Arc::new(objects)));
//! let option = Arc::new(CompactorOption::from("/tmp/compactor"));
//!
//! let outcome = TableCompactor::new("index_19000", store, option)
//!     .compact()
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod fs;
mod observability;

/// Table compaction engine.
pub mod compaction;
/// Compactor configuration.
pub mod option;
/// Retention policy interface.
pub mod retention;
/// Shard files and their naming.
pub mod shard;
/// Object storage access.
pub mod store;

#[cfg(test)]
mod test_util;

pub use crate::{
    compaction::{CompactionError, CompactionOutcome, TableCompactor, TableState},
    option::CompactorOption,
    retention::{MarkerFn, RetentionDecision, RetentionError, RetentionMarker},
    shard::ShardDescriptor,
    store::{ObjectShardStore, ShardStore, StoreError},
};
