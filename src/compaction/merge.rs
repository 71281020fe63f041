//! Blocking merge of staged shards into one database.

use std::path::{Path, PathBuf};

use redb::Database;

use super::CompactionError;
use crate::{
    observability::log_debug,
    shard::{self, ShardDescriptor},
};

/// A shard downloaded (and decompressed) into the working directory.
#[derive(Debug, Clone)]
pub(crate) struct StagedShard {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

impl StagedShard {
    pub(crate) fn new(shard: &ShardDescriptor, path: PathBuf) -> Self {
        StagedShard {
            name: shard.name.clone(),
            path,
        }
    }

    /// Open the staged file, failing with [`CompactionError::CorruptShard`] when it is not a
    /// database.
    pub(crate) fn open(&self) -> Result<Database, CompactionError> {
        Database::open(&self.path).map_err(|source| CompactionError::CorruptShard {
            name: self.name.clone(),
            source,
        })
    }
}

/// Build a fresh database at `output` holding the union of `inputs`. Inputs are applied in
/// slice order, so on key collisions the later input wins. Each input is closed before the
/// next one is opened.
pub(crate) fn merge_into(
    inputs: &[StagedShard],
    output: &Path,
) -> Result<Database, CompactionError> {
    let merged = shard::create_output(output)?;
    for input in inputs {
        let db = input.open()?;
        let copied = shard::copy_records(&db, &merged)?;
        log_debug!(
            component = "compaction",
            event = "shard_merged",
            shard = %input.name,
            records = copied,
        );
    }
    Ok(merged)
}

/// Re-serialize `src` into a new database at `output` and report how many entries it holds.
pub(crate) fn rewrite_into(src: &Database, output: &Path) -> Result<u64, CompactionError> {
    let fresh = shard::create_output(output)?;
    Ok(shard::copy_records(src, &fresh)?)
}
