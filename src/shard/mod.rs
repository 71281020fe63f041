//! Index shard files: one redb database per shard, holding a single flat `index` table.

pub(crate) mod codec;
pub mod naming;

use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use redb::{Database, ReadableTable, TableDefinition, TableError};

/// The one table every shard keeps its index entries in.
pub const INDEX_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("index");

/// A shard file as listed from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    /// File name, unique within the table.
    pub name: String,
    /// Last modification time reported by the store.
    pub last_modified: SystemTime,
    /// Size in bytes as stored (compressed size for `.gz` files).
    pub size: u64,
}

impl ShardDescriptor {
    /// Whether this file was produced by an earlier compaction.
    pub fn is_compacted(&self) -> bool {
        naming::is_compacted(&self.name)
    }

    /// Whether this file is stored gzip-compressed.
    pub fn is_compressed(&self) -> bool {
        naming::is_compressed(&self.name)
    }

    /// Whether this file came out of a staleness rewrite.
    pub fn is_recreated(&self) -> bool {
        naming::is_recreated(&self.name)
    }

    /// Time elapsed since the last modification; zero for timestamps in the future.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_modified).unwrap_or_default()
    }
}

/// Create an empty shard at `path` with the index table in place.
pub(crate) fn create_output(path: &Path) -> Result<Database, redb::Error> {
    let db = Database::create(path)?;
    let txn = db.begin_write()?;
    txn.open_table(INDEX_TABLE)?;
    txn.commit()?;
    Ok(db)
}

/// Copy every index entry of `src` into `dst` under one write transaction.
/// Entries already present in `dst` are overwritten.
pub(crate) fn copy_records(src: &Database, dst: &Database) -> Result<u64, redb::Error> {
    let read_txn = src.begin_read()?;
    let source = match read_txn.open_table(INDEX_TABLE) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    let write_txn = dst.begin_write()?;
    let mut copied = 0;
    {
        let mut target = write_txn.open_table(INDEX_TABLE)?;
        for entry in source.iter()? {
            let (key, value) = entry?;
            target.insert(key.value(), value.value())?;
            copied += 1;
        }
    }
    write_txn.commit()?;
    Ok(copied)
}

/// Number of index entries held by `db`.
pub(crate) fn count_records(db: &Database) -> Result<u64, redb::Error> {
    let txn = db.begin_read()?;
    let table = match txn.open_table(INDEX_TABLE) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(0),
        Err(err) => return Err(err.into()),
    };
    let mut count = 0;
    for entry in table.iter()? {
        entry?;
        count += 1;
    }
    Ok(count)
}
