//! Test-only helpers for building and reading shard files.

use std::{collections::BTreeMap, path::Path};

use redb::{Database, ReadableTable};

use crate::shard::INDEX_TABLE;

/// Records keyed `key-<i>` with value `value-<i>` for `i` in `start..end`.
pub(crate) fn records_in_range(start: usize, end: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (start..end)
        .map(|i| {
            (
                format!("key-{i:08}").into_bytes(),
                format!("value-{i:08}").into_bytes(),
            )
        })
        .collect()
}

/// Create a shard database at `path` holding `records`.
pub(crate) fn write_records(
    path: &Path,
    records: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
) {
    let db = Database::create(path).expect("create shard");
    let txn = db.begin_write().expect("write txn");
    {
        let mut table = txn.open_table(INDEX_TABLE).expect("index table");
        for (key, value) in records {
            table
                .insert(key.as_slice(), value.as_slice())
                .expect("insert record");
        }
    }
    txn.commit().expect("commit shard");
}

/// Every record of `db`'s index table.
pub(crate) fn read_records(db: &Database) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let txn = db.begin_read().expect("read txn");
    let table = txn.open_table(INDEX_TABLE).expect("index table");
    let records = table
        .iter()
        .expect("iter")
        .map(|entry| {
            let (key, value) = entry.expect("entry");
            (key.value().to_vec(), value.value().to_vec())
        })
        .collect();
    records
}
