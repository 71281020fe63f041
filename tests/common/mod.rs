//! Common fixtures for table compaction integration tests.

#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use object_store::local::LocalFileSystem;
use redb::{Database, ReadableTable};
use shard_compactor::{shard::INDEX_TABLE, CompactorOption, ObjectShardStore};
use tempfile::TempDir;

pub const TABLE: &str = "test";

/// Object storage rooted in a temp dir plus a working dir next to it.
pub struct Fixture {
    pub tmp: TempDir,
    pub objects: PathBuf,
    pub working: PathBuf,
    pub store: Arc<ObjectShardStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("temp dir");
        let objects = tmp.path().join("objects");
        let working = tmp.path().join("working-dir");
        std::fs::create_dir_all(&objects).expect("objects dir");
        let local = LocalFileSystem::new_with_prefix(&objects)
            .expect("local object store")
            .with_automatic_cleanup(true);
        Fixture {
            tmp,
            objects,
            working,
            store: Arc::new(ObjectShardStore::new(Arc::new(local))),
        }
    }

    pub fn option(&self) -> CompactorOption {
        CompactorOption::from(self.working.clone())
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.objects.join(table)
    }

    pub fn table_working_dir(&self, table: &str) -> PathBuf {
        self.working.join(table)
    }

    /// Store a shard named `name` (plus `.gz` when compressed) under `table`.
    pub fn put_shard(
        &self,
        table: &str,
        name: &str,
        records: &[(Vec<u8>, Vec<u8>)],
        compress: bool,
    ) -> PathBuf {
        let dir = self.table_dir(table);
        std::fs::create_dir_all(&dir).expect("table dir");
        let scratch = self.tmp.path().join("scratch");
        std::fs::create_dir_all(&scratch).expect("scratch dir");
        let raw = scratch.join(name);
        write_db(&raw, records);
        let stored = if compress {
            let stored = dir.join(format!("{name}.gz"));
            gzip(&raw, &stored);
            stored
        } else {
            let stored = dir.join(name);
            std::fs::copy(&raw, &stored).expect("copy shard");
            stored
        };
        std::fs::remove_file(&raw).expect("remove scratch");
        stored
    }

    /// Sorted file names currently stored under `table`.
    pub fn table_files(&self, table: &str) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.table_dir(table)) {
            Ok(entries) => entries
                .map(|entry| {
                    entry
                        .expect("dir entry")
                        .file_name()
                        .to_string_lossy()
                        .into_owned()
                })
                .collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => panic!("read table dir: {err}"),
        };
        names.sort();
        names
    }

    /// Records held by a stored (possibly compressed) shard file.
    pub fn read_stored(&self, table: &str, name: &str) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let stored = self.table_dir(table).join(name);
        let scratch = self.tmp.path().join("read");
        std::fs::create_dir_all(&scratch).expect("scratch dir");
        let local = scratch.join(name.trim_end_matches(".gz"));
        if name.ends_with(".gz") {
            let mut decoder = GzDecoder::new(BufReader::new(File::open(&stored).expect("open")));
            let mut out = File::create(&local).expect("create");
            io::copy(&mut decoder, &mut out).expect("gunzip");
        } else {
            std::fs::copy(&stored, &local).expect("copy");
        }
        let records = read_db(&local);
        std::fs::remove_file(&local).expect("remove scratch");
        records
    }
}

/// Records keyed `key-<i>` with value `value-<i>` for `i` in `start..end`.
pub fn records_in_range(start: usize, end: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (start..end)
        .map(|i| {
            (
                format!("key-{i:08}").into_bytes(),
                format!("value-{i:08}").into_bytes(),
            )
        })
        .collect()
}

pub fn write_db(path: &Path, records: &[(Vec<u8>, Vec<u8>)]) {
    let db = Database::create(path).expect("create db");
    let txn = db.begin_write().expect("write txn");
    {
        let mut table = txn.open_table(INDEX_TABLE).expect("index table");
        for (key, value) in records {
            table
                .insert(key.as_slice(), value.as_slice())
                .expect("insert");
        }
    }
    txn.commit().expect("commit");
}

pub fn read_db(path: &Path) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let db = Database::open(path).expect("open db");
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

pub fn gzip(src: &Path, dst: &Path) {
    let mut input = File::open(src).expect("open source");
    let mut encoder = GzEncoder::new(File::create(dst).expect("create gz"), Compression::default());
    io::copy(&mut input, &mut encoder).expect("gzip");
    encoder.finish().expect("finish gzip");
}

pub fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .expect("open for mtime")
        .set_modified(mtime)
        .expect("set mtime");
}

pub fn modified(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .expect("metadata")
        .modified()
        .expect("mtime")
}
