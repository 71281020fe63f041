//! File naming shared with every other writer of the index store. Names must stay
//! bit-exact: readers and earlier compactor versions key off these stems and suffixes.

use std::time::{SystemTime, UNIX_EPOCH};

/// Name stem of every file uploaded by the compactor.
pub const UPLOADER_NAME: &str = "compactor";

/// Suffix of gzip-compressed shard files.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix of compacted files produced by a staleness rewrite.
pub const RECREATED_SUFFIX: &str = ".r.gz";

/// Whether `name` was uploaded by a previous compaction.
pub fn is_compacted(name: &str) -> bool {
    name.starts_with(UPLOADER_NAME)
}

/// Whether `name` is stored gzip-compressed.
pub fn is_compressed(name: &str) -> bool {
    name.ends_with(COMPRESSED_SUFFIX)
}

/// Whether `name` came out of a staleness rewrite.
pub fn is_recreated(name: &str) -> bool {
    name.ends_with(RECREATED_SUFFIX)
}

/// Local file name of a shard once it is decompressed.
pub(crate) fn local_name(name: &str) -> &str {
    name.strip_suffix(COMPRESSED_SUFFIX).unwrap_or(name)
}

/// Kind of file a run publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputKind {
    Merged,
    Recreated,
}

/// Stem of a freshly built output, without the compression suffix.
pub(crate) fn output_stem(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("{UPLOADER_NAME}-{secs}")
}

/// Name the output is published under.
pub(crate) fn output_name(stem: &str, kind: OutputKind) -> String {
    match kind {
        OutputKind::Merged => format!("{stem}{COMPRESSED_SUFFIX}"),
        OutputKind::Recreated => format!("{stem}{RECREATED_SUFFIX}"),
    }
}
