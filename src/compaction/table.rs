//! Per-table compaction run: list, classify, merge, apply retention, publish, clean up.

use std::{future::Future, path::PathBuf, sync::Arc, time::SystemTime};

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use redb::Database;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;

use super::{
    merge::{self, StagedShard},
    CompactionError, TableState,
};
use crate::{
    fs::WorkingDir,
    observability::{log_debug, log_info, log_warn},
    option::CompactorOption,
    retention::{RetentionDecision, RetentionMarker},
    shard::{
        self, codec,
        naming::{self, OutputKind},
        ShardDescriptor,
    },
    store::ShardStore,
};

/// Sub-directory of the working dir that downloaded shards are staged in.
const STAGING_DIR: &str = "shards";
/// Local file name of the merged database.
const MERGED_DB: &str = "merged";

/// What a finished run did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The table had no shard files.
    Absent,
    /// The table already was a single up-to-date compacted file.
    Unchanged,
    /// Shards were merged and published as one file.
    Compacted {
        /// Name of the published file.
        published: String,
        /// Original files deleted after publishing.
        removed: Vec<String>,
        /// Entries held by the published file.
        records: u64,
    },
    /// A stale compacted file was rewritten.
    Recreated {
        /// Name of the published file.
        published: String,
        /// Original files deleted after publishing.
        removed: Vec<String>,
        /// Entries held by the published file.
        records: u64,
    },
    /// Retention expired the whole table and every file was deleted.
    Emptied {
        /// Files deleted from the table.
        removed: Vec<String>,
    },
}

impl CompactionOutcome {
    /// Name of the file published by this run, if any.
    pub fn published(&self) -> Option<&str> {
        match self {
            CompactionOutcome::Compacted { published, .. }
            | CompactionOutcome::Recreated { published, .. } => Some(published),
            _ => None,
        }
    }

    /// Whether a stale compacted file was rewritten.
    pub fn recreated(&self) -> bool {
        matches!(self, CompactionOutcome::Recreated { .. })
    }
}

/// Compacts the shards of one table.
///
/// A run is self-contained: it owns a private working directory and shares no state with
/// runs for other tables, so callers may drive many tables concurrently. Two runs on the
/// same table must not overlap.
pub struct TableCompactor<S> {
    name: String,
    store: Arc<S>,
    option: Arc<CompactorOption>,
    marker: Option<Arc<dyn RetentionMarker>>,
    cancel: CancellationToken,
}

impl<S> TableCompactor<S>
where
    S: ShardStore,
{
    /// Compactor for table `name` in `store`.
    pub fn new(name: impl Into<String>, store: Arc<S>, option: Arc<CompactorOption>) -> Self {
        TableCompactor {
            name: name.into(),
            store,
            option,
            marker: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Retention policy applied when [`CompactorOption::apply_retention`] is on.
    pub fn with_marker(self, marker: Arc<dyn RetentionMarker>) -> Self {
        TableCompactor {
            marker: Some(marker),
            ..self
        }
    }

    /// Abort store operations once `cancel` fires.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        TableCompactor { cancel, ..self }
    }

    /// Table this compactor works on.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn retention_marker(&self) -> Option<Arc<dyn RetentionMarker>> {
        if !self.option.apply_retention {
            return None;
        }
        if self.marker.is_none() {
            log_warn!(
                component = "compaction",
                event = "retention_marker_missing",
                table = %self.name,
            );
        }
        self.marker.clone()
    }

    /// Run one compaction of the table.
    ///
    /// On error the store holds the same files as before the call, except when deleting
    /// originals failed part-way; the next run picks up whatever is left. The working
    /// directory is gone when this returns. When the returned future is dropped instead, it
    /// is removed as soon as any blocking step already under way has finished.
    pub async fn compact(&self) -> Result<CompactionOutcome, CompactionError> {
        if self.cancel.is_cancelled() {
            return Err(CompactionError::Cancelled);
        }
        let marker = self.retention_marker();

        let mut shards = self.cancellable(self.store.list(&self.name)).await?;
        if shards.is_empty() {
            log_info!(
                component = "compaction",
                event = "no_index_files",
                table = %self.name,
            );
            return Ok(CompactionOutcome::Absent);
        }
        shards.sort_by(|a, b| a.name.cmp(&b.name));
        log_info!(
            component = "compaction",
            event = "index_files_listed",
            table = %self.name,
            count = shards.len(),
        );

        let now = SystemTime::now();
        if marker.is_none()
            && TableState::classify(&shards, None, now, self.option.recreate_older_than)
                == TableState::SingleFreshCompacted
        {
            log_info!(
                component = "compaction",
                event = "compaction_skipped",
                table = %self.name,
                reason = "single compacted file",
            );
            return Ok(CompactionOutcome::Unchanged);
        }

        let working_dir = WorkingDir::create(self.option.table_working_dir(&self.name)).await?;
        let result = self.compact_staged(&working_dir, &shards, marker, now).await;
        working_dir.close().await;
        result
    }

    async fn compact_staged(
        &self,
        working_dir: &WorkingDir,
        shards: &[ShardDescriptor],
        marker: Option<Arc<dyn RetentionMarker>>,
        now: SystemTime,
    ) -> Result<CompactionOutcome, CompactionError> {
        let staged = self.download(working_dir, shards).await?;

        let merged_path = match shards {
            [sole] if sole.is_compacted() => staged[0].path.clone(),
            _ => working_dir.join(MERGED_DB),
        };
        let (db, decision) = self
            .build(working_dir, staged, merged_path.clone(), marker)
            .await?;

        match TableState::classify(shards, decision, now, self.option.recreate_older_than) {
            TableState::Absent => Ok(CompactionOutcome::Absent),
            TableState::SingleFreshCompacted => {
                log_info!(
                    component = "compaction",
                    event = "compaction_skipped",
                    table = %self.name,
                    reason = "retention left compacted file unchanged",
                );
                Ok(CompactionOutcome::Unchanged)
            }
            TableState::MarkedEmpty => {
                drop(db);
                let removed = self.remove_shards(shards, None).await?;
                log_info!(
                    component = "compaction",
                    event = "table_emptied",
                    table = %self.name,
                    removed = removed.len(),
                );
                Ok(CompactionOutcome::Emptied { removed })
            }
            TableState::SingleStaleCompacted => {
                let (published, records) = self
                    .publish(working_dir, db, merged_path, OutputKind::Recreated)
                    .await?;
                let removed = self.remove_shards(shards, Some(&published)).await?;
                Ok(CompactionOutcome::Recreated {
                    published,
                    removed,
                    records,
                })
            }
            TableState::NeedsMerge => {
                let (published, records) = self
                    .publish(working_dir, db, merged_path, OutputKind::Merged)
                    .await?;
                let removed = self.remove_shards(shards, Some(&published)).await?;
                Ok(CompactionOutcome::Compacted {
                    published,
                    removed,
                    records,
                })
            }
        }
    }

    async fn cancellable<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CompactionError>
    where
        CompactionError: From<E>,
    {
        until_cancelled(&self.cancel, fut).await
    }

    /// Fetch every shard into the working dir, keeping listing order.
    ///
    /// The first failure stops the remaining fetches, but every download already started is
    /// awaited, so no staging writer outlives this call.
    async fn download(
        &self,
        working_dir: &WorkingDir,
        shards: &[ShardDescriptor],
    ) -> Result<Vec<StagedShard>, CompactionError> {
        let staging = working_dir.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;

        let abort = self.cancel.child_token();
        let (staging, abort_ref) = (&staging, &abort);
        let downloads = stream::iter(shards.iter().enumerate())
            .map(move |(idx, shard)| {
                let dst = staging.join(format!("{idx:06}-{}", naming::local_name(&shard.name)));
                self.download_one(working_dir, shard, dst, abort_ref)
            })
            .buffered(self.option.download_parallelism);
        tokio::pin!(downloads);

        let mut staged = Vec::with_capacity(shards.len());
        let mut failure = None;
        while let Some(result) = downloads.next().await {
            match result {
                Ok(shard) => staged.push(shard),
                Err(err) if failure.is_none() => {
                    abort.cancel();
                    failure = Some(err);
                }
                Err(_) => {}
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(staged),
        }
    }

    async fn download_one(
        &self,
        working_dir: &WorkingDir,
        shard: &ShardDescriptor,
        dst: PathBuf,
        abort: &CancellationToken,
    ) -> Result<StagedShard, CompactionError> {
        let body = until_cancelled(abort, self.store.get_file(&self.name, &shard.name)).await?;
        let compressed = shard.is_compressed();
        let path = dst.clone();
        let keep_alive = working_dir.clone();
        spawn_blocking(move || {
            let _keep_alive = keep_alive;
            codec::write_shard(&body, compressed, &path)
        })
        .await??;
        log_debug!(
            component = "compaction",
            event = "shard_downloaded",
            table = %self.name,
            shard = %shard.name,
            bytes = shard.size,
        );
        Ok(StagedShard::new(shard, dst))
    }

    /// Produce the merged database at `merged_path` and let retention look at it.
    ///
    /// A sole compacted shard is used in place; anything else is merged into a fresh file.
    async fn build(
        &self,
        working_dir: &WorkingDir,
        staged: Vec<StagedShard>,
        merged_path: PathBuf,
        marker: Option<Arc<dyn RetentionMarker>>,
    ) -> Result<(Database, Option<RetentionDecision>), CompactionError> {
        let table = self.name.clone();
        let keep_alive = working_dir.clone();
        spawn_blocking(move || -> Result<_, CompactionError> {
            let _keep_alive = keep_alive;
            let db = match staged.as_slice() {
                [sole] if sole.path == merged_path => sole.open()?,
                inputs => merge::merge_into(inputs, &merged_path)?,
            };
            let decision = match marker {
                Some(marker) => Some(
                    marker
                        .mark_for_delete(&table, &db)
                        .map_err(CompactionError::RetentionMarker)?,
                ),
                None => None,
            };
            Ok((db, decision))
        })
        .await?
    }

    /// Compress the merged database and upload it, returning the published name and its
    /// record count. Nothing in the store changes unless the upload succeeds.
    async fn publish(
        &self,
        working_dir: &WorkingDir,
        db: Database,
        db_path: PathBuf,
        kind: OutputKind,
    ) -> Result<(String, u64), CompactionError> {
        let stem = naming::output_stem(SystemTime::now());
        let name = naming::output_name(&stem, kind);
        let compressed_path = working_dir.join(&name);
        let rewrite_path = working_dir.join(&stem);

        let gz_path = compressed_path.clone();
        let keep_alive = working_dir.clone();
        let records = spawn_blocking(move || -> Result<u64, CompactionError> {
            let _keep_alive = keep_alive;
            let (records, uncompressed) = match kind {
                OutputKind::Recreated => (merge::rewrite_into(&db, &rewrite_path)?, rewrite_path),
                OutputKind::Merged => (shard::count_records(&db)?, db_path),
            };
            drop(db);
            codec::compress_file(&uncompressed, &gz_path)?;
            Ok(records)
        })
        .await??;

        let body = Bytes::from(tokio::fs::read(&compressed_path).await?);
        let size = body.len();
        self.cancellable(async {
            self.store
                .put_file(&self.name, &name, body)
                .await
                .map_err(|source| CompactionError::PublishFailed {
                    name: name.clone(),
                    source,
                })
        })
        .await?;
        log_info!(
            component = "compaction",
            event = "compacted_file_published",
            table = %self.name,
            file = %name,
            records = records,
            bytes = size,
            recreated = kind == OutputKind::Recreated,
        );
        Ok((name, records))
    }

    /// Delete `shards` one by one in name order, never touching `keep`. Stops at the first
    /// failure; whatever remains is picked up by the next run.
    async fn remove_shards(
        &self,
        shards: &[ShardDescriptor],
        keep: Option<&str>,
    ) -> Result<Vec<String>, CompactionError> {
        let mut removed = Vec::with_capacity(shards.len());
        for shard in shards {
            if keep == Some(shard.name.as_str()) {
                log_warn!(
                    component = "compaction",
                    event = "original_matches_published",
                    table = %self.name,
                    shard = %shard.name,
                );
                continue;
            }
            if let Err(err) = self
                .cancellable(self.store.delete_file(&self.name, &shard.name))
                .await
            {
                log_warn!(
                    component = "compaction",
                    event = "original_delete_failed",
                    table = %self.name,
                    shard = %shard.name,
                    removed = removed.len(),
                    error = %err,
                );
                return Err(err);
            }
            removed.push(shard.name.clone());
        }
        Ok(removed)
    }
}

async fn until_cancelled<T, E>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, CompactionError>
where
    CompactionError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CompactionError::Cancelled),
        res = fut => res.map_err(CompactionError::from),
    }
}
