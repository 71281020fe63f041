use std::{path::PathBuf, time::Duration};

/// Files uploaded by the compactor become eligible for a staleness rewrite after this long.
pub(crate) const DEFAULT_RECREATE_OLDER_THAN: Duration = Duration::from_secs(12 * 60 * 60);

/// Number of shard downloads kept in flight per table run.
pub(crate) const DEFAULT_DOWNLOAD_PARALLELISM: usize = 50;

/// Configuration shared by every table compaction run.
#[derive(Debug, Clone)]
pub struct CompactorOption {
    pub(crate) working_dir: PathBuf,
    pub(crate) apply_retention: bool,
    pub(crate) recreate_older_than: Duration,
    pub(crate) download_parallelism: usize,
}

impl<P> From<P> for CompactorOption
where
    P: Into<PathBuf>,
{
    fn from(working_dir: P) -> Self {
        CompactorOption {
            working_dir: working_dir.into(),
            apply_retention: false,
            recreate_older_than: DEFAULT_RECREATE_OLDER_THAN,
            download_parallelism: DEFAULT_DOWNLOAD_PARALLELISM,
        }
    }
}

impl CompactorOption {
    /// Root directory under which each run stages its table.
    pub fn working_dir(self, working_dir: impl Into<PathBuf>) -> Self {
        CompactorOption {
            working_dir: working_dir.into(),
            ..self
        }
    }

    /// Invoke the retention marker on every merged table.
    pub fn apply_retention(self, apply_retention: bool) -> Self {
        CompactorOption {
            apply_retention,
            ..self
        }
    }

    /// Age after which a sole, unmodified compacted file is rewritten.
    pub fn recreate_older_than(self, recreate_older_than: Duration) -> Self {
        CompactorOption {
            recreate_older_than,
            ..self
        }
    }

    /// Maximum concurrent shard downloads within one run.
    pub fn download_parallelism(self, download_parallelism: usize) -> Self {
        CompactorOption {
            download_parallelism: download_parallelism.max(1),
            ..self
        }
    }
}

impl CompactorOption {
    pub(crate) fn table_working_dir(&self, table: &str) -> PathBuf {
        self.working_dir.join(table)
    }

    /// Whether retention is configured on.
    pub fn retention_enabled(&self) -> bool {
        self.apply_retention
    }

    /// Configured staleness threshold.
    pub fn staleness_threshold(&self) -> Duration {
        self.recreate_older_than
    }
}
