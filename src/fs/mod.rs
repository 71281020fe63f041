//! Local staging area for a single table run.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::observability::{log_debug, log_error};

/// Scoped working directory.
///
/// Clones are keep-alive handles: blocking tasks writing below the directory hold one, so
/// the directory is only removed after the last handle is gone. Call [`WorkingDir::close`]
/// on the normal path; dropping the last handle is the fallback for a dropped (cancelled)
/// run future.
#[derive(Debug, Clone)]
pub(crate) struct WorkingDir {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    removed: bool,
}

impl WorkingDir {
    /// Create a fresh directory at `path`, clearing leftovers from an earlier crashed run.
    pub(crate) async fn create(path: PathBuf) -> io::Result<Self> {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => log_debug!(
                component = "fs",
                event = "stale_working_dir_removed",
                path = %path.display(),
            ),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        tokio::fs::create_dir_all(&path).await?;
        Ok(WorkingDir {
            inner: Arc::new(Inner {
                path,
                removed: false,
            }),
        })
    }

    pub(crate) fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.inner.path.join(name)
    }

    /// Remove the directory without blocking the runtime. If another handle is still
    /// alive, removal is left to whichever handle drops last.
    pub(crate) async fn close(self) {
        let Ok(mut inner) = Arc::try_unwrap(self.inner) else {
            return;
        };
        match tokio::fs::remove_dir_all(&inner.path).await {
            Ok(()) => inner.removed = true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => inner.removed = true,
            // retried synchronously on drop
            Err(_) => {}
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // Blocking, but only reached when `close` was skipped or failed; staging dirs hold
        // a handful of shard files.
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => log_error!(
                component = "fs",
                event = "working_dir_cleanup_failed",
                path = %self.path.display(),
                error = %err,
            ),
        }
    }
}
