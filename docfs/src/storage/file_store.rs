use crate::errors::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Trait for asynchronous filesystem access
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List the entry names of a directory, sorted. Fails with `NotFound` if it does not exist.
    async fn list(&self, path: &Path) -> Result<Vec<String>>;

    /// Create a directory and all missing parents. Succeeds if it already exists.
    async fn mkdirs(&self, path: &Path) -> Result<()>;

    /// Delete a file. Deleting a missing file succeeds.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Create or overwrite a file. The parent directory must already exist.
    async fn write(&self, path: &Path, content: Bytes) -> Result<()>;

    /// Read a whole file. Fails with `NotFound` if it does not exist.
    async fn read(&self, path: &Path) -> Result<Bytes>;
}

// ============================================================================
// Local Filesystem Implementation
// ============================================================================

/// Local filesystem store.
///
/// Every syscall runs on tokio's blocking pool, and at most `max_blocking_operations` of them
/// are in flight at once, so a burst of requests cannot starve the runtime of blocking threads.
pub struct LocalFileStore {
    permits: Arc<Semaphore>,
}

impl LocalFileStore {
    pub fn new(max_blocking_operations: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_blocking_operations.max(1))),
        }
    }

    /// Run a blocking filesystem call on the bounded pool.
    async fn run_blocking<T, F>(&self, operation: &'static str, path: &Path, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> io::Result<T> + Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("File store worker pool closed: {e}"))?;

        let owned: PathBuf = path.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || call(&owned))
            .await
            .map_err(|e| anyhow::anyhow!("Blocking {operation} task failed: {e}"))?;

        outcome.map_err(|e| Error::from_io(operation, path, e))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn list(&self, path: &Path) -> Result<Vec<String>> {
        debug!(path = %path.display(), "Folder read request");
        self.run_blocking("list", path, |dir| {
            let mut names = std::fs::read_dir(dir)?
                .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
                .collect::<io::Result<Vec<_>>>()?;
            names.sort();
            Ok(names)
        })
        .await
    }

    async fn mkdirs(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "Folder create request");
        self.run_blocking("create directory", path, |dir| std::fs::create_dir_all(dir)).await
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "File removal request");
        self.run_blocking("delete", path, |file| match std::fs::remove_file(file) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %file.display(), "File already absent, nothing to delete");
                Ok(())
            }
            other => other,
        })
        .await
    }

    async fn write(&self, path: &Path, content: Bytes) -> Result<()> {
        info!(path = %path.display(), size = content.len(), "File write request");
        self.run_blocking("write", path, move |file| std::fs::write(file, &content)).await
    }

    async fn read(&self, path: &Path) -> Result<Bytes> {
        debug!(path = %path.display(), "File read request");
        self.run_blocking("read", path, |file| std::fs::read(file).map(Bytes::from)).await
    }
}
