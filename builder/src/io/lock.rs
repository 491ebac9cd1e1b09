//! Exclusive state-directory lock.
//!
//! At most one run may be in flight against a given state directory. The lock
//! is held for the full `load -> compose -> call -> parse -> commit -> log`
//! sequence and released on drop, so two scheduled invocations can never
//! interleave reads and writes of `progress.json`.

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use fs2::FileExt;
use tracing::debug;

/// RAII guard over the lock file. Dropping it releases the lock.
#[derive(Debug)]
pub struct StateLock {
    file: File,
}

impl StateLock {
    /// Acquire the lock without blocking. Fails if another run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("open lock file {}", path.display()))?;
        file.try_lock_exclusive().map_err(|err| {
            anyhow!(
                "another run holds the state lock {} ({err})",
                path.display()
            )
        })?;
        debug!(path = %path.display(), "state lock acquired");
        Ok(Self { file })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        // Released implicitly on close as well; unlock keeps it prompt.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
