//! Output directory lock
//!
//! Two runs writing into the same output directory would race on the same
//! artifact paths. The first run holds an exclusive lock; later runs fail
//! fast with the lock path in the message.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lock file name inside the output directory
pub const LOCK_FILE: &str = ".gettext-dist.lock";

/// Acquire an exclusive lock on `output_dir`, creating the directory if needed.
/// Returns a guard that releases the lock when dropped.
pub fn acquire_output_lock(output_dir: &Path) -> Result<OutputLock> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let lock_path = output_dir.join(LOCK_FILE);
    let lock_file = File::create(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    // Leave the file alone on contention: it belongs to the other run
    if lock_file.try_lock_exclusive().is_err() {
        anyhow::bail!(
            "Output directory '{}' is in use by another run. \
             If this is incorrect, delete '{}'",
            output_dir.display(),
            lock_path.display()
        );
    }

    Ok(OutputLock {
        file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the output lock - unlocks and deletes the lock file when dropped
#[derive(Debug)]
pub struct OutputLock {
    file: File,
    path: PathBuf,
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
