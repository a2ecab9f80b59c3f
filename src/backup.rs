use chrono::Local;
use filetime::FileTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("IO error copying {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Persists byte-exact copies of monitored files.
///
/// Two kinds of copy are kept: the original (at most one per filename, made
/// on first observation and never overwritten) and a changed copy per newly
/// detected revision, suffixed with a timestamp. Copies are never deleted by
/// this tool; retention is up to the operator.
pub struct BackupManager {
    original_dir: PathBuf,
    changed_dir: PathBuf,
}

impl BackupManager {
    pub fn new(original_dir: impl Into<PathBuf>, changed_dir: impl Into<PathBuf>) -> Self {
        BackupManager {
            original_dir: original_dir.into(),
            changed_dir: changed_dir.into(),
        }
    }

    /// Copies the source into the original-backup directory under its base
    /// name, unless a copy already exists there.
    ///
    /// Idempotent: the very first captured bytes are never overwritten.
    /// Returns the destination path either way.
    pub fn save_original(&self, src: &Path) -> Result<PathBuf, BackupError> {
        fs::create_dir_all(&self.original_dir)
            .map_err(|e| map_io_error(e, &self.original_dir))?;

        let name = src
            .file_name()
            .ok_or_else(|| BackupError::NoFileName(src.to_path_buf()))?;
        let dest = self.original_dir.join(name);

        if dest.exists() {
            debug!("Original copy already exists at {}", dest.display());
            return Ok(dest);
        }

        copy_preserving_times(src, &dest)?;
        info!("Saved original copy to {}", dest.display());

        Ok(dest)
    }

    /// Copies the source into the changed-files directory under
    /// `{stem}_changed_{YYYYMMDD_HHMMSS}{ext}`.
    ///
    /// Timestamps have second resolution, so two revisions captured within
    /// the same second would collide; the later one gets a numeric suffix
    /// rather than overwriting the earlier copy.
    pub fn save_changed(&self, src: &Path) -> Result<PathBuf, BackupError> {
        fs::create_dir_all(&self.changed_dir).map_err(|e| map_io_error(e, &self.changed_dir))?;

        if src.file_name().is_none() {
            return Err(BackupError::NoFileName(src.to_path_buf()));
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut dest = self.changed_dir.join(changed_name(src, &timestamp, None));
        let mut counter = 1u32;
        while dest.exists() {
            dest = self
                .changed_dir
                .join(changed_name(src, &timestamp, Some(counter)));
            counter += 1;
        }

        copy_preserving_times(src, &dest)?;
        info!("Saved changed copy to {}", dest.display());

        Ok(dest)
    }
}

fn changed_name(src: &Path, timestamp: &str, counter: Option<u32>) -> String {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = src
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    match counter {
        Some(n) => format!("{stem}_changed_{timestamp}_{n}{ext}"),
        None => format!("{stem}_changed_{timestamp}{ext}"),
    }
}

/// Copies content and carries over the source's timestamps.
///
/// `fs::copy` already preserves permissions where representable; the
/// modification and access times are set separately to match the source.
fn copy_preserving_times(src: &Path, dest: &Path) -> Result<(), BackupError> {
    let metadata = fs::metadata(src).map_err(|e| map_io_error(e, src))?;

    fs::copy(src, dest).map_err(|e| map_io_error(e, dest))?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    let atime = FileTime::from_last_access_time(&metadata);
    filetime::set_file_times(dest, atime, mtime).map_err(|e| map_io_error(e, dest))?;

    Ok(())
}

fn map_io_error(e: std::io::Error, path: &Path) -> BackupError {
    if e.kind() == ErrorKind::PermissionDenied {
        BackupError::PermissionDenied(path.to_path_buf())
    } else {
        BackupError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    }
}
