use crate::backup::{BackupError, BackupManager};
use crate::digest::{DigestError, digest_file};
use crate::ledger::{Ledger, LedgerError, LedgerSummary, Record};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Digest error: {0}")]
    Digest(#[from] DigestError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
    #[error("Ledger append failed after backup was written to {backup}: {source}")]
    AppendAfterBackup {
        backup: PathBuf,
        source: LedgerError,
    },
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Explicit configuration for one monitor instance.
///
/// Passing these in (rather than reading ambient globals) lets multiple
/// independently configured monitors coexist and keeps tests deterministic.
pub struct MonitorConfig {
    pub ledger_path: PathBuf,
    pub original_dir: PathBuf,
    pub changed_dir: PathBuf,
}

/// Outcome of one reconciliation pass, with the backup written for the
/// outcomes that write one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    FirstObservation { backup: PathBuf },
    Unchanged,
    DuplicateChange,
    NewChange { backup: PathBuf },
}

/// What the decision procedure concluded, before any side effects run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    FirstObservation,
    Unchanged,
    DuplicateChange,
    /// Carries the filename's permanent original so the appended record can
    /// repeat it.
    NewChange { original: String },
}

/// Maps (current, original, last-changed) digests to one decision.
///
/// Evaluated in fixed priority order: no record yet, then unchanged, then
/// already-recorded change, then new change. Stateless: every run re-derives
/// its inputs from the ledger, so there is no machine position to corrupt.
pub fn decide(current: &str, summary: &LedgerSummary) -> Decision {
    let Some(original) = &summary.original else {
        return Decision::FirstObservation;
    };

    if current == original {
        return Decision::Unchanged;
    }

    if summary.last_changed.as_deref() == Some(current) {
        return Decision::DuplicateChange;
    }

    Decision::NewChange {
        original: original.clone(),
    }
}

/// Runs one monitoring pass over a file.
///
/// Computes the current digest, re-reads the ledger for the file's base
/// name, decides the outcome, and performs at most one backup write and one
/// ledger append. The backup is written before the record is appended; an
/// append failure after a successful backup is surfaced as its own error
/// variant so the half-completed pass is never silently swallowed.
pub fn run_check(config: &MonitorConfig, path: &Path) -> Result<Outcome, MonitorError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MonitorError::NoFileName(path.to_path_buf()))?;

    let current = digest_file(path)?;

    let ledger = Ledger::new(&config.ledger_path);
    let summary = ledger.load(&filename)?;

    debug!(
        "Reconciling {}: current={} original={:?} last_changed={:?}",
        filename, current, summary.original, summary.last_changed
    );

    match decide(&current, &summary) {
        Decision::FirstObservation => {
            let backups = BackupManager::new(&config.original_dir, &config.changed_dir);
            let backup = backups.save_original(path)?;
            append_after_backup(
                &ledger,
                &Record::first_observation(&filename, &current),
                &backup,
            )?;
            info!("Recorded first observation of {}", filename);
            Ok(Outcome::FirstObservation { backup })
        }
        Decision::Unchanged => Ok(Outcome::Unchanged),
        Decision::DuplicateChange => Ok(Outcome::DuplicateChange),
        Decision::NewChange { original } => {
            let backups = BackupManager::new(&config.original_dir, &config.changed_dir);
            let backup = backups.save_changed(path)?;
            append_after_backup(
                &ledger,
                &Record::new_change(&filename, &original, &current),
                &backup,
            )?;
            info!("Recorded new change of {}", filename);
            Ok(Outcome::NewChange { backup })
        }
    }
}

fn append_after_backup(
    ledger: &Ledger,
    record: &Record,
    backup: &Path,
) -> Result<(), MonitorError> {
    ledger
        .append(record)
        .map_err(|source| MonitorError::AppendAfterBackup {
            backup: backup.to_path_buf(),
            source,
        })
}
