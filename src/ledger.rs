use chrono::Local;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Line terminating every block in the ledger file (50 dashes).
pub const DELIMITER: &str = "--------------------------------------------------";

const KEY_FILENAME: &str = "Filename";
const KEY_ORIGINAL_HASH: &str = "Original Hash";
const KEY_CHANGED_HASH: &str = "Changed Hash";
const KEY_RECORDED_AT: &str = "Recorded At";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error on ledger {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// One entry appended to the ledger.
///
/// A record either marks the first observation of a filename (no
/// `changed_hash`) or a newly detected revision (`changed_hash` present,
/// `original_hash` repeating the filename's permanent original).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub filename: String,
    pub original_hash: String,
    pub changed_hash: Option<String>,
    pub recorded_at: String,
}

impl Record {
    pub fn first_observation(filename: &str, original_hash: &str) -> Self {
        Record {
            filename: filename.to_string(),
            original_hash: original_hash.to_string(),
            changed_hash: None,
            recorded_at: Local::now().to_rfc3339(),
        }
    }

    pub fn new_change(filename: &str, original_hash: &str, changed_hash: &str) -> Self {
        Record {
            filename: filename.to_string(),
            original_hash: original_hash.to_string(),
            changed_hash: Some(changed_hash.to_string()),
            recorded_at: Local::now().to_rfc3339(),
        }
    }

    fn to_block(&self) -> String {
        let mut block = String::new();
        block.push_str(&format!("{}: {}\n", KEY_FILENAME, self.filename));
        block.push_str(&format!("{}: {}\n", KEY_ORIGINAL_HASH, self.original_hash));
        if let Some(changed) = &self.changed_hash {
            block.push_str(&format!("{}: {}\n", KEY_CHANGED_HASH, changed));
        }
        block.push_str(&format!("{}: {}\n", KEY_RECORDED_AT, self.recorded_at));
        block.push_str(DELIMITER);
        block.push('\n');
        block
    }
}

/// The two digests the reconciler needs for one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    /// "Original Hash" of the first block mentioning the filename, if any.
    pub original: Option<String>,
    /// "Changed Hash" of the last block for the filename that carries one.
    pub last_changed: Option<String>,
}

/// A parsed ledger block for a filename, as shown by `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub original_hash: Option<String>,
    pub changed_hash: Option<String>,
    pub recorded_at: Option<String>,
}

/// Append-only text store of hash transition records.
///
/// The on-disk format is a sequence of blocks of `Key: Value` lines, each
/// block terminated by a 50-dash delimiter line. The ledger is never
/// truncated or rewritten; all state is re-derived by parsing it in full.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Ledger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a new block, creating the ledger file if absent.
    ///
    /// Existing bytes are never touched. Failures propagate to the caller;
    /// a failed append must not be retried silently.
    pub fn append(&self, record: &Record) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.map_io_error(e))?;

        file.write_all(record.to_block().as_bytes())
            .map_err(|e| self.map_io_error(e))?;

        debug!(
            "Appended record for {} to {}",
            record.filename,
            self.path.display()
        );

        Ok(())
    }

    /// Recovers the original and last-changed digests for a filename.
    ///
    /// The original is the "Original Hash" of the *first* block in file order
    /// whose "Filename" matches; if that block lacks the key the original is
    /// reported as absent (a later block never supplies it). The last-changed
    /// digest comes from the *last* matching block that carries a
    /// "Changed Hash" key. Blocks for other filenames are skipped, so one
    /// ledger may interleave records for many monitored files.
    pub fn load(&self, filename: &str) -> Result<LedgerSummary, LedgerError> {
        let blocks = self.read_blocks()?;

        let original = blocks
            .iter()
            .find(|block| block.get(KEY_FILENAME).map(String::as_str) == Some(filename))
            .and_then(|block| block.get(KEY_ORIGINAL_HASH).cloned());

        let last_changed = blocks
            .iter()
            .rev()
            .filter(|block| block.get(KEY_FILENAME).map(String::as_str) == Some(filename))
            .find_map(|block| block.get(KEY_CHANGED_HASH).cloned());

        Ok(LedgerSummary {
            original,
            last_changed,
        })
    }

    /// Returns all parsed blocks for a filename, in file order.
    pub fn records_for(&self, filename: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let blocks = self.read_blocks()?;

        Ok(blocks
            .into_iter()
            .filter(|block| block.get(KEY_FILENAME).map(String::as_str) == Some(filename))
            .map(|block| LedgerEntry {
                original_hash: block.get(KEY_ORIGINAL_HASH).cloned(),
                changed_hash: block.get(KEY_CHANGED_HASH).cloned(),
                recorded_at: block.get(KEY_RECORDED_AT).cloned(),
            })
            .collect())
    }

    /// Parses the full ledger into per-block key/value maps.
    ///
    /// Parsing is lenient: lines without a colon are ignored, keys and values
    /// are trimmed, and a key repeated within one block overwrites the
    /// earlier value. A missing or empty ledger parses as no blocks.
    fn read_blocks(&self) -> Result<Vec<BTreeMap<String, String>>, LedgerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.map_io_error(e)),
        };

        let mut blocks = Vec::new();
        let mut current = BTreeMap::new();

        for line in content.lines() {
            if line == DELIMITER {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                current.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        // A trailing block without a delimiter (e.g. a truncated write) is
        // still surfaced rather than dropped.
        if !current.is_empty() {
            blocks.push(current);
        }

        Ok(blocks)
    }

    fn map_io_error(&self, e: std::io::Error) -> LedgerError {
        if e.kind() == ErrorKind::PermissionDenied {
            LedgerError::PermissionDenied(self.path.clone())
        } else {
            LedgerError::Io {
                path: self.path.clone(),
                source: e,
            }
        }
    }
}
