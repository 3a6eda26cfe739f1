//! Ledger of processed files for incremental runs.
//!
//! Every task rewrites files inside the same `public/` tree it reads from.
//! Running the image task twice would therefore re-apply lossy compression to
//! its own output, and every run would pay for the full minify/encode work.
//! The ledger records what this tool already wrote so a rerun can skip it.
//!
//! # Design
//!
//! Entries are keyed by the file's path relative to the public root (with `/`
//! separators). Each entry stores two hashes:
//!
//! - **`content_hash`**: SHA-256 of the file bytes as they were left on disk
//!   after processing. Content-based rather than mtime-based, so a deploy that
//!   copies the tree (resetting modification times) keeps the ledger valid,
//!   while a site rebuild that regenerates a file invalidates it.
//!
//! - **`params_hash`**: SHA-256 of the task's settings (see [`hash_params`]).
//!   Changing `images.max_width` or `css.compatibility` reprocesses every file
//!   of that task.
//!
//! A file is skipped when both hashes of its entry match. Anything else
//! (no entry, rebuilt file, changed settings) is processed again.
//!
//! ## Storage
//!
//! JSON at `<public>/.asset-press-cache.json`. The scanner never selects it.
//! A missing, corrupt or version-mismatched file loads as an empty ledger;
//! `--no-cache` starts from [`Ledger::empty`] without reading it.
//!
//! Entries for files that no longer exist (a rebuild dropped or renamed them)
//! are pruned before every save, so the ledger tracks the current tree only.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the ledger inside the public root.
pub const LEDGER_FILENAME: &str = ".asset-press-cache.json";

const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub content_hash: String,
    pub params_hash: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Ledger {
    pub version: u32,
    /// Sorted so the file diffs cleanly between runs.
    pub entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn empty() -> Self {
        Self {
            version: LEDGER_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load the ledger from `public_dir`, falling back to empty on any problem.
    pub fn load(public_dir: &Path) -> Self {
        let path = ledger_path(public_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let ledger: Self = match serde_json::from_str(&content) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable ledger");
                return Self::empty();
            }
        };
        if ledger.version != LEDGER_VERSION {
            tracing::debug!(version = ledger.version, "ledger version mismatch, starting empty");
            return Self::empty();
        }
        ledger
    }

    pub fn save(&self, public_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(ledger_path(public_dir), json)
    }

    /// True when `relative` was left by a previous run with these exact bytes and settings.
    pub fn is_current(&self, relative: &str, content_hash: &str, params_hash: &str) -> bool {
        self.entries
            .get(relative)
            .is_some_and(|e| e.content_hash == content_hash && e.params_hash == params_hash)
    }

    pub fn insert(&mut self, relative: String, content_hash: String, params_hash: String) {
        self.entries.insert(
            relative,
            LedgerEntry {
                content_hash,
                params_hash,
            },
        );
    }

    /// Drop entries whose file is gone from `public_dir`.
    pub fn prune(&mut self, public_dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|relative, _| public_dir.join(relative).is_file());
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned ledger entries for deleted files");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn ledger_path(public_dir: &Path) -> PathBuf {
    public_dir.join(LEDGER_FILENAME)
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a task's settings.
///
/// `label` keeps tasks apart when their settings serialize identically (the
/// `js` task has no options at all).
pub fn hash_params(label: &str, params: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(b"\0");
    hasher.update(serde_json::to_vec(params)?);
    Ok(format!("{:x}", hasher.finalize()))
}
