// SPDX-License-Identifier: MIT

//! History ledger for undo support
//!
//! A flat JSON document mapping each final destination path to the
//! provenance of the move that produced it. Loaded whole at startup,
//! mutated in memory, written whole at the end of a run. Concurrent
//! invocations against the same ledger file are unsupported.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::home_file;
use crate::{Result, TaxisError};

/// Provenance of one completed move, keyed externally by the absolute
/// destination path. Written exactly once when the file is moved and only
/// ever removed afterward (by undo).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// Absolute path the file was moved from.
    pub original: PathBuf,
    /// Category the file was sorted into.
    pub category: String,
    /// ISO-8601 local timestamp of the move.
    pub timestamp: String,
    /// Whether a model-suggested rename was used.
    pub ai_renamed: bool,
}

/// The calendar-date portion of an entry timestamp; the undo session key.
/// Lexical split, not timezone-normalized.
pub fn session_date(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// In-memory ledger bound to its backing file.
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, HistoryEntry>,
}

impl Ledger {
    /// Load the ledger, treating a missing file as empty. A present but
    /// unparseable file is a fatal startup error.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| TaxisError::Ledger(format!("Failed to parse {:?}: {}", path, e)))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Write the whole ledger back to its file.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn insert(&mut self, dest: &Path, entry: HistoryEntry) {
        self.entries.insert(dest.to_string_lossy().into_owned(), entry);
    }

    pub fn remove(&mut self, dest: &str) -> Option<HistoryEntry> {
        self.entries.remove(dest)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &HistoryEntry)> {
        self.entries.iter()
    }

    /// Date of the most recent entry, by lexically greatest timestamp.
    pub fn latest_session_date(&self) -> Option<String> {
        self.entries
            .values()
            .map(|e| e.timestamp.as_str())
            .max()
            .map(|ts| session_date(ts).to_string())
    }

    /// All entries whose timestamp falls on the given date. Cloned so the
    /// caller can mutate the ledger while walking the session.
    pub fn session(&self, date: &str) -> Vec<(String, HistoryEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.timestamp.starts_with(date))
            .map(|(dest, e)| (dest.clone(), e.clone()))
            .collect()
    }

    /// Entries grouped by session date, oldest date first.
    pub fn sessions(&self) -> BTreeMap<String, Vec<&HistoryEntry>> {
        let mut sessions: BTreeMap<String, Vec<&HistoryEntry>> = BTreeMap::new();
        for entry in self.entries.values() {
            sessions
                .entry(session_date(&entry.timestamp).to_string())
                .or_default()
                .push(entry);
        }
        sessions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default location of the ledger file (`~/.taxis_history.json`).
pub fn default_history_path() -> Result<PathBuf> {
    home_file(".taxis_history.json")
}
