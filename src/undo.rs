// SPDX-License-Identifier: MIT

//! Undo engine: reverse the most recent sorting session
//!
//! A session is every ledger entry sharing the latest calendar date.
//! Each reversed move is removed from the ledger; entries whose
//! destination no longer exists are skipped and deliberately kept (see
//! DESIGN.md for the pinned semantics).

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::history::Ledger;
use crate::sorter::move_file;
use crate::Result;

/// What an undo run accomplished.
#[derive(Debug)]
pub enum UndoOutcome {
    /// Empty ledger, or no entries on the latest date.
    NothingToUndo,
    /// The latest session was reversed.
    Undone {
        date: String,
        /// (destination, restored original) per reversed move.
        restored: Vec<(PathBuf, PathBuf)>,
        /// Entries whose destination had already vanished.
        skipped: usize,
    },
}

/// Reverse every move recorded for the most recent session and persist
/// the ledger once at the end. Running against an empty ledger is a
/// no-op, not an error; a second consecutive undo reaches the
/// next-most-recent session.
pub fn undo_latest(ledger: &mut Ledger) -> Result<UndoOutcome> {
    let date = match ledger.latest_session_date() {
        Some(date) => date,
        None => return Ok(UndoOutcome::NothingToUndo),
    };

    let session = ledger.session(&date);
    if session.is_empty() {
        return Ok(UndoOutcome::NothingToUndo);
    }

    let mut restored = Vec::new();
    let mut skipped = 0;

    for (dest, entry) in session {
        let dest_path = Path::new(&dest);
        if !dest_path.exists() {
            warn!(
                "Skipping {:?}: destination no longer exists, entry retained",
                dest_path
            );
            skipped += 1;
            continue;
        }

        if let Some(parent) = entry.original.parent() {
            fs::create_dir_all(parent)?;
        }
        move_file(dest_path, &entry.original)?;
        ledger.remove(&dest);
        restored.push((dest_path.to_path_buf(), entry.original.clone()));
    }

    ledger.save()?;
    Ok(UndoOutcome::Undone {
        date,
        restored,
        skipped,
    })
}
