// SPDX-License-Identifier: MIT

//! End-to-end sorting, dry-run and undo flows against a temp tree.
//!
//! All runs are deterministic-only: the model client carries no
//! credentials, so every remote attempt short-circuits before the
//! network.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use taxis::config::AppConfig;
use taxis::history::Ledger;
use taxis::model::ModelClient;
use taxis::rules::RuleSet;
use taxis::sorter::{RunReport, SortOptions, Sorter};
use taxis::undo::{undo_latest, UndoOutcome};

struct Fixture {
    temp: TempDir,
    rules: RuleSet,
    model: ModelClient,
}

impl Fixture {
    fn new() -> Self {
        Self {
            temp: TempDir::new().expect("tempdir"),
            rules: RuleSet::default(),
            model: ModelClient::new(&AppConfig::default(), None),
        }
    }

    fn source(&self) -> PathBuf {
        self.temp.path().join("inbox")
    }

    fn ledger_path(&self) -> PathBuf {
        self.temp.path().join("history.json")
    }

    fn ledger(&self) -> Ledger {
        Ledger::load(self.ledger_path()).expect("load ledger")
    }

    fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.source().join(relative);
        fs::create_dir_all(path.parent().unwrap()).expect("create parents");
        fs::write(&path, content).expect("write file");
        path
    }

    async fn run(&self, ledger: &mut Ledger, recursive: bool, dry_run: bool) -> RunReport {
        let sorter = Sorter::new(
            &self.rules,
            &self.model,
            SortOptions {
                source: self.source(),
                dest: None,
                recursive,
                dry_run,
            },
        );
        sorter.run(ledger).await.expect("sort run")
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[tokio::test]
async fn live_sort_moves_files_into_categories() {
    let fx = Fixture::new();
    fx.write("photo.png", b"not really a png");
    fx.write("notes.txt", b"meeting notes");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, false).await;

    assert_eq!(report.stats.sorted, 2);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.stats.by_category["Images"], 1);
    assert_eq!(report.stats.by_category["Docs"], 1);
    assert!(report.stats.total_bytes > 0);

    let dest = fx.source().join("sorted");
    let images = files_under(&dest.join("Images"));
    assert_eq!(images.len(), 1);
    let moved = images[0].file_name().unwrap().to_str().unwrap();
    assert!(moved.starts_with("photo_"), "got {}", moved);
    assert!(moved.ends_with(".png"));

    // Originals are gone from the source root.
    assert!(!fx.source().join("photo.png").exists());
    assert!(!fx.source().join("notes.txt").exists());

    // Every move is in the ledger, keyed by destination.
    assert_eq!(ledger.len(), 2);
    let (_, entry) = ledger
        .entries()
        .find(|(dest, _)| dest.contains("Images"))
        .expect("image entry");
    assert_eq!(entry.category, "Images");
    assert!(!entry.ai_renamed);

    // The ledger was persisted.
    assert_eq!(fx.ledger().len(), 2);
}

#[tokio::test]
async fn low_confidence_without_model_keeps_deterministic_winner() {
    let fx = Fixture::new();
    fx.write("mystery.xyz", b"unclassifiable");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, false).await;

    // All-zero scores: the remote fallback has no credentials, so the
    // tie goes to the first category in rule order.
    assert_eq!(report.stats.sorted, 1);
    assert_eq!(report.stats.by_category["Images"], 1);
}

#[tokio::test]
async fn colliding_names_get_distinct_destinations() {
    let fx = Fixture::new();
    fx.write("report.txt", b"top");
    fx.write("nested/report.txt", b"nested");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, false).await;

    assert_eq!(report.stats.sorted, 2);
    let docs = files_under(&fx.source().join("sorted").join("Docs"));
    assert_eq!(docs.len(), 2);
    assert_ne!(docs[0], docs[1]);
}

#[tokio::test]
async fn dry_run_previews_without_touching_anything() {
    let fx = Fixture::new();
    let photo = fx.write("vacation_photo.jpg", b"pixels");
    let notes = fx.write("deep/nested/todo.md", b"- [ ] everything");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, true).await;

    assert!(report.dry_run);
    assert_eq!(report.preview.len(), 2);
    assert!(report.stats.total_bytes > 0);

    let row = report
        .preview
        .iter()
        .find(|p| p.name == "vacation_photo.jpg")
        .expect("preview row");
    assert_eq!(row.category, "Images");
    assert_eq!(row.destination, PathBuf::from("sorted/Images"));

    // Filesystem untouched: files in place, no destination, no ledger.
    assert!(photo.exists());
    assert!(notes.exists());
    assert!(!fx.source().join("sorted").exists());
    assert!(!fx.ledger_path().exists());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn junk_is_never_moved_or_logged() {
    let fx = Fixture::new();
    let junk_name = fx.write("Thumbs.db", b"cache");
    let junk_ext = fx.write("download.crdownload", b"partial");
    fx.write("real.pdf", b"%PDF-");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, false).await;

    assert_eq!(report.stats.sorted, 1);
    assert_eq!(report.stats.skipped, 2);

    assert!(junk_name.exists());
    assert!(junk_ext.exists());
    assert!(ledger.entries().all(|(dest, _)| !dest.contains("Thumbs")));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn repeated_runs_never_consume_the_destination_tree() {
    let fx = Fixture::new();
    fx.write("first.png", b"one");

    let mut ledger = fx.ledger();
    fx.run(&mut ledger, true, false).await;
    let after_first: Vec<_> = files_under(&fx.source().join("sorted"));
    assert_eq!(after_first.len(), 1);

    fx.write("second.png", b"two");
    let report = fx.run(&mut ledger, true, false).await;

    // Only the new file was sorted; the already-sorted one stayed put.
    assert_eq!(report.stats.sorted, 1);
    assert!(after_first[0].exists());
    let after_second = files_under(&fx.source().join("sorted"));
    assert_eq!(after_second.len(), 2);
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn non_recursive_ignores_subdirectories() {
    let fx = Fixture::new();
    fx.write("top.txt", b"top level");
    let nested = fx.write("nested/below.txt", b"below");

    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, false, false).await;

    assert_eq!(report.stats.sorted, 1);
    assert!(nested.exists());
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn recursive_sort_cleans_up_emptied_directories() {
    let fx = Fixture::new();
    fx.write("deep/nested/only.txt", b"alone");

    let mut ledger = fx.ledger();
    fx.run(&mut ledger, true, false).await;

    // The emptied chain is gone, bottom-up; source and dest remain.
    assert!(!fx.source().join("deep").exists());
    assert!(fx.source().exists());
    assert!(fx.source().join("sorted").join("Docs").exists());
}

#[tokio::test]
async fn sort_then_undo_restores_exact_original_paths() {
    let fx = Fixture::new();
    let original = fx.write("projects/draft.md", b"# Draft");

    let mut ledger = fx.ledger();
    fx.run(&mut ledger, true, false).await;
    assert!(!original.exists());
    assert_eq!(ledger.len(), 1);

    let mut ledger = fx.ledger();
    match undo_latest(&mut ledger).expect("undo") {
        UndoOutcome::Undone { restored, skipped, .. } => {
            assert_eq!(restored.len(), 1);
            assert_eq!(skipped, 0);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // The file is back at its exact original absolute path and the
    // ledger no longer knows about it, in memory or on disk.
    assert!(original.exists());
    assert_eq!(fs::read(&original).unwrap(), b"# Draft");
    assert!(ledger.is_empty());
    assert!(fx.ledger().is_empty());

    // A second undo is a clean no-op.
    let mut ledger = fx.ledger();
    assert!(matches!(
        undo_latest(&mut ledger).expect("undo"),
        UndoOutcome::NothingToUndo
    ));
}

#[tokio::test]
async fn per_file_errors_are_contained() {
    let fx = Fixture::new();
    fx.write("one.txt", b"one");
    fx.write("two.txt", b"two");

    // A plain file where the destination root should go makes every
    // category mkdir fail; each failure must be counted, not fatal.
    let blocker = fx.source().join("blocked");
    fs::write(&blocker, b"in the way").unwrap();

    let mut ledger = fx.ledger();
    let sorter = Sorter::new(
        &fx.rules,
        &fx.model,
        SortOptions {
            source: fx.source(),
            dest: Some(blocker.clone()),
            recursive: true,
            dry_run: false,
        },
    );
    let report = sorter.run(&mut ledger).await.expect("run completes");

    assert_eq!(report.stats.sorted, 0);
    assert!(report.stats.errors >= 2);
    assert!(fx.source().join("one.txt").exists());
    assert!(fx.source().join("two.txt").exists());
    assert!(ledger.is_empty());

    // Unblock and re-run: the same batch now sorts cleanly.
    fs::remove_file(&blocker).unwrap();
    let mut ledger = fx.ledger();
    let report = fx.run(&mut ledger, true, false).await;
    assert_eq!(report.stats.sorted, 2);
    assert_eq!(report.stats.errors, 0);
}
