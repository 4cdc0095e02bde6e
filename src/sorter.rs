// SPDX-License-Identifier: MIT

//! Sort orchestrator: walk, classify, rename, place, move, log
//!
//! One file is fully processed before the next begins; the only await
//! points are the bounded remote-model calls. A failure on one file is
//! counted and logged, never fatal to the batch. The ledger is loaded by
//! the caller, mutated here, and persisted once per run.

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::classify::{classify, FileTask, CONFIDENCE_THRESHOLD};
use crate::history::{HistoryEntry, Ledger};
use crate::media::probe_audio;
use crate::model::ModelClient;
use crate::naming;
use crate::rules::RuleSet;
use crate::{Result, TaxisError};

/// Basename fragments that mark OS metadata droppings.
const JUNK_NAMES: [&str; 3] = ["thumbs.db", "desktop.ini", ".ds_store"];
/// Extensions of disposable files: temp files, partial downloads, logs.
const JUNK_EXTENSIONS: [&str; 4] = ["tmp", "part", "crdownload", "log"];

/// Bytes of file content offered to the remote classifier as an excerpt.
const EXCERPT_LIMIT: usize = 4_000;

/// Options for one sorting run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub source: PathBuf,
    /// Destination root; `source/sorted` when unset.
    pub dest: Option<PathBuf>,
    pub recursive: bool,
    pub dry_run: bool,
}

/// One row of the dry-run preview.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub name: String,
    pub category: String,
    /// Intended destination directory, relative to source when possible.
    pub destination: PathBuf,
}

/// Counters for one run; discarded after the summary.
#[derive(Debug, Default)]
pub struct RunStats {
    pub sorted: u64,
    pub skipped: u64,
    pub errors: u64,
    pub ai_renamed: u64,
    pub total_bytes: u64,
    pub by_category: BTreeMap<String, u64>,
}

impl RunStats {
    fn record(&mut self, category: &str, ai_renamed: bool, size: u64) {
        self.sorted += 1;
        self.total_bytes += size;
        *self.by_category.entry(category.to_string()).or_insert(0) += 1;
        if ai_renamed {
            self.ai_renamed += 1;
        }
    }
}

/// Everything a run produced: counters, the dry-run preview (empty in
/// live mode) and the resolved destination root.
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStats,
    pub preview: Vec<PlannedMove>,
    pub dest: PathBuf,
    pub dry_run: bool,
}

struct SortedFile {
    category: String,
    ai_renamed: bool,
}

/// The sorting engine. Rules and model client are threaded in by the
/// caller; nothing here is process-global.
pub struct Sorter<'a> {
    rules: &'a RuleSet,
    model: &'a ModelClient,
    options: SortOptions,
}

impl<'a> Sorter<'a> {
    pub fn new(rules: &'a RuleSet, model: &'a ModelClient, options: SortOptions) -> Self {
        Self { rules, model, options }
    }

    /// Run the whole batch. Dry runs classify (including remote
    /// escalation) but never touch the filesystem or the ledger.
    pub async fn run(&self, ledger: &mut Ledger) -> Result<RunReport> {
        let source = fs::canonicalize(&self.options.source).map_err(|_| {
            TaxisError::Config(format!(
                "Source directory does not exist: {:?}",
                self.options.source
            ))
        })?;

        let dest = self.resolve_dest(&source)?;
        let tasks = self.enumerate(&source, &dest)?;

        let mut report = RunReport {
            stats: RunStats::default(),
            preview: Vec::new(),
            dest: dest.clone(),
            dry_run: self.options.dry_run,
        };

        if tasks.is_empty() {
            debug!("No files to sort under {:?}", source);
            return Ok(report);
        }

        if self.options.dry_run {
            self.preview(&source, &dest, tasks, &mut report).await;
            return Ok(report);
        }

        let bar = ProgressBar::new(tasks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:32.cyan/blue} {pos}/{len} {wide_msg}",
            )
            .expect("valid progress template"),
        );

        for task in tasks {
            bar.set_message(display_name(&task.path));

            if is_junk(&task.path) {
                report.stats.skipped += 1;
                bar.inc(1);
                continue;
            }

            match self.sort_one(&task, &dest, ledger).await {
                Ok(sorted) => {
                    report
                        .stats
                        .record(&sorted.category, sorted.ai_renamed, task.size);
                }
                Err(e) => {
                    warn!("Failed to sort {:?}: {}", task.path, e);
                    report.stats.errors += 1;
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        ledger.save()?;

        if self.options.recursive {
            cleanup_empty_dirs(&source, &dest);
        }

        Ok(report)
    }

    fn resolve_dest(&self, source: &Path) -> Result<PathBuf> {
        match &self.options.dest {
            Some(dest) if dest.is_absolute() => Ok(dest.clone()),
            Some(dest) => Ok(std::env::current_dir()?.join(dest)),
            None => Ok(source.join("sorted")),
        }
    }

    /// Enumerate candidate files. The destination directory and every
    /// descendant of it are excluded so repeated runs never consume
    /// their own output.
    fn enumerate(&self, source: &Path, dest: &Path) -> Result<Vec<FileTask>> {
        let mut tasks = Vec::new();

        if self.options.recursive {
            let walker = WalkDir::new(source)
                .min_depth(1)
                .into_iter()
                .filter_entry(|e| !e.path().starts_with(dest));
            for entry in walker.filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    tasks.push(FileTask::new(entry.into_path(), size));
                }
            }
        } else {
            for entry in fs::read_dir(source)?.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_file() {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    tasks.push(FileTask::new(path, size));
                }
            }
        }

        Ok(tasks)
    }

    /// Dry run: classification still happens (including the remote
    /// fallback) so the preview is accurate, but nothing is created,
    /// moved, or logged.
    async fn preview(
        &self,
        source: &Path,
        dest: &Path,
        tasks: Vec<FileTask>,
        report: &mut RunReport,
    ) {
        for task in tasks {
            if is_junk(&task.path) {
                report.stats.skipped += 1;
                continue;
            }

            let category = self.decide_category(&task).await;
            let target_dir = dest.join(&category);
            let destination = target_dir
                .strip_prefix(source)
                .map(Path::to_path_buf)
                .unwrap_or(target_dir);

            report.stats.record(&category, false, task.size);
            report.preview.push(PlannedMove {
                name: display_name(&task.path),
                category,
                destination,
            });
        }
    }

    /// Deterministic category, escalated to the remote classifier when
    /// the winning score is below the confidence threshold. Unrecognized
    /// remote labels keep the deterministic winner.
    async fn decide_category(&self, task: &FileTask) -> String {
        let (category, scores) = classify(task, self.rules);
        if scores.get(&category) >= CONFIDENCE_THRESHOLD {
            return category;
        }

        let excerpt = read_excerpt(&task.path);
        match self.model.classify(task, excerpt.as_deref(), self.rules).await {
            Ok(label) => match self.rules.resolve(&label) {
                Some(name) => name.to_string(),
                None => {
                    debug!(
                        "Remote label {:?} not in rule set for {:?}, keeping {:?}",
                        label, task.path, category
                    );
                    category
                }
            },
            Err(reason) => {
                debug!("No remote category for {:?}: {}", task.path, reason);
                category
            }
        }
    }

    /// Model rename, gated by category. Any failure means "no
    /// suggestion" and the caller falls back to the original stem.
    async fn suggest_name(&self, task: &FileTask, category: &str) -> Option<String> {
        let attempt = match category {
            "Images" if self.rules.category_claims("Images", &task.extension) => {
                self.model.suggest_image_name(task).await
            }
            "Audio" if self.rules.category_claims("Audio", &task.extension) => {
                match probe_audio(&task.path) {
                    Some(props) => self.model.suggest_audio_name(task, &props).await,
                    None => {
                        debug!("Audio probe failed for {:?}, no rename", task.path);
                        return None;
                    }
                }
            }
            "Docs" | "Code" => self.model.suggest_text_name(task).await,
            _ => return None,
        };

        match attempt {
            Ok(name) => Some(name),
            Err(reason) => {
                debug!("No model rename for {:?}: {}", task.path, reason);
                None
            }
        }
    }

    async fn sort_one(
        &self,
        task: &FileTask,
        dest: &Path,
        ledger: &mut Ledger,
    ) -> Result<SortedFile> {
        let category = self.decide_category(task).await;
        let suggestion = self.suggest_name(task, &category).await;
        let ai_renamed = suggestion.is_some();

        let target_dir = dest.join(&category);
        fs::create_dir_all(&target_dir)?;

        let stem = match &suggestion {
            Some(name) => name.clone(),
            None => task
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(naming::FALLBACK_BASE)
                .to_string(),
        };

        let now = Local::now();
        let extension = task
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let base = naming::destination_base(&stem, now);
        let final_path = naming::place(&target_dir, &base, extension);

        move_file(&task.path, &final_path)?;
        debug!("Moved {:?} -> {:?}", task.path, final_path);

        ledger.insert(
            &final_path,
            HistoryEntry {
                original: task.path.clone(),
                category: category.clone(),
                timestamp: now.to_rfc3339(),
                ai_renamed,
            },
        );

        Ok(SortedFile { category, ai_renamed })
    }
}

/// Junk files are never moved, scored, or logged.
pub fn is_junk(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_lowercase(),
        None => return false,
    };
    if JUNK_NAMES.iter().any(|j| name.contains(j)) {
        return true;
    }
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e)
        .unwrap_or_default();
    JUNK_EXTENSIONS.iter().any(|j| *j == ext)
}

/// Move a file, falling back to copy-and-delete for cross-device moves.
pub(crate) fn move_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
    }
}

/// Remove now-empty directories under source, bottom-up so emptied
/// parents are reconsidered. Source itself and the destination subtree
/// are left alone.
fn cleanup_empty_dirs(source: &Path, dest: &Path) {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok());

    for entry in walker {
        let path = entry.path();
        if !entry.file_type().is_dir() || path.starts_with(dest) {
            continue;
        }
        if fs::remove_dir(path).is_ok() {
            debug!("Removed empty directory: {:?}", path);
        }
    }
}

/// Lossless-enough display form of a file name for progress and preview.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Bounded UTF-8 excerpt of a file for the remote classifier; `None`
/// when the file cannot be read or decodes to nothing.
fn read_excerpt(path: &Path) -> Option<String> {
    use std::io::Read;

    let file = fs::File::open(path).ok()?;
    let mut buffer = Vec::with_capacity(EXCERPT_LIMIT);
    file.take(EXCERPT_LIMIT as u64)
        .read_to_end(&mut buffer)
        .ok()?;

    let text = String::from_utf8_lossy(&buffer);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
