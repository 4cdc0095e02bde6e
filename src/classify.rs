// SPDX-License-Identifier: MIT

//! Deterministic classification: extension scoring plus filename and
//! size heuristics. No network, no failure modes.

use std::path::PathBuf;

use crate::rules::RuleSet;

/// Score added per matching extension.
const EXTENSION_SCORE: i64 = 10;
/// Winner scores below this mean "no confident match"; the orchestrator
/// escalates those files to the remote classifier.
pub const CONFIDENCE_THRESHOLD: i64 = 10;

/// Large files lean towards Videos above this size.
const LARGE_FILE_BYTES: u64 = 50_000_000;

const IMAGE_KEYWORDS: [&str; 4] = ["screenshot", "screen", "img", "photo"];
const DOC_KEYWORDS: [&str; 3] = ["invoice", "bill", "receipt"];

/// One candidate file discovered during enumeration.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    /// Lowercase extension: the substring after the last dot, empty if none.
    pub extension: String,
    pub size: u64,
}

impl FileTask {
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        Self { path, extension, size }
    }

    /// Lowercase basename, used by the heuristic keyword boosts.
    pub fn name_lower(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Per-category scores in rule-set order. Every known category appears,
/// even at zero, so the maximum is always taken over the full set.
#[derive(Debug, Clone)]
pub struct ScoreVector {
    scores: Vec<(String, i64)>,
}

impl ScoreVector {
    fn zeroed(rules: &RuleSet) -> Self {
        Self {
            scores: rules.names().map(|n| (n.to_string(), 0)).collect(),
        }
    }

    fn add(&mut self, category: &str, amount: i64) {
        if let Some(entry) = self.scores.iter_mut().find(|(n, _)| n == category) {
            entry.1 += amount;
        }
    }

    pub fn get(&self, category: &str) -> i64 {
        self.scores
            .iter()
            .find(|(n, _)| n == category)
            .map(|(_, s)| *s)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.scores.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// First maximum in rule-set order.
    fn winner(&self) -> Option<&str> {
        let mut best: Option<(&str, i64)> = None;
        for (name, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((name, score)),
            }
        }
        best.map(|(name, _)| name)
    }
}

/// Score a file against the rule set and pick the winning category.
///
/// Never fails: the default rule set carries the zero-score catch-all
/// `Misc`, so a winner always exists. Ties go to the category listed
/// first in the rule set.
pub fn classify(task: &FileTask, rules: &RuleSet) -> (String, ScoreVector) {
    let mut scores = ScoreVector::zeroed(rules);
    let name = task.name_lower();

    if !task.extension.is_empty() {
        for category in rules.categories() {
            if category.extensions.iter().any(|e| *e == task.extension) {
                scores.add(&category.name, EXTENSION_SCORE);
            }
        }
    }

    if rules.contains("Images") && IMAGE_KEYWORDS.iter().any(|k| name.contains(k)) {
        scores.add("Images", 4);
    }
    if rules.contains("Docs") && DOC_KEYWORDS.iter().any(|k| name.contains(k)) {
        scores.add("Docs", 5);
    }
    if rules.contains("Videos") && task.size > LARGE_FILE_BYTES {
        scores.add("Videos", 4);
    }

    let winner = scores
        .winner()
        .unwrap_or("Misc")
        .to_string();
    (winner, scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, size: u64) -> FileTask {
        FileTask::new(PathBuf::from(format!("/tmp/{}", name)), size)
    }

    #[test]
    fn extension_is_lowercased_after_last_dot() {
        assert_eq!(task("photo.PNG", 0).extension, "png");
        assert_eq!(task("archive.tar.gz", 0).extension, "gz");
        assert_eq!(task("noext", 0).extension, "");
    }

    #[test]
    fn photo_png_scores_extension_plus_keyword() {
        let rules: RuleSet = serde_json::from_str(r#"{"Images": ["png"], "Misc": []}"#).unwrap();
        let (winner, scores) = classify(&task("photo.png", 100), &rules);
        assert_eq!(winner, "Images");
        assert!(scores.get("Images") >= 14);
    }

    #[test]
    fn every_category_appears_in_scores() {
        let rules = RuleSet::default();
        let (_, scores) = classify(&task("mystery.xyz", 1), &rules);
        let scored: Vec<&str> = scores.iter().map(|(n, _)| n).collect();
        let expected: Vec<&str> = rules.names().collect();
        assert_eq!(scored, expected);
        assert!(scores.iter().all(|(_, s)| s >= 0));
    }

    #[test]
    fn unknown_extension_falls_through_to_first_category() {
        // All-zero vector: the tie goes to the first category in order.
        let rules: RuleSet =
            serde_json::from_str(r#"{"Misc": [], "Docs": ["pdf"]}"#).unwrap();
        let (winner, scores) = classify(&task("mystery.xyz", 1), &rules);
        assert_eq!(winner, "Misc");
        assert_eq!(scores.get("Misc"), 0);
    }

    #[test]
    fn ties_break_by_rule_order() {
        let rules: RuleSet =
            serde_json::from_str(r#"{"A": ["dat"], "B": ["dat"], "Misc": []}"#).unwrap();
        let (winner, scores) = classify(&task("blob.dat", 1), &rules);
        assert_eq!(scores.get("A"), scores.get("B"));
        assert_eq!(winner, "A");
    }

    #[test]
    fn large_files_lean_towards_videos() {
        let rules = RuleSet::default();
        let (winner, scores) = classify(&task("dump.bin", 60_000_000), &rules);
        assert_eq!(winner, "Videos");
        assert_eq!(scores.get("Videos"), 4);
    }

    #[test]
    fn invoice_keyword_boosts_docs() {
        let rules = RuleSet::default();
        let (winner, scores) = classify(&task("invoice_march", 10), &rules);
        assert_eq!(winner, "Docs");
        assert_eq!(scores.get("Docs"), 5);
    }

    #[test]
    fn keyword_boosts_skip_absent_categories() {
        let rules: RuleSet = serde_json::from_str(r#"{"Misc": []}"#).unwrap();
        let (winner, scores) = classify(&task("photo.png", 100), &rules);
        assert_eq!(winner, "Misc");
        assert_eq!(scores.get("Misc"), 0);
    }

    #[test]
    fn winner_below_threshold_signals_low_confidence() {
        let rules = RuleSet::default();
        let (winner, scores) = classify(&task("mystery.xyz", 1), &rules);
        assert!(scores.get(&winner) < CONFIDENCE_THRESHOLD);
    }
}
