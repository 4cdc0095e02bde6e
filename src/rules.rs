// SPDX-License-Identifier: MIT

//! Category rule set: the closed vocabulary of sorting categories
//!
//! Categories are ordered. The order is the insertion order of the loaded
//! JSON document (built-in defaults otherwise) and doubles as the
//! tie-break order for the deterministic classifier, so it must survive a
//! load/store round trip — hence the hand-written map deserializer.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::home_file;
use crate::{Result, TaxisError};

/// One category and the lowercase extensions (no leading dot) it claims.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Ordered set of category rules, loaded once per run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    categories: Vec<CategoryRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        let defaults: &[(&str, &[&str])] = &[
            ("Images", &["jpg", "jpeg", "png", "gif", "webp", "tiff", "bmp", "svg"]),
            ("Videos", &["mp4", "mkv", "mov", "avi", "webm", "flv"]),
            ("Audio", &["mp3", "wav", "flac", "aac", "ogg", "m4a"]),
            ("Docs", &["pdf", "doc", "docx", "txt", "md", "odt", "rtf"]),
            (
                "Code",
                &[
                    "py", "js", "java", "c", "cpp", "rs", "go", "rb", "sh", "html", "css",
                    "json", "yml", "yaml", "ts",
                ],
            ),
            ("Archives", &["zip", "tar", "gz", "bz2", "7z", "rar"]),
            ("Misc", &[]),
        ];

        Self {
            categories: defaults
                .iter()
                .map(|(name, exts)| CategoryRule {
                    name: (*name).to_string(),
                    extensions: exts.iter().map(|e| (*e).to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl RuleSet {
    /// Load rules from a JSON document (`{category: [extensions...]}`),
    /// falling back to the built-in defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let rules: Self = serde_json::from_str(&content)
                .map_err(|e| TaxisError::Config(format!("Failed to parse rules: {}", e)))?;
            if rules.is_empty() {
                return Err(TaxisError::Config(format!(
                    "Rules file {:?} defines no categories",
                    path
                )));
            }
            Ok(rules)
        } else {
            tracing::debug!("Rules file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Categories in tie-break order.
    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    /// Category names in tie-break order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Validate a label from the remote classifier against the vocabulary.
    /// Unknown labels are rejected, never added.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.name == label)
            .map(|c| c.name.as_str())
    }

    /// Whether `ext` belongs to the named category's extension set.
    pub fn category_claims(&self, name: &str, ext: &str) -> bool {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Default location of the rules file (`~/.taxis_rules.json`).
pub fn default_rules_path() -> Result<PathBuf> {
    home_file(".taxis_rules.json")
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category names to extension lists")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RuleSet, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut categories = Vec::new();
                while let Some((name, extensions)) = map.next_entry::<String, Vec<String>>()? {
                    categories.push(CategoryRule {
                        name,
                        extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
                    });
                }
                Ok(RuleSet { categories })
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}
