// SPDX-License-Identifier: MIT

//! Filename sanitizing and collision-safe placement
//!
//! Everything here is pure path computation; the caller performs the
//! actual move.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Base name used when sanitizing leaves nothing behind.
pub const FALLBACK_BASE: &str = "file";

const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace filesystem-hostile characters with underscores and trim
/// surrounding whitespace. Total and deterministic; whitespace-only
/// input yields an empty string.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Build the timestamped destination base for a file: the sanitized stem
/// (or [`FALLBACK_BASE`]) followed by `_YYYYMMDDHHMMSS`. The stamp keeps
/// repeated runs from colliding on popular names.
pub fn destination_base(stem: &str, now: DateTime<Local>) -> String {
    let clean = sanitize(stem);
    let stamp = now.format("%Y%m%d%H%M%S");
    if clean.is_empty() {
        format!("{}_{}", FALLBACK_BASE, stamp)
    } else {
        format!("{}_{}", clean, stamp)
    }
}

/// Find a non-colliding path for `base` (+ optional extension) inside
/// `target_dir`, appending `_1`, `_2`, ... until a free name is found.
/// The returned path does not exist at call time.
pub fn place(target_dir: &Path, base: &str, extension: &str) -> PathBuf {
    let file_name = |b: &str| {
        if extension.is_empty() {
            b.to_string()
        } else {
            format!("{}.{}", b, extension)
        }
    };

    let mut candidate = target_dir.join(file_name(base));
    let mut counter = 1u64;
    while candidate.exists() {
        candidate = target_dir.join(file_name(&format!("{}_{}", base, counter)));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize("a/b:c"), "a_b_c");
        assert_eq!(sanitize(r#"x<y>z|w?v*u"t\s"#), "x_y_z_w_v_u_t_s");
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize("  x  "), "x");
        assert_eq!(sanitize("   "), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn destination_base_appends_stamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 5).unwrap();
        assert_eq!(destination_base("notes", now), "notes_20240301093005");
        assert_eq!(destination_base("  ", now), "file_20240301093005");
    }

    #[test]
    fn place_returns_free_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = place(dir.path(), "report_20240301093005", "txt");
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "report_20240301093005.txt"
        );
        assert!(!first.exists());
    }

    #[test]
    fn place_suffixes_counter_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let base = "report_20240301093005";

        let first = place(dir.path(), base, "txt");
        std::fs::write(&first, b"one").unwrap();

        let second = place(dir.path(), base, "txt");
        assert_ne!(first, second);
        assert!(second.to_str().unwrap().ends_with("_1.txt"));
        std::fs::write(&second, b"two").unwrap();

        let third = place(dir.path(), base, "txt");
        assert!(third.to_str().unwrap().ends_with("_2.txt"));
    }

    #[test]
    fn place_handles_missing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = place(dir.path(), "readme_20240301093005", "");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "readme_20240301093005"
        );
    }
}
