//! File selection over the public tree.
//!
//! Each task declares include and exclude glob patterns; [`scan`] walks the
//! public root and returns every regular file that matches at least one
//! include pattern and no exclude pattern.
//!
//! Patterns are matched against the path relative to the root, always with
//! `/` separators, and `*` does not cross directory boundaries:
//!
//! ```text
//! public/
//! ├── index.html            "index.html"
//! ├── js/
//! │   ├── app.js            "js/app.js"        matches **/*.js
//! │   └── vendor.min.js     "js/vendor.min.js" excluded by **/*.min.js
//! └── .asset-press-cache.json                  never selected
//! ```
//!
//! Results are sorted by relative path so reports and the ledger are stable.

use crate::cache::LEDGER_FILENAME;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Public directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
    #[error("Failed to walk public directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Compiled include/exclude patterns for one task.
#[derive(Debug, Clone)]
pub struct Selector {
    include: GlobSet,
    exclude: GlobSet,
}

fn compile(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(glob(pattern)?);
    }
    builder.build()
}

fn glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

impl Selector {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Whether a `/`-separated relative path is selected.
    pub fn matches(&self, relative: &str) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

/// A file chosen by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the public root, `/`-separated.
    pub relative: String,
}

/// Path of `path` relative to `root`, with `/` separators on every platform.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

pub fn scan(root: &Path, selector: &Selector) -> Result<Vec<SelectedFile>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut selected = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };
        if relative == LEDGER_FILENAME || !selector.matches(&relative) {
            continue;
        }
        selected.push(SelectedFile {
            path: entry.into_path(),
            relative,
        });
    }

    selected.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{public_tree, write_file};

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    fn js_selector() -> Selector {
        Selector::new(&strings(&["**/*.js"]), &strings(&["**/*.min.js", "**/*-min.js"])).unwrap()
    }

    fn relatives(files: &[SelectedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn selector_applies_include_and_exclude() {
        let s = js_selector();
        assert!(s.matches("app.js"));
        assert!(s.matches("js/deep/app.js"));
        assert!(!s.matches("js/vendor.min.js"));
        assert!(!s.matches("js/vendor-min.js"));
        assert!(!s.matches("js/app.json"));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let s = Selector::new(&strings(&["*.html"]), &[]).unwrap();
        assert!(s.matches("index.html"));
        assert!(!s.matches("blog/index.html"));
    }

    #[test]
    fn invalid_glob_is_error() {
        let result = Selector::new(&strings(&["**/*.{js"]), &[]);
        assert!(matches!(result, Err(ScanError::Glob(_))));
    }

    #[test]
    fn scan_returns_sorted_relative_paths() {
        let tmp = public_tree(&[
            ("z.js", b"1".to_vec()),
            ("a/b.js", b"2".to_vec()),
            ("a/b.min.js", b"3".to_vec()),
            ("a/lib-min.js", b"4".to_vec()),
            ("index.html", b"5".to_vec()),
        ]);
        let files = scan(tmp.path(), &js_selector()).unwrap();
        assert_eq!(relatives(&files), vec!["a/b.js", "z.js"]);
        assert_eq!(files[0].path, tmp.path().join("a").join("b.js"));
    }

    #[test]
    fn scan_never_selects_ledger() {
        let tmp = public_tree(&[("app.js", b"1".to_vec())]);
        write_file(tmp.path(), LEDGER_FILENAME, b"{}");
        let everything = Selector::new(&strings(&["**/*", "**/.*"]), &[]).unwrap();
        let files = scan(tmp.path(), &everything).unwrap();
        assert_eq!(relatives(&files), vec!["app.js"]);
    }

    #[test]
    fn scan_missing_root_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = scan(&tmp.path().join("nope"), &js_selector());
        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/site/public");
        let path = root.join("img").join("photo.jpg");
        assert_eq!(relative_path(root, &path).as_deref(), Some("img/photo.jpg"));
        assert_eq!(relative_path(root, Path::new("/elsewhere/x")), None);
    }
}
