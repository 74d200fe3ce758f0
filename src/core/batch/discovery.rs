//! Input file discovery
//!
//! Expands a file name pattern below a directory (optionally recursively) and returns the
//! matching files in sorted order so dispatch order is the same on every run. A file reached
//! through several paths, for example through a symlinked directory, is returned once.

use crate::domain::{Result, SplError};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Find input files below `dir`
///
/// `pattern` is a glob matched against file names (`*.xml`, `spl-??.xml`, `label.xml`),
/// case-insensitively. Hidden entries (names starting with `.`) are ignored.
///
/// # Arguments
///
/// * `dir` - Directory to scan
/// * `pattern` - File name glob
/// * `recursive` - Descend into subdirectories
///
/// # Errors
///
/// Returns an error if `dir` is not a directory or `pattern` is not a valid glob.
/// Unreadable entries below `dir` are logged and skipped.
pub fn discover(dir: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SplError::Io(format!(
            "Input directory not found: {}",
            dir.display()
        )));
    }

    let pattern = pattern.trim();
    Pattern::new(pattern).map_err(|e| {
        SplError::Configuration(format!("Invalid file pattern '{pattern}': {e}"))
    })?;

    let root = Pattern::escape(&dir.to_string_lossy());
    let full = if recursive {
        format!("{root}/**/{pattern}")
    } else {
        format!("{root}/{pattern}")
    };
    let entries = glob::glob_with(&full, MATCH_OPTIONS)
        .map_err(|e| SplError::Configuration(format!("Invalid file pattern '{full}': {e}")))?;

    let mut matched = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && !is_hidden(dir, &path) => matched.push(path),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %e.path().display(), error = %e.error(), "Skipping unreadable entry");
            }
        }
    }

    let found = dedup_canonical(matched);
    tracing::debug!(dir = %dir.display(), pattern, files = found.len(), "Discovered input files");
    Ok(found)
}

fn is_hidden(dir: &Path, path: &Path) -> bool {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

/// Keeps the shortest path to each distinct file, then sorts
fn dedup_canonical(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by(|a, b| {
        a.components()
            .count()
            .cmp(&b.components().count())
            .then_with(|| a.cmp(b))
    });

    let mut seen = HashSet::new();
    let mut kept: Vec<PathBuf> = paths
        .into_iter()
        .filter(|path| seen.insert(fs::canonicalize(path).unwrap_or_else(|_| path.clone())))
        .collect();
    kept.sort();
    kept
}

/// Normalizes an explicit file list: sorted, duplicates removed
pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = paths.into_iter().collect();
    paths.sort();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"<document/>").unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<&str> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect()
    }

    #[test_case("label.xml", "*.xml", true ; "extension")]
    #[test_case("LABEL.XML", "*.xml", true ; "extension case-insensitive")]
    #[test_case("label.txt", "*.xml", false ; "other extension")]
    #[test_case("anything", "*", true ; "wildcard")]
    #[test_case("spl.xml", "spl.xml", true ; "literal")]
    #[test_case("other.xml", "spl.xml", false ; "literal mismatch")]
    #[test_case("spl-01.xml", "spl-??.xml", true ; "single character wildcards")]
    #[test_case(".hidden.xml", "*.xml", false ; "hidden")]
    fn test_pattern_matches_file_name(name: &str, pattern: &str, expected: bool) {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join(name));
        let found = discover(dir.path(), pattern, false).unwrap();
        assert_eq!(found.len(), usize::from(expected), "{name} against {pattern}");
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.xml"));
        touch(&dir.path().join("a.xml"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join(".hidden.xml"));
        touch(&dir.path().join(".cache").join("d.xml"));
        touch(&dir.path().join("nested").join("c.xml"));

        let flat = discover(dir.path(), "*.xml", false).unwrap();
        assert_eq!(names(&flat), vec!["a.xml", "b.xml"]);

        let deep = discover(dir.path(), "*.xml", true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = discover(&dir.path().join("missing"), "*.xml", true).unwrap_err();
        assert!(matches!(err, SplError::Io(_)));
    }

    #[test]
    fn test_discover_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = discover(dir.path(), "[.xml", false).unwrap_err();
        assert!(matches!(err, SplError::Configuration(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_yields_each_file_once() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.xml"));
        touch(&dir.path().join("nested").join("b.xml"));
        std::os::unix::fs::symlink(dir.path(), dir.path().join("nested").join("loop")).unwrap();

        let found = discover(dir.path(), "*.xml", true).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], dir.path().join("a.xml"));
        assert_eq!(found[1], dir.path().join("nested").join("b.xml"));
    }

    #[test]
    fn test_from_paths_dedups() {
        let paths = from_paths(vec![
            PathBuf::from("b.xml"),
            PathBuf::from("a.xml"),
            PathBuf::from("b.xml"),
        ]);
        assert_eq!(paths, vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]);
    }
}
