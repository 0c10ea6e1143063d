//! Corpus discovery - find fixture files under a corpus tree
//!
//! Fixture identity is the path relative to the corpus root, with `/`
//! separators on every platform so report keys and allowlist entries are
//! portable. Results are sorted for deterministic processing order.

use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{CorpusError, CorpusResult};
use crate::layout::InterpreterTag;

/// Find all `.lua` fixtures under a corpus directory.
///
/// Returns relative paths sorted lexicographically.
pub fn find_fixture_rel_paths(corpus_dir: &Path) -> CorpusResult<Vec<String>> {
    if !corpus_dir.is_dir() {
        return Err(CorpusError::dir_not_found(corpus_dir));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(corpus_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension() == Some(OsStr::new("lua")) {
            let rel = path.strip_prefix(corpus_dir).unwrap_or(path);
            files.push(rel_path_string(rel));
        }
    }

    files.sort();
    Ok(files)
}

/// Reconstruct the fixture list from captured `.out` files.
///
/// Used when the corpus directory is no longer present: every
/// `<stem>.<tag>.out` under the results directory maps back to the
/// `<stem>.lua` fixture that produced it.
pub fn find_captured_rel_paths(
    results_dir: &Path,
    tag: &InterpreterTag,
) -> CorpusResult<Vec<String>> {
    if !results_dir.is_dir() {
        return Err(CorpusError::dir_not_found(results_dir));
    }

    let suffix = format!(".{}.out", tag);
    let mut files = Vec::new();
    for entry in WalkDir::new(results_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(results_dir).unwrap_or(entry.path());
        let rel = rel_path_string(rel);
        if let Some(stem) = rel.strip_suffix(&suffix) {
            files.push(format!("{}.lua", stem));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Render a relative path with `/` separators regardless of platform
fn rel_path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_fixtures_sorted_and_relative() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("TableTests")).unwrap();
        fs::create_dir_all(dir.path().join("MathTests")).unwrap();
        fs::write(dir.path().join("TableTests/Insert.lua"), "print(1)\n").unwrap();
        fs::write(dir.path().join("MathTests/Floor.lua"), "print(2)\n").unwrap();
        fs::write(dir.path().join("MathTests/notes.txt"), "not a fixture").unwrap();

        let files = find_fixture_rel_paths(dir.path()).unwrap();
        assert_eq!(files, vec!["MathTests/Floor.lua", "TableTests/Insert.lua"]);
    }

    #[test]
    fn test_find_fixtures_missing_dir_errors() {
        let err = find_fixture_rel_paths(Path::new("/nonexistent/corpus")).unwrap_err();
        assert!(matches!(err, CorpusError::DirNotFound { .. }));
    }

    #[test]
    fn test_captured_fallback_maps_out_files_to_fixtures() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("StringTests")).unwrap();
        fs::write(dir.path().join("StringTests/Sub.lua5.4.out"), "a").unwrap();
        fs::write(dir.path().join("StringTests/Sub.lua5.4.err"), "").unwrap();
        fs::write(dir.path().join("StringTests/Sub.nova.out"), "a").unwrap();
        fs::write(dir.path().join("StringTests/Rep.lua5.4.out"), "b").unwrap();

        let tag = InterpreterTag::lua("5.4");
        let files = find_captured_rel_paths(dir.path(), &tag).unwrap();
        assert_eq!(
            files,
            vec!["StringTests/Rep.lua", "StringTests/Sub.lua"]
        );
    }
}
