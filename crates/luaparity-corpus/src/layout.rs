//! Captured-output layout shared by the runner and the comparator
//!
//! Each execution of a fixture leaves three files under the results
//! directory, mirroring the fixture's relative path with the `.lua`
//! extension replaced by an interpreter tag:
//!
//! ```text
//! StringTests/Sub.lua  ->  StringTests/Sub.lua5.4.out   (stdout)
//!                          StringTests/Sub.lua5.4.err   (stderr)
//!                          StringTests/Sub.lua5.4.rc    (decimal exit code)
//! ```
//!
//! NovaSharp captures use the `nova` tag. Because the layout is keyed by
//! fixture path + tag, concurrent workers never write the same file, and
//! the comparator can run long after the interpreters did.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Exit-code sentinel meaning "this interpreter never ran the fixture"
pub const NOT_RUN: i32 = -1;

/// Identifies which interpreter produced a captured output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterTag {
    /// Reference interpreter at a specific version, e.g. `lua5.4`
    Lua { version: String },
    /// The NovaSharp CLI
    Nova,
}

impl InterpreterTag {
    /// Tag for the reference interpreter at the given version
    pub fn lua(version: impl Into<String>) -> Self {
        Self::Lua {
            version: version.into(),
        }
    }
}

impl fmt::Display for InterpreterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lua { version } => write!(f, "lua{}", version),
            Self::Nova => write!(f, "nova"),
        }
    }
}

/// Captured stdout/stderr/exit-code for one interpreter on one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionOutcome {
    /// Outcome for a fixture this interpreter never executed
    pub fn not_run() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: NOT_RUN,
        }
    }

    /// Whether the interpreter actually executed the fixture
    pub fn was_run(&self) -> bool {
        self.exit_code != NOT_RUN
    }
}

/// Path algebra for the results directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    results_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Results-dir path of the fixture with its `.lua` extension removed
    fn base(&self, rel_path: &str) -> PathBuf {
        let stem = rel_path.strip_suffix(".lua").unwrap_or(rel_path);
        self.results_dir.join(stem)
    }

    fn capture_path(&self, rel_path: &str, tag: &InterpreterTag, kind: &str) -> PathBuf {
        let base = self.base(rel_path);
        let name = base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        base.with_file_name(format!("{}.{}.{}", name, tag, kind))
    }

    pub fn stdout_path(&self, rel_path: &str, tag: &InterpreterTag) -> PathBuf {
        self.capture_path(rel_path, tag, "out")
    }

    pub fn stderr_path(&self, rel_path: &str, tag: &InterpreterTag) -> PathBuf {
        self.capture_path(rel_path, tag, "err")
    }

    pub fn rc_path(&self, rel_path: &str, tag: &InterpreterTag) -> PathBuf {
        self.capture_path(rel_path, tag, "rc")
    }

    /// Directory that must exist before a fixture's captures are written
    pub fn capture_dir(&self, rel_path: &str) -> PathBuf {
        self.base(rel_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.results_dir.clone())
    }

    /// Load a captured outcome.
    ///
    /// Missing files read as empty text; a missing or blank `.rc` file
    /// yields the [`NOT_RUN`] sentinel. Invalid UTF-8 is replaced rather
    /// than rejected since interpreter output is not under our control.
    pub fn load(&self, rel_path: &str, tag: &InterpreterTag) -> ExecutionOutcome {
        let stdout = read_or_empty(&self.stdout_path(rel_path, tag));
        let stderr = read_or_empty(&self.stderr_path(rel_path, tag));
        let rc_text = read_or_empty(&self.rc_path(rel_path, tag));
        let exit_code = rc_text.trim().parse().unwrap_or(NOT_RUN);

        ExecutionOutcome {
            stdout,
            stderr,
            exit_code,
        }
    }
}

fn read_or_empty(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_tag_rendering() {
        assert_eq!(InterpreterTag::lua("5.4").to_string(), "lua5.4");
        assert_eq!(InterpreterTag::Nova.to_string(), "nova");
    }

    #[test]
    fn test_capture_paths_mirror_fixture_tree() {
        let layout = OutputLayout::new("/results");
        let tag = InterpreterTag::lua("5.1");

        assert_eq!(
            layout.stdout_path("TableTests/Insert.lua", &tag),
            PathBuf::from("/results/TableTests/Insert.lua5.1.out")
        );
        assert_eq!(
            layout.stderr_path("TableTests/Insert.lua", &tag),
            PathBuf::from("/results/TableTests/Insert.lua5.1.err")
        );
        assert_eq!(
            layout.rc_path("TableTests/Insert.lua", &InterpreterTag::Nova),
            PathBuf::from("/results/TableTests/Insert.nova.rc")
        );
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let tag = InterpreterTag::Nova;

        std::fs::write(layout.stdout_path("a.lua", &tag), "hello\n").unwrap();
        std::fs::write(layout.stderr_path("a.lua", &tag), "").unwrap();
        std::fs::write(layout.rc_path("a.lua", &tag), "0").unwrap();

        let outcome = layout.load("a.lua", &tag);
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.was_run());
    }

    #[test]
    fn test_load_missing_files_is_not_run() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        let outcome = layout.load("missing.lua", &InterpreterTag::lua("5.4"));
        assert_eq!(outcome, ExecutionOutcome::not_run());
        assert!(!outcome.was_run());
    }

    #[test]
    fn test_load_blank_rc_is_not_run() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let tag = InterpreterTag::lua("5.4");

        std::fs::write(layout.stdout_path("b.lua", &tag), "out").unwrap();
        std::fs::write(layout.rc_path("b.lua", &tag), "  \n").unwrap();

        let outcome = layout.load("b.lua", &tag);
        assert_eq!(outcome.exit_code, NOT_RUN);
        assert!(!outcome.was_run());
    }

    #[test]
    fn test_negative_exit_code_parses() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let tag = InterpreterTag::Nova;

        std::fs::write(layout.rc_path("c.lua", &tag), "-1").unwrap();
        let outcome = layout.load("c.lua", &tag);
        assert_eq!(outcome.exit_code, -1);
        assert!(!outcome.was_run());
    }
}
