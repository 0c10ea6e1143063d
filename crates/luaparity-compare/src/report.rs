//! Aggregate comparison report.
//!
//! [`Report::build`] folds a slice of classified comparisons into the
//! summary tally, the effective match rate, and the capped detail
//! lists that end up in `comparison.json`.

use crate::classify::{Comparison, Status};
use crate::error::{CompareError, CompareResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Most mismatch entries kept in the report.
const MISMATCH_LIMIT: usize = 100;
/// Most both-error entries kept in the report.
const BOTH_ERROR_LIMIT: usize = 50;
/// Longest error excerpt stored per interpreter, in characters.
const ERROR_EXCERPT_LIMIT: usize = 500;

/// Per-status counts over one comparison run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Tally {
    #[serde(rename = "match")]
    pub matched: usize,
    pub mismatch: usize,
    pub known_divergence: usize,
    pub both_error: usize,
    pub lua_only: usize,
    pub nova_only: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Match => self.matched += 1,
            Status::Mismatch => self.mismatch += 1,
            Status::KnownDivergence => self.known_divergence += 1,
            Status::BothError => self.both_error += 1,
            Status::LuaOnly => self.lua_only += 1,
            Status::NovaOnly => self.nova_only += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.matched
            + self.mismatch
            + self.known_divergence
            + self.both_error
            + self.lua_only
            + self.nova_only
            + self.skipped
    }

    /// Fixtures where both interpreters ran to a comparable verdict.
    pub fn comparable(&self) -> usize {
        self.matched + self.mismatch + self.both_error + self.known_divergence
    }

    /// Matches plus documented divergences.
    pub fn effective_matches(&self) -> usize {
        self.matched + self.known_divergence
    }

    /// Effective match rate as a percentage, `None` when nothing was
    /// comparable.
    pub fn match_rate(&self) -> Option<f64> {
        let comparable = self.comparable();
        if comparable == 0 {
            return None;
        }
        let rate = self.effective_matches() as f64 / comparable as f64 * 100.0;
        Some((rate * 10.0).round() / 10.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MismatchEntry {
    pub file: String,
    pub diff_summary: String,
    pub lua_rc: i32,
    pub nova_rc: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BothErrorEntry {
    pub file: String,
    pub lua_error: String,
    pub nova_error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DivergenceEntry {
    pub file: String,
    pub diff_summary: String,
}

/// The persisted shape of `comparison.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub lua_version: String,
    pub strict_mode: bool,
    pub enforce_mode: bool,
    pub summary: Tally,
    pub match_rate: Option<f64>,
    pub mismatches: Vec<MismatchEntry>,
    pub both_errors: Vec<BothErrorEntry>,
    pub known_divergences: Vec<DivergenceEntry>,
}

impl Report {
    /// Fold classified comparisons into the report. The detail lists
    /// preserve the input order, so callers should pass comparisons
    /// sorted by fixture path.
    pub fn build(
        comparisons: &[Comparison],
        lua_version: &str,
        strict_mode: bool,
        enforce_mode: bool,
    ) -> Self {
        let mut summary = Tally::default();
        for comparison in comparisons {
            summary.record(comparison.status);
        }

        let mismatches = comparisons
            .iter()
            .filter(|c| c.status == Status::Mismatch)
            .take(MISMATCH_LIMIT)
            .map(|c| MismatchEntry {
                file: c.file.clone(),
                diff_summary: c.diff_summary.clone(),
                lua_rc: c.lua_rc,
                nova_rc: c.nova_rc,
            })
            .collect();

        let both_errors = comparisons
            .iter()
            .filter(|c| c.status == Status::BothError)
            .take(BOTH_ERROR_LIMIT)
            .map(|c| BothErrorEntry {
                file: c.file.clone(),
                lua_error: excerpt(&c.lua_error),
                nova_error: excerpt(&c.nova_error),
            })
            .collect();

        let known_divergences = comparisons
            .iter()
            .filter(|c| c.status == Status::KnownDivergence)
            .map(|c| DivergenceEntry {
                file: c.file.clone(),
                diff_summary: c.diff_summary.clone(),
            })
            .collect();

        let match_rate = summary.match_rate();
        Report {
            lua_version: lua_version.to_string(),
            strict_mode,
            enforce_mode,
            summary,
            match_rate,
            mismatches,
            both_errors,
            known_divergences,
        }
    }

    /// Write the report as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn write_json(&self, path: &Path) -> CompareResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CompareError::io(parent, e))?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| CompareError::report(path, e))?;
        fs::write(path, json).map_err(|e| CompareError::io(path, e))?;
        Ok(())
    }
}

fn excerpt(output: &str) -> String {
    output.chars().take(ERROR_EXCERPT_LIMIT).collect()
}

/// How the process exit code reacts to mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitMode {
    /// Report mismatches but always exit zero.
    #[default]
    Warn,
    /// Exit nonzero when any unexpected mismatch remains.
    Enforce,
    /// Data collection only; always exit zero.
    Monitor,
}

impl ExitMode {
    /// Resolve the mode from CLI flags. Monitor wins over enforce.
    pub fn from_flags(enforce: bool, monitor: bool) -> Self {
        if monitor {
            ExitMode::Monitor
        } else if enforce {
            ExitMode::Enforce
        } else {
            ExitMode::Warn
        }
    }

    pub fn exit_code(&self, summary: &Tally) -> i32 {
        match self {
            ExitMode::Enforce if summary.mismatch > 0 => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use luaparity_corpus::ExecutionOutcome;
    use pretty_assertions::assert_eq;

    fn ran(stdout: &str, stderr: &str, exit_code: i32) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    fn comparison_with_status(file: &str, status: Status) -> Comparison {
        let (lua, nova) = match status {
            Status::Match => (ran("same\n", "", 0), ran("same\n", "", 0)),
            Status::Mismatch | Status::KnownDivergence => {
                (ran("a\n", "", 0), ran("b\n", "", 0))
            }
            Status::BothError => (ran("", "x\n", 1), ran("", "y\n", 1)),
            Status::LuaOnly => (ran("out\n", "", 0), ExecutionOutcome::not_run()),
            Status::NovaOnly => (ExecutionOutcome::not_run(), ran("out\n", "", 0)),
            Status::Skipped => (ExecutionOutcome::not_run(), ExecutionOutcome::not_run()),
        };
        let mut comparison = classify(file, "5.4", &lua, &nova, false);
        if status == Status::KnownDivergence {
            comparison.mark_known_divergence();
        }
        assert_eq!(comparison.status, status);
        comparison
    }

    #[test]
    fn tally_total_covers_every_status() {
        let mut tally = Tally::default();
        for status in [
            Status::Match,
            Status::Mismatch,
            Status::KnownDivergence,
            Status::BothError,
            Status::LuaOnly,
            Status::NovaOnly,
            Status::Skipped,
        ] {
            tally.record(status);
        }
        assert_eq!(tally.total(), 7);
        assert_eq!(tally.comparable(), 4);
        assert_eq!(tally.effective_matches(), 2);
    }

    #[test]
    fn match_rate_counts_known_divergences_as_matches() {
        let mut tally = Tally::default();
        tally.matched = 7;
        tally.known_divergence = 1;
        tally.mismatch = 1;
        tally.both_error = 1;
        assert_eq!(tally.match_rate(), Some(80.0));
    }

    #[test]
    fn match_rate_is_null_without_comparable_fixtures() {
        let mut tally = Tally::default();
        tally.skipped = 12;
        tally.lua_only = 3;
        assert_eq!(tally.match_rate(), None);
    }

    #[test]
    fn match_rate_rounds_to_one_decimal() {
        let mut tally = Tally::default();
        tally.matched = 2;
        tally.mismatch = 1;
        // 2/3 = 66.666...% rounds to 66.7.
        assert_eq!(tally.match_rate(), Some(66.7));
    }

    #[test]
    fn report_caps_mismatch_and_both_error_lists() {
        let mut comparisons = Vec::new();
        for index in 0..120 {
            comparisons.push(comparison_with_status(
                &format!("m/{:03}.lua", index),
                Status::Mismatch,
            ));
        }
        for index in 0..60 {
            comparisons.push(comparison_with_status(
                &format!("e/{:03}.lua", index),
                Status::BothError,
            ));
        }

        let report = Report::build(&comparisons, "5.4", false, false);
        assert_eq!(report.summary.mismatch, 120);
        assert_eq!(report.mismatches.len(), 100);
        assert_eq!(report.summary.both_error, 60);
        assert_eq!(report.both_errors.len(), 50);
        assert_eq!(report.mismatches[0].file, "m/000.lua");
    }

    #[test]
    fn both_error_excerpts_are_truncated() {
        let long = "e".repeat(900);
        let lua = ran("", &long, 1);
        let nova = ran("", "short\n", 1);
        let comparison = classify("t/long-err.lua", "5.4", &lua, &nova, false);
        assert_eq!(comparison.status, Status::BothError);

        let report = Report::build(std::slice::from_ref(&comparison), "5.4", false, false);
        assert_eq!(report.both_errors[0].lua_error.len(), 500);
        assert_eq!(report.both_errors[0].nova_error, "short\n");
    }

    #[test]
    fn report_json_shape() {
        let comparisons = vec![
            comparison_with_status("a.lua", Status::Match),
            comparison_with_status("b.lua", Status::Mismatch),
            comparison_with_status("c.lua", Status::KnownDivergence),
        ];
        let report = Report::build(&comparisons, "5.3", false, true);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["lua_version"], "5.3");
        assert_eq!(json["strict_mode"], false);
        assert_eq!(json["enforce_mode"], true);
        assert_eq!(json["summary"]["match"], 1);
        assert_eq!(json["summary"]["known_divergence"], 1);
        assert_eq!(json["match_rate"], 66.7);
        assert_eq!(json["mismatches"][0]["file"], "b.lua");
        assert_eq!(json["known_divergences"][0]["file"], "c.lua");
    }

    #[test]
    fn match_rate_serializes_as_null_when_absent() {
        let report = Report::build(&[], "5.4", false, false);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["match_rate"].is_null());
    }

    #[test]
    fn write_json_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/out/comparison.json");
        let report = Report::build(&[], "5.4", true, false);
        report.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["strict_mode"], true);
    }

    #[test]
    fn exit_codes_follow_the_mode() {
        let mut clean = Tally::default();
        clean.matched = 5;
        let mut dirty = Tally::default();
        dirty.mismatch = 2;

        assert_eq!(ExitMode::Warn.exit_code(&dirty), 0);
        assert_eq!(ExitMode::Monitor.exit_code(&dirty), 0);
        assert_eq!(ExitMode::Enforce.exit_code(&dirty), 1);
        assert_eq!(ExitMode::Enforce.exit_code(&clean), 0);
    }

    #[test]
    fn exit_mode_from_flags_prefers_monitor() {
        assert_eq!(ExitMode::from_flags(false, false), ExitMode::Warn);
        assert_eq!(ExitMode::from_flags(true, false), ExitMode::Enforce);
        assert_eq!(ExitMode::from_flags(true, true), ExitMode::Monitor);
    }
}
