//! Classification of one fixture's captured outputs.
//!
//! Each fixture run leaves behind a pair of captures, one per
//! interpreter. [`classify`] reduces that pair to a single [`Status`]
//! plus a human-readable diff summary. Downgrades that depend on
//! fixture metadata or the allowlist are applied afterwards through
//! [`Comparison::mark_version_skipped`] and
//! [`Comparison::mark_known_divergence`]; once the caller is done with
//! those the value is final.

use crate::normalize::normalize;
use luaparity_corpus::ExecutionOutcome;
use serde::Serialize;
use std::fmt;

/// Final verdict for one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Outputs agree, either exactly or after normalization.
    Match,
    /// Outputs disagree even after normalization.
    Mismatch,
    /// A mismatch documented in the allowlist.
    KnownDivergence,
    /// Both interpreters exited nonzero with different messages.
    BothError,
    /// Only the reference interpreter produced a capture.
    LuaOnly,
    /// Only NovaSharp produced a capture.
    NovaOnly,
    /// Not comparable: nothing ran, or the fixture targets other versions.
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Match => "match",
            Status::Mismatch => "mismatch",
            Status::KnownDivergence => "known_divergence",
            Status::BothError => "both_error",
            Status::LuaOnly => "lua_only",
            Status::NovaOnly => "nova_only",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classified result for one fixture.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Fixture path relative to the corpus root.
    pub file: String,
    /// Target Lua version the captures were produced against.
    pub lua_version: String,
    pub status: Status,
    /// Raw captured stdout per interpreter.
    pub lua_output: String,
    pub nova_output: String,
    /// Raw captured stderr per interpreter.
    pub lua_error: String,
    pub nova_error: String,
    pub lua_rc: i32,
    pub nova_rc: i32,
    /// True when the outputs agreed, exactly or after normalization.
    pub normalized_match: bool,
    pub diff_summary: String,
}

impl Comparison {
    fn new(
        file: &str,
        lua_version: &str,
        status: Status,
        lua: &ExecutionOutcome,
        nova: &ExecutionOutcome,
    ) -> Self {
        Comparison {
            file: file.to_string(),
            lua_version: lua_version.to_string(),
            status,
            lua_output: lua.stdout.clone(),
            nova_output: nova.stdout.clone(),
            lua_error: lua.stderr.clone(),
            nova_error: nova.stderr.clone(),
            lua_rc: lua.exit_code,
            nova_rc: nova.exit_code,
            normalized_match: false,
            diff_summary: String::new(),
        }
    }

    /// Downgrade a mismatch on a fixture that does not target the
    /// compared Lua version.
    pub fn mark_version_skipped(&mut self, targeted_versions: &[String]) {
        self.status = Status::Skipped;
        self.diff_summary = format!(
            "Version incompatible: fixture targets {:?}",
            targeted_versions
        );
    }

    /// Downgrade a mismatch that is documented in the allowlist.
    pub fn mark_known_divergence(&mut self) {
        self.status = Status::KnownDivergence;
    }
}

/// Combined stdout and stderr, trimmed, the way a user would read a
/// terminal session.
fn combined(outcome: &ExecutionOutcome) -> String {
    format!("{}\n{}", outcome.stdout, outcome.stderr)
        .trim()
        .to_string()
}

/// Classify one fixture from its two captured outcomes.
///
/// The checks run in a fixed order and the first that applies wins:
/// skipped, one-sided captures, exact match, normalized match, both
/// errored, mismatch. With `strict` set the normalization pipeline is
/// bypassed and only exact equality counts as a match.
pub fn classify(
    file: &str,
    lua_version: &str,
    lua: &ExecutionOutcome,
    nova: &ExecutionOutcome,
    strict: bool,
) -> Comparison {
    if !lua.was_run() && !nova.was_run() {
        return Comparison::new(file, lua_version, Status::Skipped, lua, nova);
    }
    if !lua.was_run() {
        return Comparison::new(file, lua_version, Status::NovaOnly, lua, nova);
    }
    if !nova.was_run() {
        return Comparison::new(file, lua_version, Status::LuaOnly, lua, nova);
    }

    let mut comparison = Comparison::new(file, lua_version, Status::Match, lua, nova);
    let lua_combined = combined(lua);
    let nova_combined = combined(nova);
    if lua_combined == nova_combined {
        comparison.normalized_match = true;
        return comparison;
    }

    let (lua_norm, nova_norm) = if strict {
        (lua_combined, nova_combined)
    } else {
        (normalize(&lua_combined), normalize(&nova_combined))
    };

    if lua_norm == nova_norm {
        comparison.normalized_match = true;
        comparison.diff_summary = "Matched after normalization".to_string();
        return comparison;
    }

    if lua.exit_code != 0 && nova.exit_code != 0 {
        comparison.status = Status::BothError;
        comparison.diff_summary = "Both errored with different messages".to_string();
        return comparison;
    }

    comparison.status = Status::Mismatch;
    comparison.diff_summary = diff_summary(&lua_norm, &nova_norm);
    comparison
}

/// One-line description of where two normalized outputs diverge.
fn diff_summary(lua_norm: &str, nova_norm: &str) -> String {
    let lua_lines: Vec<&str> = lua_norm.split('\n').collect();
    let nova_lines: Vec<&str> = nova_norm.split('\n').collect();
    if lua_lines.len() != nova_lines.len() {
        return format!(
            "Line count differs: Lua={}, Nova={}",
            lua_lines.len(),
            nova_lines.len()
        );
    }
    for (index, (lua_line, nova_line)) in lua_lines.iter().zip(nova_lines.iter()).enumerate() {
        if lua_line != nova_line {
            return format!(
                "First diff at line {}: Lua='{}...', Nova='{}...'",
                index + 1,
                truncate(lua_line, 50),
                truncate(nova_line, 50)
            );
        }
    }
    String::new()
}

fn truncate(line: &str, limit: usize) -> String {
    line.chars().take(limit).collect()
}
