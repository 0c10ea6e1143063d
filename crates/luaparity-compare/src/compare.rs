//! Comparison driver.
//!
//! Walks the fixture list, loads each fixture's captured outputs
//! through the shared layout, classifies the pair, and applies the
//! metadata and allowlist downgrades. Fixtures are processed in sorted
//! path order, so the report's detail lists are deterministic.

use crate::allowlist::Allowlist;
use crate::classify::{classify, Comparison, Status};
use crate::error::{CompareError, CompareResult};
use crate::report::Report;
use luaparity_corpus::{
    find_captured_rel_paths, find_fixture_rel_paths, FixtureMetadata, InterpreterTag, OutputLayout,
};
use std::path::PathBuf;

/// Unattended comparisons get a progress line this often
const PROGRESS_EVERY: usize = 100;

/// Comparator configuration
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub results_dir: PathBuf,
    pub corpus_dir: PathBuf,
    pub lua_version: String,
    /// Bypass normalization; only exact output equality matches
    pub strict: bool,
    /// Recorded in the report so CI logs show what gated the run
    pub enforce: bool,
    pub verbose: bool,
}

impl CompareConfig {
    pub fn new(
        results_dir: impl Into<PathBuf>,
        corpus_dir: impl Into<PathBuf>,
        lua_version: impl Into<String>,
    ) -> Self {
        Self {
            results_dir: results_dir.into(),
            corpus_dir: corpus_dir.into(),
            lua_version: lua_version.into(),
            strict: false,
            enforce: false,
            verbose: false,
        }
    }

    /// Disable the normalization pipeline
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Mark the run as gating
    pub fn with_enforce(mut self, enforce: bool) -> Self {
        self.enforce = enforce;
        self
    }

    /// Print each mismatch as it is found
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Compares captured interpreter outputs fixture by fixture
pub struct Comparator {
    config: CompareConfig,
    allowlist: Allowlist,
}

impl Comparator {
    pub fn new(config: CompareConfig) -> Self {
        Self {
            config,
            allowlist: Allowlist::new(),
        }
    }

    /// Attach the known-divergence allowlist
    pub fn with_allowlist(mut self, allowlist: Allowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// The fixture paths this comparison will cover.
    ///
    /// The corpus directory is the authoritative list; when it is gone
    /// the list is reconstructed from the captured `.out` files.
    pub fn discover(&self) -> CompareResult<Vec<String>> {
        if self.config.corpus_dir.is_dir() {
            return Ok(find_fixture_rel_paths(&self.config.corpus_dir)?);
        }
        let tag = InterpreterTag::lua(&self.config.lua_version);
        Ok(find_captured_rel_paths(&self.config.results_dir, &tag)?)
    }

    /// Classify one fixture, including downgrades.
    pub fn compare_fixture(&self, layout: &OutputLayout, rel_path: &str) -> Comparison {
        let lua = layout.load(rel_path, &InterpreterTag::lua(&self.config.lua_version));
        let nova = layout.load(rel_path, &InterpreterTag::Nova);
        let mut comparison = classify(
            rel_path,
            &self.config.lua_version,
            &lua,
            &nova,
            self.config.strict,
        );

        // A mismatch on a fixture that never targeted this Lua version
        // is noise, not signal
        if comparison.status == Status::Mismatch {
            let fixture_path = self.config.corpus_dir.join(rel_path);
            if fixture_path.exists() {
                let meta = FixtureMetadata::parse(&fixture_path);
                if !meta.is_compatible(&self.config.lua_version) {
                    comparison.mark_version_skipped(&meta.lua_versions);
                }
            }
        }

        if comparison.status == Status::Mismatch && self.allowlist.contains(rel_path) {
            comparison.mark_known_divergence();
        }

        comparison
    }

    /// Compare every fixture and build the aggregate report.
    pub fn run(&self) -> CompareResult<Report> {
        if !self.config.results_dir.is_dir() {
            return Err(CompareError::results_dir_not_found(&self.config.results_dir));
        }

        let fixtures = self.discover()?;
        let layout = OutputLayout::new(&self.config.results_dir);
        let total = fixtures.len();

        let mut comparisons = Vec::with_capacity(total);
        for (index, rel_path) in fixtures.iter().enumerate() {
            let comparison = self.compare_fixture(&layout, rel_path);
            self.report_progress(index + 1, total, &comparison);
            comparisons.push(comparison);
        }

        Ok(Report::build(
            &comparisons,
            &self.config.lua_version,
            self.config.strict,
            self.config.enforce,
        ))
    }

    fn report_progress(&self, done: usize, total: usize, comparison: &Comparison) {
        if self.config.verbose
            && matches!(comparison.status, Status::Mismatch | Status::BothError)
        {
            println!("[{}] {}", comparison.status.as_str().to_uppercase(), comparison.file);
            if !comparison.diff_summary.is_empty() {
                println!("  {}", comparison.diff_summary);
            }
        }
        if done % PROGRESS_EVERY == 0 {
            println!("Processed {}/{} snippets...", done, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    /// Lay down a fixture plus its captured outputs for both
    /// interpreters
    fn capture(
        corpus: &std::path::Path,
        results: &std::path::Path,
        rel: &str,
        header: &str,
        lua: Option<(&str, &str, i32)>,
        nova: Option<(&str, &str, i32)>,
    ) {
        let fixture = corpus.join(rel);
        fs::create_dir_all(fixture.parent().unwrap()).unwrap();
        fs::write(&fixture, format!("{}print('x')\n", header)).unwrap();

        let stem = rel.strip_suffix(".lua").unwrap();
        fs::create_dir_all(results.join(stem).parent().unwrap()).unwrap();
        if let Some((out, err, rc)) = lua {
            fs::write(results.join(format!("{}.lua5.4.out", stem)), out).unwrap();
            fs::write(results.join(format!("{}.lua5.4.err", stem)), err).unwrap();
            fs::write(results.join(format!("{}.lua5.4.rc", stem)), rc.to_string()).unwrap();
        }
        if let Some((out, err, rc)) = nova {
            fs::write(results.join(format!("{}.nova.out", stem)), out).unwrap();
            fs::write(results.join(format!("{}.nova.err", stem)), err).unwrap();
            fs::write(results.join(format!("{}.nova.rc", stem)), rc.to_string()).unwrap();
        }
    }

    #[test]
    fn full_run_classifies_and_downgrades() {
        let corpus = tempdir().unwrap();
        let results = tempdir().unwrap();
        let c = corpus.path();
        let r = results.path();

        capture(c, r, "S/match.lua", "", Some(("1\n", "", 0)), Some(("1\n", "", 0)));
        capture(c, r, "S/bad.lua", "", Some(("1\n", "", 0)), Some(("2\n", "", 0)));
        capture(c, r, "S/known.lua", "", Some(("a\n", "", 0)), Some(("b\n", "", 0)));
        capture(
            c,
            r,
            "S/v53.lua",
            "-- @lua-versions: 5.3\n",
            Some(("x\n", "", 0)),
            Some(("y\n", "", 0)),
        );
        capture(c, r, "S/luaonly.lua", "", Some(("1\n", "", 0)), None);
        capture(c, r, "S/skip.lua", "", None, None);

        let config = CompareConfig::new(r, c, "5.4");
        let comparator =
            Comparator::new(config).with_allowlist(Allowlist::from_entries(["S/known.lua"]));
        let report = comparator.run().unwrap();

        assert_eq!(report.summary.matched, 1);
        assert_eq!(report.summary.mismatch, 1);
        assert_eq!(report.summary.known_divergence, 1);
        assert_eq!(report.summary.skipped, 2);
        assert_eq!(report.summary.lua_only, 1);
        assert_eq!(report.summary.total(), 6);

        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].file, "S/bad.lua");
        assert_eq!(report.known_divergences[0].file, "S/known.lua");
        assert_eq!(report.match_rate, Some(66.7));
    }

    #[test]
    fn version_downgrade_only_applies_to_incompatible_fixtures() {
        let corpus = tempdir().unwrap();
        let results = tempdir().unwrap();
        capture(
            corpus.path(),
            results.path(),
            "S/v54.lua",
            "-- @lua-versions: 5.4\n",
            Some(("x\n", "", 0)),
            Some(("y\n", "", 0)),
        );

        let config = CompareConfig::new(results.path(), corpus.path(), "5.4");
        let report = Comparator::new(config).run().unwrap();
        assert_eq!(report.summary.mismatch, 1);
        assert_eq!(report.summary.skipped, 0);
    }

    #[test]
    fn missing_results_dir_is_an_error() {
        let corpus = tempdir().unwrap();
        let config = CompareConfig::new("/nonexistent/results", corpus.path(), "5.4");
        let err = Comparator::new(config).run().unwrap_err();
        assert!(matches!(err, CompareError::ResultsDirNotFound { .. }));
        assert!(err.to_string().contains("luaparity run"));
    }

    #[test]
    fn discovery_falls_back_to_captures_without_a_corpus() {
        let results = tempdir().unwrap();
        let r = results.path();
        fs::create_dir_all(r.join("S")).unwrap();
        fs::write(r.join("S/only.lua5.4.out"), "1\n").unwrap();
        fs::write(r.join("S/only.lua5.4.err"), "").unwrap();
        fs::write(r.join("S/only.lua5.4.rc"), "0").unwrap();

        let config = CompareConfig::new(r, "/nonexistent/corpus", "5.4");
        let comparator = Comparator::new(config);
        assert_eq!(comparator.discover().unwrap(), vec!["S/only.lua"]);

        let report = comparator.run().unwrap();
        assert_eq!(report.summary.lua_only, 1);
    }

    #[test]
    fn strict_mode_is_recorded_and_applied() {
        let corpus = tempdir().unwrap();
        let results = tempdir().unwrap();
        capture(
            corpus.path(),
            results.path(),
            "S/addr.lua",
            "",
            Some(("table: 0x1111\n", "", 0)),
            Some(("table: 0x2222\n", "", 0)),
        );

        let relaxed = CompareConfig::new(results.path(), corpus.path(), "5.4");
        let report = Comparator::new(relaxed.clone()).run().unwrap();
        assert_eq!(report.summary.matched, 1);

        let strict = relaxed.with_strict(true);
        let report = Comparator::new(strict).run().unwrap();
        assert_eq!(report.summary.mismatch, 1);
        assert!(report.strict_mode);
    }
}
