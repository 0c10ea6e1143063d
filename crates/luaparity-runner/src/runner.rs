//! Parallel fixture runner
//!
//! Executes every discovered fixture against the reference interpreter
//! and the NovaSharp CLI under a bounded rayon pool. Workers are fully
//! independent: each one parses metadata, invokes both interpreters, and
//! writes captures into its own slice of the output layout. Completion
//! order is arbitrary; results are sorted by fixture path before the
//! summary and results file are produced, so a run's artifacts are
//! deterministic regardless of scheduling.

use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use luaparity_corpus::{find_fixture_rel_paths, FixtureMetadata, InterpreterTag, OutputLayout};

use crate::error::{RunnerError, RunnerResult};
use crate::exec;

/// Unattended fixtures get a progress line this often
const PROGRESS_EVERY: usize = 100;

/// Default per-fixture timeout for the reference interpreter
pub const DEFAULT_LUA_TIMEOUT: Duration = Duration::from_secs(5);
/// Default per-fixture timeout for NovaSharp
pub const DEFAULT_NOVA_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-interpreter outcome of one fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pass,
    Fail,
    Skipped,
}

impl RunStatus {
    fn from_exit_code(exit_code: i32, expects_error: bool) -> Self {
        let passed = if expects_error {
            exit_code != 0
        } else {
            exit_code == 0
        };
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Why a fixture was not executed at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[serde(rename = "novasharp-only")]
    NovaSharpOnly,
    #[serde(rename = "version-incompatible")]
    VersionIncompatible,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NovaSharpOnly => write!(f, "novasharp-only"),
            Self::VersionIncompatible => write!(f, "version-incompatible"),
        }
    }
}

/// Result of running a single fixture
#[derive(Debug, Clone, Serialize)]
pub struct FixtureResult {
    pub file: String,
    pub lua_version: String,
    pub lua_status: RunStatus,
    pub nova_status: RunStatus,
    pub expects_error: bool,
    pub skipped_reason: Option<SkipReason>,
    #[serde(skip)]
    pub lua_rc: i32,
    #[serde(skip)]
    pub nova_rc: i32,
}

impl FixtureResult {
    fn new(file: impl Into<String>, lua_version: impl Into<String>, expects_error: bool) -> Self {
        Self {
            file: file.into(),
            lua_version: lua_version.into(),
            lua_status: RunStatus::Skipped,
            nova_status: RunStatus::Skipped,
            expects_error,
            skipped_reason: None,
            lua_rc: 0,
            nova_rc: 0,
        }
    }

    /// One-line status used for verbose progress output
    pub fn describe(&self) -> String {
        match self.skipped_reason {
            Some(reason) => reason.to_string(),
            None => format!("lua={} nova={}", self.lua_status, self.nova_status),
        }
    }
}

/// Aggregate counts for a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub lua_version: String,
    pub total: usize,
    pub compatible: usize,
    pub skipped_version: usize,
    pub skipped_novasharp: usize,
    pub lua_pass: usize,
    pub lua_fail: usize,
    pub nova_pass: usize,
    pub nova_fail: usize,
    pub elapsed_seconds: f64,
    pub workers: usize,
}

impl RunSummary {
    fn tally(
        results: &[FixtureResult],
        lua_version: &str,
        elapsed: Duration,
        workers: usize,
    ) -> Self {
        Self {
            lua_version: lua_version.to_string(),
            total: results.len(),
            compatible: results
                .iter()
                .filter(|r| r.skipped_reason.is_none())
                .count(),
            skipped_version: results
                .iter()
                .filter(|r| r.skipped_reason == Some(SkipReason::VersionIncompatible))
                .count(),
            skipped_novasharp: results
                .iter()
                .filter(|r| r.skipped_reason == Some(SkipReason::NovaSharpOnly))
                .count(),
            lua_pass: results
                .iter()
                .filter(|r| r.lua_status == RunStatus::Pass)
                .count(),
            lua_fail: results
                .iter()
                .filter(|r| r.lua_status == RunStatus::Fail)
                .count(),
            nova_pass: results
                .iter()
                .filter(|r| r.nova_status == RunStatus::Pass)
                .count(),
            nova_fail: results
                .iter()
                .filter(|r| r.nova_status == RunStatus::Fail)
                .count(),
            elapsed_seconds: (elapsed.as_secs_f64() * 100.0).round() / 100.0,
            workers,
        }
    }
}

/// A completed run: per-fixture results plus the summary
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub results: Vec<FixtureResult>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &std::path::Path) -> RunnerResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RunnerError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        fs::write(path, json).map_err(|e| RunnerError::io(path, e))?;
        Ok(())
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub fixtures_dir: PathBuf,
    pub output_dir: PathBuf,
    pub lua_version: String,
    pub lua_cmd: String,
    pub nova_cmd: Option<String>,
    pub nova_build_cmd: Option<String>,
    pub skip_lua: bool,
    pub skip_novasharp: bool,
    /// Cap on the number of fixtures processed; 0 means no cap
    pub limit: usize,
    /// Worker-pool size; 0 means available parallelism
    pub workers: usize,
    pub lua_timeout: Duration,
    pub nova_timeout: Duration,
    pub verbose: bool,
}

impl RunnerConfig {
    pub fn new(
        fixtures_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        lua_version: impl Into<String>,
    ) -> Self {
        let lua_version = lua_version.into();
        Self {
            fixtures_dir: fixtures_dir.into(),
            output_dir: output_dir.into(),
            lua_cmd: format!("lua{}", lua_version),
            lua_version,
            nova_cmd: None,
            nova_build_cmd: None,
            skip_lua: false,
            skip_novasharp: false,
            limit: 0,
            workers: 0,
            lua_timeout: DEFAULT_LUA_TIMEOUT,
            nova_timeout: DEFAULT_NOVA_TIMEOUT,
            verbose: false,
        }
    }

    /// Override the reference interpreter command
    pub fn with_lua_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.lua_cmd = cmd.into();
        self
    }

    /// Set the NovaSharp CLI invocation
    pub fn with_nova_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.nova_cmd = Some(cmd.into());
        self
    }

    /// Set a build command run once before any fixture executes
    pub fn with_nova_build_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.nova_build_cmd = Some(cmd.into());
        self
    }

    /// Skip reference interpreter execution
    pub fn with_skip_lua(mut self, skip: bool) -> Self {
        self.skip_lua = skip;
        self
    }

    /// Skip NovaSharp execution
    pub fn with_skip_novasharp(mut self, skip: bool) -> Self {
        self.skip_novasharp = skip;
        self
    }

    /// Cap the number of fixtures processed (0 = no cap)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the worker-pool size (0 = available parallelism)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable per-fixture progress output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Parallel fixture runner
pub struct FixtureRunner {
    config: RunnerConfig,
}

impl FixtureRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Effective worker-pool size for this configuration
    pub fn workers(&self) -> usize {
        self.config.worker_count()
    }

    /// Verify everything a run needs before any fixture executes.
    ///
    /// Checks the fixtures directory, probes the reference interpreter
    /// with `-v`, and requires a NovaSharp command unless NovaSharp
    /// execution is skipped. All failures are fatal.
    pub fn verify_prerequisites(&self) -> RunnerResult<()> {
        if !self.config.fixtures_dir.is_dir() {
            return Err(RunnerError::fixtures_dir_not_found(&self.config.fixtures_dir));
        }

        if !self.config.skip_lua && !lua_available(&self.config.lua_cmd) {
            return Err(RunnerError::lua_not_found(
                &self.config.lua_cmd,
                &self.config.lua_version,
            ));
        }

        if !self.config.skip_novasharp && self.config.nova_cmd.is_none() {
            return Err(RunnerError::MissingNovaCommand);
        }

        Ok(())
    }

    /// Run the configured build command, if any.
    ///
    /// A failing build aborts the whole run: without a NovaSharp binary
    /// there is nothing to compare.
    pub fn build_novasharp(&self) -> RunnerResult<()> {
        let cmd = match &self.config.nova_build_cmd {
            Some(cmd) => cmd,
            None => return Ok(()),
        };

        let argv = split_command(cmd);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RunnerError::build_failed("empty build command"))?;

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| RunnerError::build_failed(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            return Err(RunnerError::build_failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Execute every discovered fixture and collect the report.
    ///
    /// Subprocess failures are captured per fixture and never abort the
    /// batch; failures to write into the results directory do.
    pub fn run(&self) -> RunnerResult<RunReport> {
        let mut fixtures = find_fixture_rel_paths(&self.config.fixtures_dir)?;
        if self.config.limit > 0 {
            fixtures.truncate(self.config.limit);
        }

        let layout = OutputLayout::new(&self.config.output_dir);
        fs::create_dir_all(layout.results_dir())
            .map_err(|e| RunnerError::io(layout.results_dir(), e))?;

        let workers = self.config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| RunnerError::WorkerPool(e.to_string()))?;

        let started = Instant::now();
        let total = fixtures.len();
        let completed = AtomicUsize::new(0);

        let results: RunnerResult<Vec<FixtureResult>> = pool.install(|| {
            fixtures
                .par_iter()
                .map(|rel_path| {
                    let result = self.process_fixture(&layout, rel_path)?;
                    self.report_progress(&completed, total, &result);
                    Ok(result)
                })
                .collect()
        });

        let mut results = results?;
        results.sort_by(|a, b| a.file.cmp(&b.file));

        let summary = RunSummary::tally(
            &results,
            &self.config.lua_version,
            started.elapsed(),
            workers,
        );

        Ok(RunReport { results, summary })
    }

    fn report_progress(&self, completed: &AtomicUsize, total: usize, result: &FixtureResult) {
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.verbose {
            println!("[{}/{}] {}: {}", done, total, result.file, result.describe());
        } else if done % PROGRESS_EVERY == 0 {
            println!("Progress: {}/{}", done, total);
        }
    }

    /// Run one fixture against both interpreters (worker function)
    fn process_fixture(&self, layout: &OutputLayout, rel_path: &str) -> RunnerResult<FixtureResult> {
        let fixture_path = self.config.fixtures_dir.join(rel_path);
        let meta = FixtureMetadata::parse(&fixture_path);

        let mut result = FixtureResult::new(rel_path, &self.config.lua_version, meta.expects_error);

        if !meta.is_compatible(&self.config.lua_version) {
            result.skipped_reason = Some(if meta.novasharp_only {
                SkipReason::NovaSharpOnly
            } else {
                SkipReason::VersionIncompatible
            });
            return Ok(result);
        }

        let capture_dir = layout.capture_dir(rel_path);
        fs::create_dir_all(&capture_dir).map_err(|e| RunnerError::io(&capture_dir, e))?;

        if !self.config.skip_lua {
            let tag = InterpreterTag::lua(&self.config.lua_version);
            let argv = split_command(&self.config.lua_cmd);
            let rc = exec::run_capture(
                &argv,
                &fixture_path,
                self.config.lua_timeout,
                &layout.stdout_path(rel_path, &tag),
                &layout.stderr_path(rel_path, &tag),
            )?;
            let rc_path = layout.rc_path(rel_path, &tag);
            fs::write(&rc_path, rc.to_string()).map_err(|e| RunnerError::io(&rc_path, e))?;

            result.lua_rc = rc;
            result.lua_status = RunStatus::from_exit_code(rc, meta.expects_error);
        }

        if !self.config.skip_novasharp {
            // Prerequisite checks guarantee nova_cmd is present here
            let nova_cmd = self.config.nova_cmd.as_deref().unwrap_or_default();
            let tag = InterpreterTag::Nova;
            let mut argv = split_command(nova_cmd);
            argv.push("--lua-version".to_string());
            argv.push(self.config.lua_version.clone());

            let rc = exec::run_capture(
                &argv,
                &fixture_path,
                self.config.nova_timeout,
                &layout.stdout_path(rel_path, &tag),
                &layout.stderr_path(rel_path, &tag),
            )?;
            let rc_path = layout.rc_path(rel_path, &tag);
            fs::write(&rc_path, rc.to_string()).map_err(|e| RunnerError::io(&rc_path, e))?;

            result.nova_rc = rc;
            result.nova_status = RunStatus::from_exit_code(rc, meta.expects_error);
        }

        Ok(result)
    }
}

/// Probe an interpreter with `-v`
fn lua_available(lua_cmd: &str) -> bool {
    let argv = split_command(lua_cmd);
    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => return false,
    };
    Command::new(program)
        .args(args)
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Split a command string on whitespace into argv form
fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    /// Shell script that echoes the fixture it was handed, usable as a
    /// stand-in for both interpreters
    fn write_stub_interpreter(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("fakelua");
        fs::write(
            &path,
            "#!/bin/sh\nif [ \"$1\" = \"-v\" ]; then echo stub 5.4; exit 0; fi\n\
             for last; do :; done\ncat \"$last\"\n",
        )
        .unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn corpus_with(fixtures: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for (rel, body) in fixtures {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        dir
    }

    #[rstest]
    #[case(0, false, RunStatus::Pass)]
    #[case(1, false, RunStatus::Fail)]
    #[case(0, true, RunStatus::Fail)]
    #[case(1, true, RunStatus::Pass)]
    fn test_run_status_from_exit_code(
        #[case] exit_code: i32,
        #[case] expects_error: bool,
        #[case] expected: RunStatus,
    ) {
        assert_eq!(RunStatus::from_exit_code(exit_code, expects_error), expected);
    }

    #[test]
    fn test_prerequisites_missing_fixtures_dir() {
        let out = tempdir().unwrap();
        let config = RunnerConfig::new("/nonexistent/fixtures", out.path(), "5.4");
        let err = FixtureRunner::new(config).verify_prerequisites().unwrap_err();
        assert!(matches!(err, RunnerError::FixturesDirNotFound { .. }));
    }

    #[test]
    fn test_prerequisites_missing_interpreter() {
        let fixtures = corpus_with(&[("a.lua", "print(1)\n")]);
        let out = tempdir().unwrap();
        let config = RunnerConfig::new(fixtures.path(), out.path(), "5.4")
            .with_lua_cmd("definitely-not-a-lua-9000")
            .with_skip_novasharp(true);
        let err = FixtureRunner::new(config).verify_prerequisites().unwrap_err();
        assert!(matches!(err, RunnerError::LuaNotFound { .. }));
    }

    #[test]
    fn test_prerequisites_require_nova_cmd() {
        let fixtures = corpus_with(&[("a.lua", "print(1)\n")]);
        let out = tempdir().unwrap();
        let config = RunnerConfig::new(fixtures.path(), out.path(), "5.4").with_skip_lua(true);
        let err = FixtureRunner::new(config).verify_prerequisites().unwrap_err();
        assert!(matches!(err, RunnerError::MissingNovaCommand));
    }

    #[test]
    fn test_build_failure_is_fatal() {
        let fixtures = corpus_with(&[("a.lua", "print(1)\n")]);
        let out = tempdir().unwrap();
        let config = RunnerConfig::new(fixtures.path(), out.path(), "5.4")
            .with_nova_build_cmd("false")
            .with_skip_lua(true)
            .with_skip_novasharp(true);
        let err = FixtureRunner::new(config).build_novasharp().unwrap_err();
        assert!(matches!(err, RunnerError::BuildFailed(_)));
    }

    #[test]
    fn test_run_writes_captures_and_tallies() {
        let fixtures = corpus_with(&[
            ("Suite/hello.lua", "hello\n"),
            ("Suite/only54.lua", "-- @lua-versions: 5.4\nbody\n"),
            ("Suite/novaonly.lua", "-- @novasharp-only: true\nbody\n"),
        ]);
        let out = tempdir().unwrap();
        let stub = write_stub_interpreter(out.path());

        let config = RunnerConfig::new(fixtures.path(), out.path().join("results"), "5.1")
            .with_lua_cmd(stub.to_string_lossy())
            .with_nova_cmd(stub.to_string_lossy())
            .with_workers(2);
        let report = FixtureRunner::new(config).run().unwrap();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.compatible, 1);
        assert_eq!(report.summary.skipped_version, 1);
        assert_eq!(report.summary.skipped_novasharp, 1);
        assert_eq!(report.summary.lua_pass, 1);
        assert_eq!(report.summary.nova_pass, 1);
        assert_eq!(report.summary.lua_fail, 0);

        // Results are sorted by fixture path
        let files: Vec<_> = report.results.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(
            files,
            vec!["Suite/hello.lua", "Suite/novaonly.lua", "Suite/only54.lua"]
        );

        let layout = OutputLayout::new(out.path().join("results"));
        let outcome = layout.load("Suite/hello.lua", &InterpreterTag::lua("5.1"));
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.exit_code, 0);
        let nova = layout.load("Suite/hello.lua", &InterpreterTag::Nova);
        assert_eq!(nova.stdout, "hello\n");

        // Skipped fixtures leave no captures behind
        let skipped = layout.load("Suite/novaonly.lua", &InterpreterTag::Nova);
        assert!(!skipped.was_run());
    }

    #[test]
    fn test_run_respects_limit() {
        let fixtures = corpus_with(&[
            ("a.lua", "a\n"),
            ("b.lua", "b\n"),
            ("c.lua", "c\n"),
        ]);
        let out = tempdir().unwrap();
        let stub = write_stub_interpreter(out.path());

        let config = RunnerConfig::new(fixtures.path(), out.path().join("results"), "5.4")
            .with_lua_cmd(stub.to_string_lossy())
            .with_skip_novasharp(true)
            .with_limit(2);
        let report = FixtureRunner::new(config).run().unwrap();
        assert_eq!(report.summary.total, 2);
    }

    #[test]
    fn test_expects_error_inverts_pass() {
        let fixtures = corpus_with(&[(
            "err.lua",
            "-- @expects-error: true\nbody\n",
        )]);
        let out = tempdir().unwrap();
        let stub = write_stub_interpreter(out.path());

        // The stub cats the fixture and exits 0, so an expects-error
        // fixture counts as a failure
        let config = RunnerConfig::new(fixtures.path(), out.path().join("results"), "5.4")
            .with_lua_cmd(stub.to_string_lossy())
            .with_skip_novasharp(true);
        let report = FixtureRunner::new(config).run().unwrap();
        assert_eq!(report.summary.lua_fail, 1);
        assert!(report.results[0].expects_error);
    }

    #[test]
    fn test_report_json_shape() {
        let results = vec![FixtureResult::new("a.lua", "5.4", false)];
        let summary = RunSummary::tally(&results, "5.4", Duration::from_millis(1234), 8);
        let report = RunReport { results, summary };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(value["summary"]["lua_version"], "5.4");
        assert_eq!(value["summary"]["total"], 1);
        assert_eq!(value["summary"]["workers"], 8);
        assert_eq!(value["results"][0]["file"], "a.lua");
        assert_eq!(value["results"][0]["lua_status"], "skipped");
        assert_eq!(value["results"][0]["skipped_reason"], serde_json::Value::Null);
        // Raw outputs stay in the capture files, not the report
        assert!(value["results"][0].get("lua_rc").is_none());
    }
}
