//! Fixture execution command (luaparity run)

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use luaparity_corpus::find_fixture_rel_paths;
use luaparity_runner::{FixtureRunner, RunReport, RunnerConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub fixtures_dir: PathBuf,
    pub output_dir: PathBuf,
    pub lua_version: String,
    pub lua_cmd: Option<String>,
    pub nova_cmd: Option<String>,
    pub nova_build_cmd: Option<String>,
    pub skip_novasharp: bool,
    pub skip_lua: bool,
    pub limit: usize,
    pub workers: usize,
    pub verbose: bool,
}

/// Run the run command. The runner reports, it does not gate: the
/// exit code is always 0 once the batch completes.
pub fn run(args: RunArgs) -> Result<()> {
    let mut config = RunnerConfig::new(&args.fixtures_dir, &args.output_dir, &args.lua_version)
        .with_skip_lua(args.skip_lua)
        .with_skip_novasharp(args.skip_novasharp)
        .with_limit(args.limit)
        .with_workers(args.workers)
        .with_verbose(args.verbose);
    if let Some(cmd) = &args.lua_cmd {
        config = config.with_lua_cmd(cmd);
    }
    if let Some(cmd) = &args.nova_cmd {
        config = config.with_nova_cmd(cmd);
    }
    if let Some(cmd) = &args.nova_build_cmd {
        config = config.with_nova_build_cmd(cmd);
    }

    let runner = FixtureRunner::new(config);
    runner
        .verify_prerequisites()
        .context("Prerequisite check failed")?;

    if !args.skip_novasharp && args.nova_build_cmd.is_some() {
        build_with_spinner(&runner)?;
    }

    let fixtures =
        find_fixture_rel_paths(&args.fixtures_dir).context("Failed to list fixtures")?;
    println!("Found {} Lua fixture files", fixtures.len());
    println!(
        "Testing against Lua {} ({})",
        args.lua_version,
        runner.config().lua_cmd
    );
    println!("Using {} parallel workers", runner.workers());
    println!("Output directory: {}", args.output_dir.display());
    println!();

    let report = runner.run().context("Fixture run failed")?;

    let results_file = args.output_dir.join("results.json");
    report
        .write_json(&results_file)
        .context("Failed to write results.json")?;

    print_summary(&args, &runner.config().lua_cmd, &report);
    println!();
    println!("Results written to: {}", results_file.display());

    Ok(())
}

/// Run the NovaSharp build behind a spinner; a failed build aborts
/// before any fixture executes.
fn build_with_spinner(runner: &FixtureRunner) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Building NovaSharp CLI...");

    match runner.build_novasharp() {
        Ok(()) => {
            spinner.finish_with_message("Building NovaSharp CLI... done");
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e).context("NovaSharp build failed")
        }
    }
}

/// Print the post-run summary block
fn print_summary(args: &RunArgs, lua_cmd: &str, report: &RunReport) {
    let summary = &report.summary;

    println!();
    println!("=== Lua Fixture Test Summary ===");
    println!(
        "Lua version:           {} ({})",
        summary.lua_version, lua_cmd
    );
    println!("Total fixtures:        {}", summary.total);
    println!("Compatible:            {}", summary.compatible);
    println!("Skipped (version):     {}", summary.skipped_version);
    println!("Skipped (NovaSharp):   {}", summary.skipped_novasharp);
    if !args.skip_lua {
        println!(
            "Lua {} pass:          {}",
            summary.lua_version, summary.lua_pass
        );
        println!(
            "Lua {} fail:          {}",
            summary.lua_version, summary.lua_fail
        );
    }
    if !args.skip_novasharp {
        println!("NovaSharp pass:        {}", summary.nova_pass);
        println!("NovaSharp fail:        {}", summary.nova_fail);
    }
    println!("Elapsed time:          {:.2}s", summary.elapsed_seconds);
    let per_second = if summary.elapsed_seconds > 0.0 {
        summary.total as f64 / summary.elapsed_seconds
    } else {
        0.0
    };
    println!("Fixtures/second:       {:.1}", per_second);
}
