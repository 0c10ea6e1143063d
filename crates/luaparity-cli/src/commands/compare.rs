//! Output comparison command (luaparity compare)

use crate::config::Config;
use anyhow::{Context, Result};
use colored::*;
use luaparity_compare::{
    Allowlist, Comparator, CompareConfig, CompareError, ExitMode, Report,
};
use std::path::PathBuf;
use std::process;

/// Arguments for the compare command
#[derive(Debug, Clone)]
pub struct CompareArgs {
    pub results_dir: PathBuf,
    pub corpus_dir: PathBuf,
    pub output_file: Option<PathBuf>,
    pub lua_version: String,
    pub allowlist: Option<PathBuf>,
    pub strict: bool,
    pub verbose: bool,
    pub enforce: bool,
    pub monitor: bool,
}

/// Run the compare command. The exit code is nonzero only in enforce
/// mode with unexpected mismatches remaining.
pub fn run(args: CompareArgs, cli_config: &Config) -> Result<()> {
    if cli_config.no_color {
        colored::control::set_override(false);
    }

    let allowlist = match &args.allowlist {
        Some(path) => Allowlist::load(path).context("Failed to load allowlist")?,
        None => Allowlist::new(),
    };

    let output_file = args
        .output_file
        .clone()
        .unwrap_or_else(|| args.results_dir.join("comparison.json"));

    if !args.results_dir.is_dir() {
        return Err(CompareError::results_dir_not_found(&args.results_dir).into());
    }

    let config = CompareConfig::new(&args.results_dir, &args.corpus_dir, &args.lua_version)
        .with_strict(args.strict)
        .with_enforce(args.enforce)
        .with_verbose(args.verbose);
    let comparator = Comparator::new(config).with_allowlist(allowlist);

    let fixtures = comparator.discover().context("Failed to list fixtures")?;
    println!(
        "Comparing {} snippets against Lua {}",
        fixtures.len(),
        args.lua_version
    );
    println!("Results directory: {}", args.results_dir.display());
    println!(
        "Normalization: {}",
        if args.strict { "disabled" } else { "enabled" }
    );
    println!("Known divergences: {}", comparator.allowlist().len());
    println!(
        "Enforce mode: {}",
        if args.enforce { "enabled" } else { "disabled" }
    );
    println!();

    let report = comparator.run().context("Comparison failed")?;

    print_summary(&args.lua_version, &report);

    report
        .write_json(&output_file)
        .context("Failed to write comparison report")?;
    println!("\nReport written to: {}", output_file.display());

    let mode = ExitMode::from_flags(args.enforce, args.monitor);
    print_verdict(mode, &report);

    let code = mode.exit_code(&report.summary);
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

/// Print the per-status tally and the effective match rate
fn print_summary(lua_version: &str, report: &Report) {
    let summary = &report.summary;

    println!();
    println!("=== Comparison Summary ===");
    println!("Lua version:    {}", lua_version);
    println!("Total:          {}", summary.total());
    println!("Match:          {}", summary.matched);
    println!("Mismatch:       {}", summary.mismatch);
    println!("Known divergence: {}", summary.known_divergence);
    println!("Both error:     {}", summary.both_error);
    println!("Lua only:       {}", summary.lua_only);
    println!("Nova only:      {}", summary.nova_only);
    println!("Skipped:        {}", summary.skipped);

    if let Some(rate) = report.match_rate {
        println!(
            "\nEffective match rate: {:.1}% ({}/{})",
            rate,
            summary.effective_matches(),
            summary.comparable()
        );
        if summary.mismatch > 0 {
            println!("Unexpected mismatches: {}", summary.mismatch);
        }
    }
}

/// Print the verdict lines for the chosen exit mode
fn print_verdict(mode: ExitMode, report: &Report) {
    let mismatches = report.summary.mismatch;
    match mode {
        ExitMode::Monitor => {
            if mismatches > 0 {
                println!(
                    "\n{} MONITOR MODE: {} mismatch(es) found (not failing)",
                    "[INFO]".cyan(),
                    mismatches
                );
                println!("This is expected for experimental Lua versions like 5.5.");
            } else {
                println!(
                    "\n{} MONITOR MODE: All comparable fixtures match.",
                    "[OK]".green()
                );
            }
        }
        ExitMode::Enforce if mismatches > 0 => {
            println!(
                "\n{} ENFORCE MODE: {} unexpected mismatch(es) found!",
                "[FAIL]".red().bold(),
                mismatches
            );
            println!("Add the fixture paths to the allowlist if these are expected,");
            println!("or fix the divergence in the NovaSharp runtime.");
        }
        _ => {
            if mismatches > 0 {
                println!(
                    "\n{} {} mismatch(es) found (warn mode, not failing)",
                    "[WARN]".yellow(),
                    mismatches
                );
            } else {
                println!(
                    "\n{} All comparable fixtures match (or are documented divergences).",
                    "[OK]".green()
                );
            }
        }
    }
}
