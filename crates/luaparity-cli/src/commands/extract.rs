//! Corpus extraction command (luaparity extract)

use anyhow::{Context, Result};
use luaparity_extract::{ExtractConfig, Extraction, Extractor, Manifest};
use std::path::PathBuf;

/// Arguments for the extract command
#[derive(Debug, Clone)]
pub struct ExtractArgs {
    /// C# test source directories to scan
    pub test_dirs: Vec<PathBuf>,
    /// Corpus output directory
    pub output_dir: PathBuf,
    /// Don't write files, just report what would be extracted
    pub dry_run: bool,
    /// Only write the manifest, not individual fixtures
    pub manifest_only: bool,
    /// List every extracted fixture path
    pub verbose: bool,
}

/// Run the extract command
pub fn run(args: ExtractArgs) -> Result<()> {
    println!("Extracting Lua snippets from test files...");

    let extractor = Extractor::new(ExtractConfig::new(args.test_dirs, &args.output_dir));
    let extraction = extractor.extract();

    if args.verbose {
        for snippet in &extraction.snippets {
            println!("  {}", snippet.output_rel_path());
        }
    }

    print_summary(&extraction);

    if !args.manifest_only {
        if args.dry_run {
            println!(
                "[DRY RUN] Would create {} files in {}",
                extraction.total(),
                args.output_dir.display()
            );
        } else {
            extractor
                .write_snippets(&extraction)
                .context("Failed to write fixture files")?;
        }
    }

    if args.dry_run {
        println!(
            "[DRY RUN] Would write manifest with {} entries",
            extraction.total()
        );
    } else {
        let manifest = Manifest::build(&extraction);
        extractor
            .write_manifest(&manifest)
            .context("Failed to write manifest.json")?;
        println!("\nOutput written to: {}", args.output_dir.display());
    }

    Ok(())
}

/// Print the extraction summary block
fn print_summary(extraction: &Extraction) {
    println!();
    println!("=== Lua Corpus Extraction Summary ===");
    println!("Total snippets:     {}", extraction.total());
    println!("NovaSharp-only:     {}", extraction.novasharp_only_count());
    println!("Comparable:         {}", extraction.comparable_count());
    println!();
    println!("By Lua version:");
    println!("  Lua 5.1: {}", extraction.count_for_version("5.1"));
    println!("  Lua 5.2: {}", extraction.count_for_version("5.2"));
    println!("  Lua 5.3: {}", extraction.count_for_version("5.3"));
    println!("  Lua 5.4: {}", extraction.count_for_version("5.4"));

    if !extraction.errors.is_empty() {
        println!();
        println!("Errors: {}", extraction.errors.len());
        for err in extraction.errors.iter().take(5) {
            println!("  - {}", err);
        }
    }
}
