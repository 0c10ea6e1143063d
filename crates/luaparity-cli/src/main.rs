use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;
mod config;

/// Differential testing pipeline for the NovaSharp Lua interpreter.
///
/// LuaParity mines the NovaSharp test suites for embedded Lua snippets,
/// runs the resulting fixture corpus against reference Lua interpreters
/// and the NovaSharp CLI, and compares the captured outputs to surface
/// behavioral divergences.
///
/// EXAMPLES:
///     luaparity extract --test-dir src/tests      Build the fixture corpus
///     luaparity run --lua-version 5.4             Execute all fixtures
///     luaparity compare --lua-version 5.4         Compare captured outputs
///     luaparity compare --enforce                 Gate CI on mismatches
///
/// ENVIRONMENT VARIABLES:
///     LUAPARITY_LUA_VERSION   Default Lua version for run and compare
///     LUAPARITY_NO_COLOR      Disable colored output
///     NO_COLOR                Disable colored output (standard)
#[derive(Parser)]
#[command(name = "luaparity")]
#[command(version)]
#[command(propagate_version = true)]
#[command(after_help = "For more information, see: https://github.com/wallstop-studios/luaparity")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract Lua fixtures from C# test sources
    ///
    /// Scans the given test directories for DoString calls with
    /// string-literal arguments, infers Lua version compatibility for
    /// each snippet, and writes the fixture corpus plus manifest.json.
    ///
    /// EXAMPLES:
    ///     luaparity extract --test-dir src/tests
    ///     luaparity extract --test-dir a --test-dir b --dry-run
    ///     luaparity extract --test-dir src/tests --manifest-only
    #[command(visible_alias = "x")]
    Extract {
        /// C# test source directory (can be repeated)
        #[arg(long = "test-dir", required = true)]
        test_dir: Vec<PathBuf>,
        /// Directory the corpus is written under
        #[arg(long, default_value = "lua-corpus")]
        output_dir: PathBuf,
        /// Don't write files, just show what would be extracted
        #[arg(long)]
        dry_run: bool,
        /// Only write the manifest file, not individual Lua files
        #[arg(long)]
        manifest_only: bool,
        /// List every extracted fixture path
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Run fixtures against the reference interpreter and NovaSharp
    ///
    /// Executes every version-compatible fixture under a parallel
    /// worker pool, capturing stdout, stderr, and exit code per
    /// interpreter, and writes results.json. Always exits 0; gating
    /// happens in 'compare'.
    ///
    /// EXAMPLES:
    ///     luaparity run --nova-cmd "dotnet exec NovaSharp.Cli.dll"
    ///     luaparity run --lua-version 5.1 --skip-novasharp
    ///     luaparity run --limit 50 -j 4 --verbose
    #[command(visible_alias = "r")]
    Run {
        /// Directory containing Lua fixtures
        #[arg(long, default_value = "lua-corpus")]
        fixtures_dir: PathBuf,
        /// Directory for captured outputs and results.json
        #[arg(long, default_value = "lua-comparison-results")]
        output_dir: PathBuf,
        /// Lua version to test against
        #[arg(
            long,
            env = "LUAPARITY_LUA_VERSION",
            default_value = "5.4",
            value_parser = ["5.1", "5.2", "5.3", "5.4", "5.5"]
        )]
        lua_version: String,
        /// Override the reference interpreter command (default: lua{version})
        #[arg(long)]
        lua_cmd: Option<String>,
        /// NovaSharp CLI invocation
        #[arg(long)]
        nova_cmd: Option<String>,
        /// Build command run once before any fixture executes
        #[arg(long)]
        nova_build_cmd: Option<String>,
        /// Skip NovaSharp execution
        #[arg(long)]
        skip_novasharp: bool,
        /// Skip reference Lua execution
        #[arg(long)]
        skip_lua: bool,
        /// Limit number of fixtures to process (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// Number of parallel workers (0 = all cores)
        #[arg(long, short = 'j', default_value_t = 0)]
        workers: usize,
        /// Print one line per completed fixture
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Compare captured outputs and report divergences
    ///
    /// Classifies each fixture's Lua-vs-NovaSharp output pair, applying
    /// output normalization and the known-divergence allowlist, then
    /// writes comparison.json and prints the match rate.
    ///
    /// EXAMPLES:
    ///     luaparity compare --lua-version 5.4
    ///     luaparity compare --strict --verbose
    ///     luaparity compare --enforce --allowlist divergences.json
    ///     luaparity compare --lua-version 5.5 --monitor
    #[command(visible_alias = "c")]
    Compare {
        /// Directory holding the captured outputs
        #[arg(long, default_value = "lua-comparison-results")]
        results_dir: PathBuf,
        /// Fixture corpus directory (metadata source)
        #[arg(long, default_value = "lua-corpus")]
        corpus_dir: PathBuf,
        /// Report path (default: <results-dir>/comparison.json)
        #[arg(long)]
        output_file: Option<PathBuf>,
        /// Lua version the captures were produced against
        #[arg(
            long,
            env = "LUAPARITY_LUA_VERSION",
            default_value = "5.4",
            value_parser = ["5.1", "5.2", "5.3", "5.4", "5.5"]
        )]
        lua_version: String,
        /// JSON array of fixture paths accepted as known divergences
        #[arg(long)]
        allowlist: Option<PathBuf>,
        /// Exact comparison only, no normalization
        #[arg(long)]
        strict: bool,
        /// Print each mismatch as it is found
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Exit 1 if any unexpected mismatch remains
        #[arg(long)]
        enforce: bool,
        /// Report without failing (for experimental versions like 5.5)
        #[arg(long)]
        monitor: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs shell completion scripts for bash, zsh, fish, or
    /// powershell. Redirect to a file and source it in your shell
    /// configuration.
    ///
    /// EXAMPLES:
    ///     luaparity completions bash > ~/.bash_completions/luaparity.bash
    ///     luaparity completions zsh > ~/.zfunc/_luaparity
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Extract {
            test_dir,
            output_dir,
            dry_run,
            manifest_only,
            verbose,
        } => {
            let args = commands::extract::ExtractArgs {
                test_dirs: test_dir,
                output_dir,
                dry_run,
                manifest_only,
                verbose,
            };
            commands::extract::run(args)?;
        }
        Commands::Run {
            fixtures_dir,
            output_dir,
            lua_version,
            lua_cmd,
            nova_cmd,
            nova_build_cmd,
            skip_novasharp,
            skip_lua,
            limit,
            workers,
            verbose,
        } => {
            let args = commands::run::RunArgs {
                fixtures_dir,
                output_dir,
                lua_version,
                lua_cmd,
                nova_cmd,
                nova_build_cmd,
                skip_novasharp,
                skip_lua,
                limit,
                workers,
                verbose,
            };
            commands::run::run(args)?;
        }
        Commands::Compare {
            results_dir,
            corpus_dir,
            output_file,
            lua_version,
            allowlist,
            strict,
            verbose,
            enforce,
            monitor,
        } => {
            let args = commands::compare::CompareArgs {
                results_dir,
                corpus_dir,
                output_file,
                lua_version,
                allowlist,
                strict,
                verbose,
                enforce,
                monitor,
            };
            commands::compare::run(args, &cli_config)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
