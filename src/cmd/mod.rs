mod convert;
mod load;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use log::LevelFilter;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fixture-shift")]
#[command(version)]
#[command(
    about = "Convert time-anchored SQL test fixtures for PostgreSQL and ClickHouse",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a canonical fixture to a target dialect
    Convert {
        /// Canonical fixture file
        file: PathBuf,

        /// Target dialect: postgres or clickhouse
        #[arg(short, long)]
        to: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Conversion instant, UTC (default: now). Accepts
        /// "YYYY-MM-DD HH:MM:SS[.fff]" or RFC 3339
        #[arg(long)]
        anchor: Option<String>,

        /// Preview without writing output (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Show progress during processing
        #[arg(short, long)]
        progress: bool,

        /// Output statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a converted fixture into ClickHouse over HTTP
    Load {
        /// Converted fixture file
        file: PathBuf,

        /// ClickHouse HTTP URL, e.g. http://localhost:8123
        url: Option<String>,

        /// Rows per multi-row INSERT [default: 100]
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Request timeout in seconds [default: 30]
        #[arg(long)]
        timeout: Option<u64>,

        /// YAML config file with connection and batch settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// ClickHouse database
        #[arg(long)]
        database: Option<String>,

        /// ClickHouse user
        #[arg(long)]
        user: Option<String>,

        /// ClickHouse password
        #[arg(long)]
        password: Option<String>,

        /// Errors to print before summarizing the rest [default: 10]
        #[arg(long)]
        max_errors: Option<usize>,

        /// Output the load report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Initialize `env_logger` from `RUST_LOG`, defaulting to warnings.
/// `--verbose` forces debug output for this crate.
fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
        builder.filter_module("reqwest", LevelFilter::Info);
        builder.filter_module("hyper_util", LevelFilter::Info);
    }
    // A logger may already be installed (tests)
    let _ = builder.try_init();
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_logger(cli.verbose);

    match cli.command {
        Commands::Convert {
            file,
            to,
            output,
            anchor,
            dry_run,
            progress,
            json,
        } => convert::run(file, to, output, anchor, dry_run, progress, json),
        Commands::Load {
            file,
            url,
            batch_size,
            timeout,
            config,
            database,
            user,
            password,
            max_errors,
            json,
        } => load::run(load::LoadArgs {
            file,
            url,
            batch_size,
            timeout,
            config,
            database,
            user,
            password,
            max_errors,
            json,
        }),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "fixture-shift",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
