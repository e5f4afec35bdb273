//! CLI for generating canonical fixtures.
//!
//! Usage:
//!   gen-fixtures --scale small --seed 42 > tests/data/test_data.sql
//!   gen-fixtures --scale large --anchor "2024-06-01 00:00:00" -o large.sql

use anyhow::Context;
use chrono::{NaiveDateTime, SubsecRound, Utc};
use clap::Parser;
use fixture_gen::{Generator, Scale};
use std::fs::File;
use std::io::{self, BufWriter, Write};

#[derive(Parser, Debug)]
#[command(name = "gen-fixtures")]
#[command(about = "Generate canonical SQL fixtures for fixture-shift", long_about = None)]
struct Args {
    /// Scale preset: small, medium, large
    #[arg(short, long, default_value = "small")]
    scale: String,

    /// Random seed for reproducibility
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Instant the timestamps are generated relative to, UTC
    /// "YYYY-MM-DD HH:MM:SS" (default: now)
    #[arg(long)]
    anchor: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let scale: Scale = args.scale.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
    let anchor = match &args.anchor {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .with_context(|| format!("invalid anchor: {}", s))?,
        None => Utc::now().naive_utc().trunc_subsecs(6),
    };

    let fixture = Generator::new(args.seed, anchor).generate(scale);

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    fixture.write_sql(&mut writer, &anchor)?;
    writer.flush()?;

    eprintln!(
        "Generated {} events and {} list entries (seed {})",
        fixture.events.len(),
        fixture.list_entries.len(),
        args.seed
    );
    Ok(())
}
