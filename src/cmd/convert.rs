//! Convert command CLI handler.

use crate::convert::{self, ConvertConfig, ConvertStats};
use crate::dialect::TargetDialect;
use crate::timeshift::Anchor;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ConvertJsonOutput {
    input_file: String,
    output_file: Option<String>,
    dialect: TargetDialect,
    anchor: String,
    dry_run: bool,
    statistics: ConvertStats,
}

pub fn run(
    file: PathBuf,
    to_dialect: String,
    output: Option<PathBuf>,
    anchor: Option<String>,
    dry_run: bool,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let to = to_dialect
        .parse::<TargetDialect>()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let anchor = match anchor {
        Some(a) => a.parse::<Anchor>().map_err(|e| anyhow::anyhow!("{}", e))?,
        None => Anchor::now(),
    };

    let config = ConvertConfig {
        input: file.clone(),
        output: output.clone(),
        to_dialect: to,
        anchor: Some(anchor),
        dry_run,
        progress,
    };

    let stats = convert::run(config)?;

    if json {
        // The converted fixture owns stdout unless it goes to a file or nowhere
        let stdout_free = output.is_some() || dry_run;
        let output_json = ConvertJsonOutput {
            input_file: file.display().to_string(),
            output_file: output.map(|p| p.display().to_string()),
            dialect: to,
            anchor: anchor.to_string(),
            dry_run,
            statistics: stats,
        };
        let rendered = serde_json::to_string_pretty(&output_json)?;
        if stdout_free {
            println!("{}", rendered);
        } else {
            eprintln!("{}", rendered);
        }
    } else {
        print_stats(&stats, dry_run, progress);
    }

    Ok(())
}

fn print_stats(stats: &ConvertStats, dry_run: bool, progress: bool) {
    if !stats.warnings.is_empty() {
        eprintln!();
        eprintln!("Warnings ({}):", stats.warnings.len());
        for warning in &stats.warnings {
            eprintln!("  ⚠ {}", warning);
        }
    }

    if !progress && !dry_run {
        return;
    }

    eprintln!();
    eprintln!("Conversion Statistics:");
    eprintln!("  Statements processed: {}", stats.statements_processed);
    eprintln!("  Events converted: {}", stats.events_converted);
    eprintln!("  List entries converted: {}", stats.list_entries_converted);
    eprintln!("  Rows skipped: {}", stats.rows_skipped);
    eprintln!("  Unparsed timestamps: {}", stats.timestamps_unparsed);
    eprintln!("  Statements ignored: {}", stats.statements_ignored);

    if dry_run {
        eprintln!();
        eprintln!("(Dry run - no output written)");
    }
}
