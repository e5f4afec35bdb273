//! Load command CLI handler.

use crate::loader::{self, HttpOptions, LoadConfig, LoadReport, LoadYamlConfig, DEFAULT_MAX_ERRORS};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct LoadArgs {
    pub file: PathBuf,
    pub url: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout: Option<u64>,
    pub config: Option<PathBuf>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub max_errors: Option<usize>,
    pub json: bool,
}

#[derive(Serialize)]
struct LoadJsonOutput<'a> {
    input_file: String,
    url: &'a str,
    batch_size: usize,
    elapsed_secs: f64,
    status: &'static str,
    report: &'a LoadReport,
}

/// Merge CLI flags over the YAML config (if any) over built-in defaults.
fn resolve(args: &LoadArgs) -> anyhow::Result<(LoadConfig, usize)> {
    let yaml = match &args.config {
        Some(path) => LoadYamlConfig::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", path.display(), e))?,
        None => LoadYamlConfig::default(),
    };
    let defaults = LoadConfig::default();
    let http_defaults = HttpOptions::default();

    let url = args
        .url
        .clone()
        .or(yaml.connection.url)
        .ok_or_else(|| {
            anyhow::anyhow!("ClickHouse URL required: pass <URL> or set connection.url in --config")
        })?;

    let config = LoadConfig {
        input: args.file.clone(),
        url,
        batch_size: args
            .batch_size
            .or(yaml.batch.batch_size)
            .unwrap_or(defaults.batch_size),
        http: HttpOptions {
            timeout: args
                .timeout
                .or(yaml.connection.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(http_defaults.timeout),
            database: args.database.clone().or(yaml.connection.database),
            user: args.user.clone().or(yaml.connection.user),
            password: args.password.clone().or(yaml.connection.password),
        },
    };
    let max_errors = args
        .max_errors
        .or(yaml.batch.max_errors)
        .unwrap_or(DEFAULT_MAX_ERRORS);

    Ok((config, max_errors))
}

pub fn run(args: LoadArgs) -> anyhow::Result<()> {
    let (config, max_errors) = resolve(&args)?;

    let start = Instant::now();
    let report = loader::run(&config)?;
    let elapsed = start.elapsed();

    if args.json {
        let output_json = LoadJsonOutput {
            input_file: config.input.display().to_string(),
            url: &config.url,
            batch_size: config.batch_size,
            elapsed_secs: elapsed.as_secs_f64(),
            status: if report.is_success() { "ok" } else { "failed" },
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output_json)?);
    } else {
        eprintln!(
            "Loaded {} rows in {} batches, {} statements executed ({:.2}s)",
            report.rows_loaded,
            report.batches_loaded,
            report.statements_executed,
            elapsed.as_secs_f64()
        );
    }

    if !report.is_success() {
        report.print_errors(max_errors);
        anyhow::bail!("{} requests failed", report.errors.len());
    }

    Ok(())
}
