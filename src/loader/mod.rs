//! Load command: stream a converted fixture into ClickHouse over HTTP.
//!
//! Statements are read one at a time. Single-row inserts are grouped into
//! multi-row inserts by [`batch::BatchState`]; everything else is executed
//! as it comes, after flushing the open batch. Failed requests are recorded
//! in the [`LoadReport`] and loading continues.

pub mod batch;
pub mod config;
pub mod transport;

pub use batch::{BatchState, BatchUnit, Effect, Input, StatementRole, DEFAULT_BATCH_SIZE};
pub use config::LoadYamlConfig;
pub use transport::{check_response, HttpOptions, HttpTransport, Transport, TransportError};

use crate::parser::{StatementReader, SMALL_BUFFER_SIZE};
use anyhow::Context;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// Errors printed before the remainder is summarized
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Configuration for the load command
#[derive(Debug)]
pub struct LoadConfig {
    /// Converted fixture file
    pub input: PathBuf,
    /// Base URL of the ClickHouse HTTP interface
    pub url: String,
    /// Rows per multi-row insert
    pub batch_size: usize,
    pub http: HttpOptions,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            url: "http://localhost:8123".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            http: HttpOptions::default(),
        }
    }
}

/// A failed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    /// What was being sent
    pub context: String,
    pub message: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

/// Outcome of a load pass
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    /// Statements read from the fixture
    pub statements_read: u64,
    /// HTTP requests issued
    pub requests: u64,
    /// Multi-row inserts accepted by the backend
    pub batches_loaded: u64,
    /// Rows contained in accepted batches
    pub rows_loaded: u64,
    /// Standalone statements accepted by the backend
    pub statements_executed: u64,
    pub errors: Vec<LoadError>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print the first `limit` errors, then a count of the rest.
    pub fn print_errors(&self, limit: usize) {
        for error in self.errors.iter().take(limit) {
            eprintln!("Warning: {}", error);
        }
        if self.errors.len() > limit {
            eprintln!("... and {} more errors", self.errors.len() - limit);
        }
    }
}

/// Drives the batcher and performs its effects on a [`Transport`].
pub struct Loader<T: Transport> {
    transport: T,
    state: BatchState,
    batch_size: usize,
    report: LoadReport,
}

impl<T: Transport> Loader<T> {
    pub fn new(transport: T, batch_size: usize) -> Self {
        Self {
            transport,
            state: BatchState::Idle,
            batch_size: batch_size.max(1),
            report: LoadReport::default(),
        }
    }

    /// Handle one complete statement.
    pub fn feed(&mut self, stmt: &str) {
        self.report.statements_read += 1;
        self.apply(Input::from_statement(stmt), false);
    }

    /// Flush the open batch and return the report.
    pub fn finish(mut self) -> LoadReport {
        self.apply(Input::End, true);
        self.report
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    fn apply(&mut self, input: Input, at_end: bool) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = state.step(input, self.batch_size);
        self.state = next;
        for effect in effects {
            self.perform(effect, at_end);
        }
    }

    fn perform(&mut self, effect: Effect, at_end: bool) {
        match effect {
            Effect::Flush(unit) => {
                debug!("flushing {} rows into {}", unit.row_count(), unit.table);
                let context = if at_end {
                    "Final batch insert failed"
                } else {
                    "Batch insert failed"
                };
                if self.send(&unit.render(), context) {
                    self.report.batches_loaded += 1;
                    self.report.rows_loaded += unit.row_count() as u64;
                }
            }
            Effect::Execute { sql, role } => {
                debug!("executing {:?}: {}", role, crate::convert::preview(&sql));
                let context = match role {
                    StatementRole::Statement => "Statement failed",
                    StatementRole::UnbatchableInsert => "Insert failed",
                };
                if self.send(&sql, context) {
                    self.report.statements_executed += 1;
                }
            }
        }
    }

    fn send(&mut self, sql: &str, context: &str) -> bool {
        self.report.requests += 1;
        match self.transport.submit(sql) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: {}", context, e);
                self.report.errors.push(LoadError {
                    context: context.to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }
}

/// Load every statement of `reader` through `transport`.
pub fn load_from_reader<R: Read, T: Transport>(
    reader: R,
    transport: T,
    batch_size: usize,
) -> std::io::Result<LoadReport> {
    let mut loader = Loader::new(transport, batch_size);
    for stmt in StatementReader::new(reader, SMALL_BUFFER_SIZE) {
        loader.feed(&stmt?);
    }
    Ok(loader.finish())
}

pub fn run(config: &LoadConfig) -> anyhow::Result<LoadReport> {
    if !config.input.exists() {
        anyhow::bail!("SQL file not found: {}", config.input.display());
    }
    let file = File::open(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;

    let transport = HttpTransport::new(&config.url, &config.http)?;
    debug!(
        "loading {} into {} (batch size {})",
        config.input.display(),
        transport.endpoint(),
        config.batch_size
    );

    let report = load_from_reader(file, transport, config.batch_size)?;
    Ok(report)
}
