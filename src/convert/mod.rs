//! Convert command: rewrite a canonical fixture for a target backend.
//!
//! The canonical fixture is read once, split into statements and each
//! `INSERT` is re-emitted through the target dialect's [`Emitter`] with
//! its timestamps relativized against one [`Anchor`]. The output carries a
//! header, the dialect's schema and clear statements, the converted rows
//! and a summary of row counts.

mod warnings;

use crate::dialect::{emitter_for, Emitter, FixtureTable, RowError, TargetDialect};
use crate::parser::{classify, parse_insert_values, StatementKind, StatementReader, SMALL_BUFFER_SIZE};
use crate::timeshift::Anchor;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub use warnings::{preview, ConvertWarning, WarningCollector};

/// Configuration for the convert command
#[derive(Debug)]
pub struct ConvertConfig {
    /// Canonical fixture file
    pub input: PathBuf,
    /// Output fixture file (None for stdout)
    pub output: Option<PathBuf>,
    /// Target dialect
    pub to_dialect: TargetDialect,
    /// Conversion instant (current time if None)
    pub anchor: Option<Anchor>,
    /// Dry run mode
    pub dry_run: bool,
    /// Show progress
    pub progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            to_dialect: TargetDialect::ClickHouse,
            anchor: None,
            dry_run: false,
            progress: false,
        }
    }
}

/// Statistics from convert operation
#[derive(Debug, Default, Clone, Serialize)]
pub struct ConvertStats {
    /// Total statements read from the fixture
    pub statements_processed: u64,
    pub events_converted: u64,
    pub list_entries_converted: u64,
    /// Rows rejected by the arity check or without a VALUES tuple
    pub rows_skipped: u64,
    /// Timestamps emitted as a backend-side parse
    pub timestamps_unparsed: u64,
    /// Statements not carried over (unknown tables, TRUNCATE, DROP, ...)
    pub statements_ignored: u64,
    pub warnings: Vec<ConvertWarning>,
}

impl ConvertStats {
    pub fn rows_converted(&self) -> u64 {
        self.events_converted + self.list_entries_converted
    }
}

/// Statement-by-statement fixture converter for one target dialect.
pub struct Converter {
    emitter: Box<dyn Emitter>,
    anchor: Anchor,
    warnings: WarningCollector,
    stats: ConvertStats,
}

impl Converter {
    pub fn new(dialect: TargetDialect, anchor: Anchor) -> Self {
        Self {
            emitter: emitter_for(dialect),
            anchor,
            warnings: WarningCollector::new(),
            stats: ConvertStats::default(),
        }
    }

    pub fn with_warning_limit(mut self, limit: usize) -> Self {
        self.warnings = WarningCollector::with_limit(limit);
        self
    }

    pub fn dialect(&self) -> TargetDialect {
        self.emitter.dialect()
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn stats(&self) -> &ConvertStats {
        &self.stats
    }

    /// Convert a single statement.
    ///
    /// Returns `Ok(None)` for statements the target fixture replaces with
    /// its own (schema DDL, `DELETE FROM`) and for comments.
    pub fn convert_statement(
        &mut self,
        line: usize,
        stmt: &str,
    ) -> Result<Option<String>, ConvertWarning> {
        let (kind, table_name) = classify(stmt);

        match kind {
            StatementKind::Insert => self.convert_insert(line, stmt, &table_name).map(Some),
            StatementKind::CreateTable
            | StatementKind::CreateIndex
            | StatementKind::Delete
            | StatementKind::Comment
            | StatementKind::Blank => Ok(None),
            StatementKind::Truncate | StatementKind::Drop | StatementKind::Other => {
                Err(ConvertWarning::IgnoredStatement {
                    statement_preview: preview(stmt),
                })
            }
        }
    }

    fn convert_insert(
        &mut self,
        line: usize,
        stmt: &str,
        table_name: &str,
    ) -> Result<String, ConvertWarning> {
        let skipped = |err: RowError| ConvertWarning::SkippedRow {
            line,
            reason: err.to_string(),
            statement_preview: preview(stmt),
        };

        let table = FixtureTable::from_name(table_name).ok_or_else(|| {
            ConvertWarning::UnsupportedTable {
                table: table_name.to_string(),
            }
        })?;
        let row = parse_insert_values(stmt).ok_or_else(|| skipped(RowError::MissingValues))?;
        let converted = self
            .emitter
            .convert_row(table, &row, &self.anchor)
            .map_err(skipped)?;

        for literal in &converted.fallbacks {
            warn!("line {}: unparsed timestamp '{}'", line, literal);
            self.stats.timestamps_unparsed += 1;
            self.warnings.add(ConvertWarning::UnparsedTimestamp {
                line,
                literal: literal.clone(),
            });
        }

        match table {
            FixtureTable::Events => self.stats.events_converted += 1,
            FixtureTable::ListEntries => self.stats.list_entries_converted += 1,
        }
        Ok(self.emitter.render(&converted))
    }

    /// Convert a statement and record its outcome in the stats.
    pub fn process(&mut self, line: usize, stmt: &str) -> Option<String> {
        self.stats.statements_processed += 1;

        match self.convert_statement(line, stmt) {
            Ok(converted) => converted,
            Err(warning) => {
                match warning {
                    ConvertWarning::SkippedRow { .. } => {
                        warn!("{}", warning);
                        self.stats.rows_skipped += 1;
                    }
                    _ => {
                        debug!("{}", warning);
                        self.stats.statements_ignored += 1;
                    }
                }
                self.warnings.add(warning);
                None
            }
        }
    }

    /// Write the header comment block.
    pub fn write_header(&self, writer: &mut dyn Write, source: &str) -> std::io::Result<()> {
        writeln!(writer, "-- Test Data for {}", self.dialect().title())?;
        writeln!(
            writer,
            "-- Generated at: {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        )?;
        writeln!(writer, "-- Anchor: {}", self.anchor)?;
        writeln!(writer, "-- Converted from SQLite format")?;
        writeln!(writer, "-- Source: {}", source)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the schema DDL followed by the clear statements.
    pub fn write_preamble(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", self.emitter.schema())?;
        writeln!(writer, "-- Clear existing data")?;
        for stmt in self.emitter.clear() {
            writeln!(writer, "{}", stmt)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write the trailing row-count comments.
    pub fn write_summary(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer)?;
        writeln!(
            writer,
            "-- Total events inserted: {}",
            self.stats.events_converted
        )?;
        writeln!(
            writer,
            "-- Total list entries inserted: {}",
            self.stats.list_entries_converted
        )?;
        if self.stats.rows_skipped > 0 {
            writeln!(writer, "-- Rows skipped: {}", self.stats.rows_skipped)?;
        }
        Ok(())
    }

    /// Collected warnings
    pub fn warnings(&self) -> &[ConvertWarning] {
        self.warnings.warnings()
    }

    pub fn finish(self) -> ConvertStats {
        let mut stats = self.stats;
        stats.warnings = self.warnings.into_warnings();
        stats
    }
}

/// Convert a whole fixture held in memory, writing the complete target
/// fixture to `writer`.
pub fn convert_fixture(
    source: &str,
    writer: &mut dyn Write,
    converter: &mut Converter,
    label: &str,
    progress: Option<&ProgressBar>,
) -> std::io::Result<()> {
    converter.write_header(writer, label)?;
    converter.write_preamble(writer)?;

    let mut reader = StatementReader::new(source.as_bytes(), SMALL_BUFFER_SIZE);
    while let Some(stmt) = reader.read_statement()? {
        let line = reader.statement_line();
        if let Some(converted) = converter.process(line, &stmt) {
            writer.write_all(converted.as_bytes())?;
            writer.write_all(b"\n")?;
        }

        if let Some(pb) = progress {
            let processed = converter.stats().statements_processed;
            if processed % 1000 == 0 {
                pb.set_message(format!("Processed {} statements...", processed));
            }
        }
    }

    converter.write_summary(writer)
}

/// Convert a fixture string to a target fixture string.
pub fn convert_str(
    source: &str,
    dialect: TargetDialect,
    anchor: Anchor,
) -> std::io::Result<(String, ConvertStats)> {
    let mut converter = Converter::new(dialect, anchor);
    let mut out = Vec::with_capacity(source.len() * 2);
    convert_fixture(source, &mut out, &mut converter, "<memory>", None)?;
    Ok((
        String::from_utf8_lossy(&out).into_owned(),
        converter.finish(),
    ))
}

pub fn run(config: ConvertConfig) -> anyhow::Result<ConvertStats> {
    if !config.input.exists() {
        anyhow::bail!("input file does not exist: {}", config.input.display());
    }
    let source = std::fs::read_to_string(&config.input)
        .with_context(|| format!("failed to read {}", config.input.display()))?;

    let anchor = config.anchor.unwrap_or_else(Anchor::now);
    debug!("converting {} to {} at {}", config.input.display(), config.to_dialect, anchor);

    let progress_bar = if config.progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message("Converting...");
        Some(pb)
    } else {
        None
    };

    let mut converter = Converter::new(config.to_dialect, anchor);

    let mut writer: Box<dyn Write> = if config.dry_run {
        Box::new(std::io::sink())
    } else {
        match &config.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Box::new(BufWriter::with_capacity(256 * 1024, file))
            }
            None => Box::new(BufWriter::new(std::io::stdout())),
        }
    };

    let label = config
        .input
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| config.input.display().to_string());

    convert_fixture(
        &source,
        &mut *writer,
        &mut converter,
        &label,
        progress_bar.as_ref(),
    )?;
    writer.flush()?;

    let stats = converter.finish();

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Converted {} rows", stats.rows_converted()));
    }

    Ok(stats)
}
