//! Warning system for the convert command.
//!
//! Tracks rows that could not be converted, timestamps left to the backend
//! to parse, and statements the converter drops.

use serde::Serialize;

/// Warning types that can occur during conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvertWarning {
    /// Row rejected (arity mismatch, missing VALUES tuple)
    SkippedRow {
        line: usize,
        reason: String,
        statement_preview: String,
    },
    /// Timestamp literal that could not be parsed; emitted as a runtime parse
    UnparsedTimestamp { line: usize, literal: String },
    /// INSERT into a table without a known layout
    UnsupportedTable { table: String },
    /// Statement kind the converter does not carry over
    IgnoredStatement { statement_preview: String },
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertWarning::SkippedRow {
                line,
                reason,
                statement_preview,
            } => {
                write!(
                    f,
                    "Skipped row at line {}: {} ({})",
                    line, reason, statement_preview
                )
            }
            ConvertWarning::UnparsedTimestamp { line, literal } => {
                write!(
                    f,
                    "Unparsed timestamp at line {}: '{}' (left to the backend to parse)",
                    line, literal
                )
            }
            ConvertWarning::UnsupportedTable { table } => {
                write!(f, "Unsupported table '{}': INSERT statements dropped", table)
            }
            ConvertWarning::IgnoredStatement { statement_preview } => {
                write!(f, "Ignored statement: {}", statement_preview)
            }
        }
    }
}

/// First 60 characters of a statement, for warning messages.
pub fn preview(stmt: &str) -> String {
    let trimmed = stmt.trim();
    if trimmed.chars().count() > 60 {
        let head: String = trimmed.chars().take(60).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// Collects warnings during conversion
#[derive(Debug, Default)]
pub struct WarningCollector {
    warnings: Vec<ConvertWarning>,
    max_warnings: usize,
    dropped: usize,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: 100,
            dropped: 0,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: limit,
            dropped: 0,
        }
    }

    /// Add a warning
    pub fn add(&mut self, warning: ConvertWarning) {
        if self.warnings.iter().any(|w| Self::is_similar(w, &warning)) {
            return;
        }
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        } else {
            self.dropped += 1;
        }
    }

    /// Check if two warnings are similar enough to deduplicate
    fn is_similar(a: &ConvertWarning, b: &ConvertWarning) -> bool {
        match (a, b) {
            (
                ConvertWarning::UnsupportedTable { table: t1 },
                ConvertWarning::UnsupportedTable { table: t2 },
            ) => t1 == t2,
            (
                ConvertWarning::IgnoredStatement {
                    statement_preview: p1,
                },
                ConvertWarning::IgnoredStatement {
                    statement_preview: p2,
                },
            ) => p1 == p2,
            _ => false,
        }
    }

    /// Get all collected warnings
    pub fn warnings(&self) -> &[ConvertWarning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// Warnings not kept because the limit was reached
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_warnings(self) -> Vec<ConvertWarning> {
        self.warnings
    }

    /// Print summary of warnings
    pub fn print_summary(&self) {
        if self.warnings.is_empty() {
            return;
        }

        eprintln!("\nConversion warnings ({}):", self.warnings.len());
        for warning in &self.warnings {
            eprintln!("  ⚠ {}", warning);
        }

        if self.dropped > 0 {
            eprintln!("  ... and {} more warnings", self.dropped);
        }
    }
}
