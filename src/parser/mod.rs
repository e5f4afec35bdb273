pub mod values;

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};

pub use values::{extract_values, parse_insert_values, tokenize, Field, ParsedRow, QuoteState};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Blank,
    Comment,
    CreateTable,
    CreateIndex,
    Insert,
    Delete,
    Truncate,
    Drop,
    Other,
}

impl StatementKind {
    pub fn is_insert(self) -> bool {
        self == StatementKind::Insert
    }
}

static INSERT_INTO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*INSERT\s+INTO\s+[`"]?([^\s`"(]+)[`"]?"#).unwrap());

static DELETE_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^\s*DELETE\s+FROM\s+[`"]?([^\s`";]+)[`"]?"#).unwrap());

static TRUNCATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*TRUNCATE\s+(?:TABLE\s+)?(?:IF\s+EXISTS\s+)?[`"]?([^\s`";]+)[`"]?"#)
        .unwrap()
});

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"]?([^\s`"(]+)[`"]?"#)
        .unwrap()
});

static CREATE_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bON\s+[`"]?([^\s`"(;]+)[`"]?"#).unwrap());

static DROP_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?[`"]?([^\s`";]+)[`"]?"#).unwrap()
});

/// Classify one statement (or fixture line) and extract its table name.
///
/// The table name is empty when the statement kind has none or it could
/// not be extracted.
pub fn classify(stmt: &str) -> (StatementKind, String) {
    let trimmed = stmt.trim_start();

    if trimmed.trim_end().is_empty() {
        return (StatementKind::Blank, String::new());
    }
    if trimmed.starts_with("--") {
        return (StatementKind::Comment, String::new());
    }

    let upper_prefix: String = trimmed
        .chars()
        .take(32)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let (kind, re): (StatementKind, &Regex) = if upper_prefix.starts_with("INSERT") {
        (StatementKind::Insert, &*INSERT_INTO_RE)
    } else if upper_prefix.starts_with("CREATE TABLE") {
        (StatementKind::CreateTable, &*CREATE_TABLE_RE)
    } else if upper_prefix.starts_with("CREATE INDEX")
        || upper_prefix.starts_with("CREATE UNIQUE INDEX")
    {
        (StatementKind::CreateIndex, &*CREATE_INDEX_RE)
    } else if upper_prefix.starts_with("DELETE") {
        (StatementKind::Delete, &*DELETE_FROM_RE)
    } else if upper_prefix.starts_with("TRUNCATE") {
        (StatementKind::Truncate, &*TRUNCATE_RE)
    } else if upper_prefix.starts_with("DROP") {
        (StatementKind::Drop, &*DROP_TABLE_RE)
    } else {
        return (StatementKind::Other, String::new());
    };

    let table = re
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    (kind, table)
}

/// Reads `;`-terminated statements from a fixture stream.
///
/// A statement ends at a line whose last non-blank character is a `;`
/// outside any quoted literal. Blank lines between statements and `--`
/// comment lines outside literals are skipped.
pub struct StatementReader<R: Read> {
    reader: BufReader<R>,
    line: String,
    stmt_buffer: String,
    quote: QuoteState,
    line_no: usize,
    stmt_line: usize,
}

impl<R: Read> StatementReader<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            line: String::new(),
            stmt_buffer: String::with_capacity(4 * 1024),
            quote: QuoteState::Unquoted,
            line_no: 0,
            stmt_line: 0,
        }
    }

    /// 1-based line on which the last returned statement started.
    pub fn statement_line(&self) -> usize {
        self.stmt_line
    }

    pub fn read_statement(&mut self) -> std::io::Result<Option<String>> {
        self.stmt_buffer.clear();
        self.quote = QuoteState::Unquoted;

        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                let rest = self.stmt_buffer.trim();
                if rest.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(rest.to_string()));
            }
            self.line_no += 1;

            let trimmed = self.line.trim();
            if self.stmt_buffer.is_empty() && (trimmed.is_empty() || trimmed.starts_with("--")) {
                continue;
            }
            // Comment lines inside a statement body carry no quotes or terminator
            if !self.quote.in_quote() && trimmed.starts_with("--") {
                continue;
            }
            if self.stmt_buffer.is_empty() {
                self.stmt_line = self.line_no;
            }

            for ch in self.line.chars() {
                self.quote = self.quote.step(ch).0;
            }
            self.stmt_buffer.push_str(&self.line);

            if !self.quote.in_quote() && trimmed.ends_with(';') {
                let stmt = self.stmt_buffer.trim().to_string();
                return Ok(Some(stmt));
            }
        }
    }
}

impl<R: Read> Iterator for StatementReader<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_statement().transpose()
    }
}
