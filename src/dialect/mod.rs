//! Target dialects for converted fixtures.
//!
//! Each dialect provides an [`Emitter`]: static schema and clear
//! statements, row conversion (tokenized fields plus relativized
//! timestamps), and `INSERT` rendering with an explicit column list.

mod clickhouse;
mod postgres;

pub use clickhouse::ClickHouseEmitter;
pub use postgres::PostgresEmitter;

use crate::parser::values::ParsedRow;
use crate::timeshift::{now_expr, relativize, Anchor, TimeExpr};
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Backend a fixture is converted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDialect {
    Postgres,
    ClickHouse,
}

impl std::str::FromStr for TargetDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(TargetDialect::Postgres),
            "clickhouse" | "ch" => Ok(TargetDialect::ClickHouse),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: postgres, clickhouse",
                s
            )),
        }
    }
}

impl fmt::Display for TargetDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDialect::Postgres => write!(f, "postgres"),
            TargetDialect::ClickHouse => write!(f, "clickhouse"),
        }
    }
}

impl TargetDialect {
    /// Human-readable backend name for file headers
    pub fn title(&self) -> &'static str {
        match self {
            TargetDialect::Postgres => "PostgreSQL",
            TargetDialect::ClickHouse => "ClickHouse",
        }
    }
}

/// Tables a canonical fixture may populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureTable {
    Events,
    ListEntries,
}

/// Source column order of `events` rows.
pub const EVENT_COLUMNS: [&str; 14] = [
    "event_type",
    "user_id",
    "timestamp",
    "status",
    "amount",
    "currency",
    "merchant_id",
    "device_id",
    "ip_address",
    "country",
    "email",
    "phone",
    "metadata",
    "attributes",
];

/// Index of the event time within [`EVENT_COLUMNS`].
pub const EVENT_TIMESTAMP_INDEX: usize = 2;

/// Source column order of `list_entries` rows; the last two are optional.
pub const LIST_ENTRY_SOURCE_COLUMNS: [&str; 4] = ["list_id", "value", "expires_at", "metadata"];

/// Emitted column order of `list_entries` rows (`created_at` is filled in).
pub const LIST_ENTRY_COLUMNS: [&str; 5] =
    ["list_id", "value", "created_at", "expires_at", "metadata"];

impl FixtureTable {
    /// Resolve a table name from an INSERT statement.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim_matches(|c| c == '"' || c == '`');
        if name.eq_ignore_ascii_case("events") {
            Some(FixtureTable::Events)
        } else if name.eq_ignore_ascii_case("list_entries") {
            Some(FixtureTable::ListEntries)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FixtureTable::Events => "events",
            FixtureTable::ListEntries => "list_entries",
        }
    }

    /// Accepted field counts of a source row.
    pub fn arity(&self) -> RangeInclusive<usize> {
        match self {
            FixtureTable::Events => EVENT_COLUMNS.len()..=EVENT_COLUMNS.len(),
            FixtureTable::ListEntries => 2..=LIST_ENTRY_SOURCE_COLUMNS.len(),
        }
    }

    /// Column list of emitted rows, excluding any synthetic id.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FixtureTable::Events => &EVENT_COLUMNS,
            FixtureTable::ListEntries => &LIST_ENTRY_COLUMNS,
        }
    }

    /// Check the field count, then reject rows with an empty field.
    pub fn check_arity(&self, row: &ParsedRow) -> Result<(), RowError> {
        let arity = self.arity();
        if arity.contains(&row.len()) {
            return match row.fields.iter().position(|f| f.is_empty()) {
                Some(index) => Err(RowError::EmptyField { index: index + 1 }),
                None => Ok(()),
            };
        }
        let expected = if arity.start() == arity.end() {
            arity.start().to_string()
        } else {
            format!("{}-{}", arity.start(), arity.end())
        };
        Err(RowError::Arity {
            table: *self,
            found: row.len(),
            expected,
        })
    }
}

impl fmt::Display for FixtureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a fixture row could not be converted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("{table} row has {found} fields, expected {expected}")]
    Arity {
        table: FixtureTable,
        found: usize,
        expected: String,
    },
    #[error("INSERT statement has no VALUES tuple")]
    MissingValues,
    #[error("field {index} is empty")]
    EmptyField { index: usize },
    #[error("unsupported table: {0}")]
    UnknownTable(String),
}

/// A fixture row rewritten for one dialect, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedRow {
    pub table: FixtureTable,
    /// Synthetic primary key, for dialects without auto-generated ids.
    pub id: Option<u64>,
    pub columns: &'static [&'static str],
    /// Rendered SQL expressions, parallel to `columns`.
    pub values: Vec<String>,
    /// Timestamp literals that fell back to a backend-side parse.
    pub fallbacks: Vec<String>,
}

/// Dialect-specific fixture writer.
pub trait Emitter {
    fn dialect(&self) -> TargetDialect;

    /// DDL for `events` and `list_entries`.
    fn schema(&self) -> &'static str;

    /// Statements emptying both tables.
    fn clear(&self) -> &'static [&'static str];

    /// Rewrite one parsed source row.
    fn convert_row(
        &mut self,
        table: FixtureTable,
        row: &ParsedRow,
        anchor: &Anchor,
    ) -> Result<ConvertedRow, RowError>;

    /// Serialize a converted row as one `INSERT` statement.
    fn render(&self, row: &ConvertedRow) -> String {
        let mut columns = Vec::with_capacity(row.columns.len() + 1);
        let mut values = Vec::with_capacity(row.values.len() + 1);
        if let Some(id) = row.id {
            columns.push("id".to_string());
            values.push(id.to_string());
        }
        columns.extend(row.columns.iter().map(|c| c.to_string()));
        values.extend(row.values.iter().cloned());

        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            row.table,
            columns.join(", "),
            values.join(", ")
        )
    }
}

/// Create the emitter for a dialect.
pub fn emitter_for(dialect: TargetDialect) -> Box<dyn Emitter> {
    match dialect {
        TargetDialect::Postgres => Box::new(PostgresEmitter::new()),
        TargetDialect::ClickHouse => Box::new(ClickHouseEmitter::new()),
    }
}

/// Column conversion shared by all dialects: arity check, timestamp
/// relativization, NULL normalization and `created_at` filling.
pub(crate) fn convert_fields(
    dialect: TargetDialect,
    table: FixtureTable,
    row: &ParsedRow,
    anchor: &Anchor,
) -> Result<ConvertedRow, RowError> {
    table.check_arity(row)?;

    let mut fallbacks = Vec::new();
    let mut time = |literal: &str| {
        let expr = relativize(literal, anchor);
        if let TimeExpr::Unparsed(ref text) = expr {
            fallbacks.push(text.clone());
        }
        expr.render(dialect)
    };

    let values = match table {
        FixtureTable::Events => row
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                if i == EVENT_TIMESTAMP_INDEX && !field.is_null() {
                    time(&field.unquoted())
                } else {
                    field.as_sql()
                }
            })
            .collect(),
        FixtureTable::ListEntries => {
            let optional = |i: usize| row.get(i).map(|f| f.as_sql());
            let expires_at = match row.get(2) {
                Some(field) if !field.is_null() => time(&field.unquoted()),
                _ => "NULL".to_string(),
            };
            vec![
                row.fields[0].as_sql(),
                row.fields[1].as_sql(),
                now_expr(dialect).to_string(),
                expires_at,
                optional(3).unwrap_or_else(|| "NULL".to_string()),
            ]
        }
    };

    Ok(ConvertedRow {
        table,
        id: None,
        columns: table.columns(),
        values,
        fallbacks,
    })
}
