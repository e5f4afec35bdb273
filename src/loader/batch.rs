//! Row batching for HTTP loading.
//!
//! Single-row `INSERT` statements are collapsed into multi-row inserts, one
//! table at a time. The batching rules live in [`BatchState::step`], a pure
//! transition function: the loader feeds it [`Input`]s and performs the
//! returned [`Effect`]s in order.

use crate::parser::{classify, StatementKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Default number of rows per flushed batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

static INSERT_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*INSERT\s+INTO\s+(\w+).*?\bVALUES\s*\((.+)\)\s*;\s*$").unwrap()
});

/// Rows accumulated for one table since the last flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUnit {
    pub table: String,
    /// Value tuples, each including its parentheses
    pub rows: Vec<String>,
}

impl BatchUnit {
    pub fn new(table: String) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Multi-row insert without a column list. Rows must list every column
    /// in table order.
    pub fn render(&self) -> String {
        let mut sql = String::with_capacity(
            self.table.len() + 24 + self.rows.iter().map(|r| r.len() + 2).sum::<usize>(),
        );
        sql.push_str("INSERT INTO ");
        sql.push_str(&self.table);
        sql.push_str(" VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(row);
        }
        sql.push(';');
        sql
    }
}

/// Why a statement is executed on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementRole {
    /// Non-INSERT statement (DDL, TRUNCATE, ...)
    Statement,
    /// INSERT whose table or value tuple could not be extracted
    UnbatchableInsert,
}

/// One statement of the load stream, as seen by the batcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Single-row INSERT; `tuple` includes the parentheses
    Insert { table: String, tuple: String },
    /// INSERT that could not be parsed; sent as-is, batch left open
    Unbatchable(String),
    /// Any other statement; the open batch is flushed first
    Statement(String),
    /// End of input
    End,
}

impl Input {
    /// Classify one complete statement.
    pub fn from_statement(stmt: &str) -> Self {
        let (kind, _) = classify(stmt);
        if kind != StatementKind::Insert {
            return Input::Statement(stmt.to_string());
        }
        match parse_insert(stmt) {
            Some((table, tuple)) => Input::Insert { table, tuple },
            None => Input::Unbatchable(stmt.to_string()),
        }
    }
}

/// Work the loader must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the batch as one multi-row INSERT
    Flush(BatchUnit),
    /// Send a statement on its own
    Execute { sql: String, role: StatementRole },
}

/// Batcher state. At most one batch is open, for the table of the most
/// recent row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BatchState {
    #[default]
    Idle,
    Collecting(BatchUnit),
}

impl BatchState {
    /// Transition function of the batcher.
    ///
    /// `batch_size` values below 1 are treated as 1.
    pub fn step(self, input: Input, batch_size: usize) -> (BatchState, Vec<Effect>) {
        let batch_size = batch_size.max(1);
        let mut effects = Vec::new();

        match (self, input) {
            (BatchState::Collecting(mut unit), Input::Insert { table, tuple })
                if unit.table == table =>
            {
                unit.rows.push(tuple);
                Self::settle(unit, batch_size, effects)
            }
            (state, Input::Insert { table, tuple }) => {
                if let BatchState::Collecting(open) = state {
                    effects.push(Effect::Flush(open));
                }
                let mut unit = BatchUnit::new(table);
                unit.rows.push(tuple);
                Self::settle(unit, batch_size, effects)
            }
            (state, Input::Unbatchable(sql)) => {
                effects.push(Effect::Execute {
                    sql,
                    role: StatementRole::UnbatchableInsert,
                });
                (state, effects)
            }
            (state, Input::Statement(sql)) => {
                if let BatchState::Collecting(open) = state {
                    effects.push(Effect::Flush(open));
                }
                effects.push(Effect::Execute {
                    sql,
                    role: StatementRole::Statement,
                });
                (BatchState::Idle, effects)
            }
            (state, Input::End) => {
                if let BatchState::Collecting(open) = state {
                    effects.push(Effect::Flush(open));
                }
                (BatchState::Idle, effects)
            }
        }
    }

    fn settle(
        unit: BatchUnit,
        batch_size: usize,
        mut effects: Vec<Effect>,
    ) -> (BatchState, Vec<Effect>) {
        if unit.row_count() >= batch_size {
            effects.push(Effect::Flush(unit));
            (BatchState::Idle, effects)
        } else {
            (BatchState::Collecting(unit), effects)
        }
    }

    pub fn pending_rows(&self) -> usize {
        match self {
            BatchState::Idle => 0,
            BatchState::Collecting(unit) => unit.row_count(),
        }
    }
}

/// Extract the table name and parenthesized value tuple of a single-row
/// INSERT. The column list, if any, is dropped.
pub fn parse_insert(stmt: &str) -> Option<(String, String)> {
    let caps = INSERT_ROW_RE.captures(stmt)?;
    let table = caps.get(1)?.as_str().to_string();
    let values = caps.get(2)?.as_str();
    Some((table, format!("({})", values)))
}
