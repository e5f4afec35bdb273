use super::{convert_fields, ConvertedRow, Emitter, FixtureTable, RowError, TargetDialect};
use crate::parser::values::ParsedRow;
use crate::timeshift::Anchor;
use std::collections::HashMap;

const SCHEMA: &str = "\
-- Create events table
CREATE TABLE IF NOT EXISTS events (
    id UInt64,
    event_type String,
    user_id String,
    timestamp DateTime64(3),
    status Nullable(String),
    amount Nullable(Float64),
    currency Nullable(String),
    merchant_id Nullable(String),
    device_id Nullable(String),
    ip_address Nullable(String),
    country Nullable(String),
    email Nullable(String),
    phone Nullable(String),
    metadata Nullable(String),
    attributes Nullable(String)
) ENGINE = MergeTree()
ORDER BY (user_id, timestamp)
PARTITION BY toYYYYMM(timestamp);

-- Create list_entries table
CREATE TABLE IF NOT EXISTS list_entries (
    id UInt64,
    list_id String,
    value String,
    created_at DateTime64(3) DEFAULT now64(3),
    expires_at Nullable(DateTime64(3)),
    metadata Nullable(String)
) ENGINE = MergeTree()
ORDER BY (list_id, value);

-- Note: ClickHouse uses ORDER BY for primary indexing
-- Secondary indexes can be added with ALTER TABLE if needed
";

const CLEAR: &[&str] = &[
    "TRUNCATE TABLE IF EXISTS events;",
    "TRUNCATE TABLE IF EXISTS list_entries;",
];

/// ClickHouse emitter.
///
/// MergeTree tables have no auto-increment, so every accepted row gets an
/// explicit id, sequential per table and starting at 1. Skipped rows do not
/// consume an id.
#[derive(Debug, Default)]
pub struct ClickHouseEmitter {
    next_ids: HashMap<FixtureTable, u64>,
}

impl ClickHouseEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for ClickHouseEmitter {
    fn dialect(&self) -> TargetDialect {
        TargetDialect::ClickHouse
    }

    fn schema(&self) -> &'static str {
        SCHEMA
    }

    fn clear(&self) -> &'static [&'static str] {
        CLEAR
    }

    fn convert_row(
        &mut self,
        table: FixtureTable,
        row: &ParsedRow,
        anchor: &Anchor,
    ) -> Result<ConvertedRow, RowError> {
        let mut converted = convert_fields(TargetDialect::ClickHouse, table, row, anchor)?;
        let id = self.next_ids.entry(table).or_insert(0);
        *id += 1;
        converted.id = Some(*id);
        Ok(converted)
    }
}
