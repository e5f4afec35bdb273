use super::{convert_fields, ConvertedRow, Emitter, FixtureTable, RowError, TargetDialect};
use crate::parser::values::ParsedRow;
use crate::timeshift::Anchor;

const SCHEMA: &str = "\
-- Create events table
CREATE TABLE IF NOT EXISTS events (
    id SERIAL PRIMARY KEY,
    event_type VARCHAR(64) NOT NULL,
    user_id VARCHAR(64) NOT NULL,
    timestamp TIMESTAMP NOT NULL,
    status VARCHAR(32),
    amount DECIMAL(18, 2),
    currency VARCHAR(8),
    merchant_id VARCHAR(64),
    device_id VARCHAR(64),
    ip_address VARCHAR(64),
    country VARCHAR(8),
    email VARCHAR(128),
    phone VARCHAR(32),
    metadata TEXT,
    attributes TEXT
);

-- Create indexes for events
CREATE INDEX IF NOT EXISTS idx_events_user_id ON events(user_id);
CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);
CREATE INDEX IF NOT EXISTS idx_events_event_type ON events(event_type);
CREATE INDEX IF NOT EXISTS idx_events_user_timestamp ON events(user_id, timestamp);

-- Create list_entries table
CREATE TABLE IF NOT EXISTS list_entries (
    id SERIAL PRIMARY KEY,
    list_id VARCHAR(64) NOT NULL,
    value VARCHAR(256) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    expires_at TIMESTAMP,
    metadata TEXT
);

-- Create indexes for list_entries
CREATE INDEX IF NOT EXISTS idx_list_entries_list_id ON list_entries(list_id);
CREATE INDEX IF NOT EXISTS idx_list_entries_value ON list_entries(list_id, value);
CREATE INDEX IF NOT EXISTS idx_list_entries_expires ON list_entries(expires_at);
";

const CLEAR: &[&str] = &[
    "TRUNCATE TABLE events RESTART IDENTITY CASCADE;",
    "TRUNCATE TABLE list_entries RESTART IDENTITY CASCADE;",
];

/// PostgreSQL emitter. Ids come from `SERIAL`, so rows carry none.
#[derive(Debug, Default)]
pub struct PostgresEmitter;

impl PostgresEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for PostgresEmitter {
    fn dialect(&self) -> TargetDialect {
        TargetDialect::Postgres
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
        convert_fields(TargetDialect::Postgres, table, row, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::values::parse_insert_values;

    const EVENT: &str = "INSERT INTO events (event_type, user_id, timestamp, status, amount, currency, merchant_id, device_id, ip_address, country, email, phone, metadata, attributes) VALUES ('login', 'user_0001', '2024-05-31T23:00:00.000000', 'success', NULL, NULL, NULL, 'dev_1', '10.0.0.1', 'US', NULL, NULL, '{\"a\": 1}', NULL);";

    #[test]
    fn test_event_row_has_no_id() {
        let anchor: Anchor = "2024-06-01 00:00:00".parse().unwrap();
        let mut emitter = PostgresEmitter::new();
        let row = parse_insert_values(EVENT).unwrap();
        let converted = emitter
            .convert_row(FixtureTable::Events, &row, &anchor)
            .unwrap();
        assert_eq!(converted.id, None);

        let sql = emitter.render(&converted);
        assert!(sql.starts_with("INSERT INTO events (event_type, user_id, timestamp,"));
        assert!(sql.contains(
            "VALUES ('login', 'user_0001', (NOW() AT TIME ZONE 'UTC') - INTERVAL '1 hours', 'success', NULL,"
        ));
        assert!(sql.contains("'{\"a\": 1}', NULL);"));
    }

    #[test]
    fn test_list_entry_created_at_is_now() {
        let anchor: Anchor = "2024-06-01 00:00:00".parse().unwrap();
        let row = parse_insert_values(
            "INSERT INTO list_entries (list_id, value, expires_at, metadata) VALUES ('vip', 'user_1', NULL, NULL);",
        )
        .unwrap();
        let converted = PostgresEmitter::new()
            .convert_row(FixtureTable::ListEntries, &row, &anchor)
            .unwrap();
        assert_eq!(
            PostgresEmitter::new().render(&converted),
            "INSERT INTO list_entries (list_id, value, created_at, expires_at, metadata) VALUES ('vip', 'user_1', (NOW() AT TIME ZONE 'UTC'), NULL, NULL);"
        );
    }

    #[test]
    fn test_schema_uses_serial_keys() {
        let schema = PostgresEmitter::new().schema();
        assert!(schema.contains("id SERIAL PRIMARY KEY"));
        assert!(schema.contains("idx_events_user_timestamp"));
        assert!(CLEAR.iter().all(|s| s.ends_with("RESTART IDENTITY CASCADE;")));
    }
}
