//! Unit tests for the value tokenizer and statement reader.

use fixture_shift::parser::values::{tokenize, Field, QuoteState};
use fixture_shift::parser::{classify, parse_insert_values, StatementKind, StatementReader};

#[test]
fn test_tokenize_quoted_comma_and_escaped_quote() {
    let row = tokenize("'a,b', 3, NULL, 'it''s'");
    assert_eq!(row.len(), 4);
    assert_eq!(row.fields[0].unquoted(), "a,b");
    assert_eq!(row.fields[1], Field::Bare("3".to_string()));
    assert!(row.fields[2].is_null());
    assert_eq!(row.fields[3].unquoted(), "it's");
    assert_eq!(row.fields[3].as_sql(), "'it''s'");
}

#[test]
fn test_tokenize_json_payload_is_opaque() {
    let row = tokenize(r#"'login', '{"method": "sso", "tags": ["a", "b"]}', NULL"#);
    assert_eq!(row.len(), 3);
    assert_eq!(
        row.fields[1].as_sql(),
        r#"'{"method": "sso", "tags": ["a", "b"]}'"#
    );
}

#[test]
fn test_tokenize_double_quoted_with_doubled_quote() {
    let row = tokenize(r#""say ""hi""", 1"#);
    assert_eq!(row.len(), 2);
    assert_eq!(row.fields[0].unquoted(), r#"say "hi""#);
}

#[test]
fn test_tokenize_trims_whitespace_outside_quotes() {
    let row = tokenize("  'a b'  ,\t42 ,NULL  ");
    assert_eq!(row.fields[0].unquoted(), "a b");
    assert_eq!(row.fields[1], Field::Bare("42".to_string()));
    assert!(row.fields[2].is_null());
}

#[test]
fn test_tokenize_unterminated_quote_swallows_rest() {
    let row = tokenize("'abc, 1, 2");
    assert_eq!(row.len(), 1);
    assert_eq!(row.fields[0].unquoted(), "abc, 1, 2");
}

#[test]
fn test_quoted_null_is_a_string() {
    let row = tokenize("'NULL', NULL");
    assert!(!row.fields[0].is_null());
    assert!(row.fields[1].is_null());
}

#[test]
fn test_state_machine_walk() {
    let mut state = QuoteState::Unquoted;
    for ch in "'a''b'".chars() {
        state = state.step(ch).0;
    }
    assert_eq!(state, QuoteState::QuoteSeen('\''));
    assert!(!state.in_quote());
}

#[test]
fn test_parse_insert_values_with_column_list() {
    let row = parse_insert_values(
        "INSERT INTO list_entries (list_id, value, expires_at, metadata) VALUES ('vip_users', 'vip_0001', NULL, NULL);",
    )
    .unwrap();
    assert_eq!(row.len(), 4);
}

#[test]
fn test_classify_canonical_statements() {
    assert_eq!(
        classify("INSERT INTO events (event_type) VALUES ('login');"),
        (StatementKind::Insert, "events".to_string())
    );
    assert_eq!(
        classify("CREATE INDEX IF NOT EXISTS idx_user_id ON events(user_id);").0,
        StatementKind::CreateIndex
    );
    assert_eq!(classify("DELETE FROM events;").0, StatementKind::Delete);
    assert_eq!(classify("-- Create events table").0, StatementKind::Comment);
}

#[test]
fn test_statement_reader_iterates_fixture() {
    let sql = "\
-- Canonical Test Data
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL
);

-- Clear existing data
DELETE FROM events;
INSERT INTO events (event_type) VALUES ('a;b');
";
    let statements: Vec<String> = StatementReader::new(sql.as_bytes(), 1024)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(statements.len(), 3);
    assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS events ("));
    assert_eq!(statements[1], "DELETE FROM events;");
    assert_eq!(
        statements[2],
        "INSERT INTO events (event_type) VALUES ('a;b');"
    );
}
