//! Literal value tuple tokenizer.
//!
//! Splits the inner text of an `INSERT ... VALUES (...)` clause into its
//! top-level fields. Only the literal grammar written by the fixture
//! generator is understood: quoted strings, bare numbers and `NULL`.
//!
//! Quoting is tracked by [`QuoteState`], a small state machine whose single
//! transition function [`QuoteState::step`] decides for every character
//! whether it belongs to the current field or ends it.

use once_cell::sync::Lazy;
use regex::Regex;

static VALUES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bVALUES\s*\((.*)\)\s*;?\s*$").unwrap());

/// Quote tracking state of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    /// Outside any quoted literal; commas split fields.
    Unquoted,
    /// Inside a literal opened with the given quote character.
    InQuote(char),
    /// A quote matching the opener was just seen. If the next character is
    /// the same quote it was an escaped (doubled) quote, otherwise the
    /// literal ended.
    QuoteSeen(char),
}

/// What to do with the character that drove a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append the character to the current field.
    Push,
    /// The character is a separator: close the current field.
    Split,
}

impl QuoteState {
    /// Transition table of the tokenizer.
    pub fn step(self, ch: char) -> (QuoteState, Action) {
        match self {
            QuoteState::Unquoted => match ch {
                '\'' | '"' => (QuoteState::InQuote(ch), Action::Push),
                ',' => (QuoteState::Unquoted, Action::Split),
                _ => (QuoteState::Unquoted, Action::Push),
            },
            QuoteState::InQuote(q) if ch == q => (QuoteState::QuoteSeen(q), Action::Push),
            QuoteState::InQuote(q) => (QuoteState::InQuote(q), Action::Push),
            QuoteState::QuoteSeen(q) if ch == q => (QuoteState::InQuote(q), Action::Push),
            QuoteState::QuoteSeen(_) => QuoteState::Unquoted.step(ch),
        }
    }

    /// True while inside an open literal. A pending [`QuoteState::QuoteSeen`]
    /// counts as closed.
    pub fn in_quote(self) -> bool {
        matches!(self, QuoteState::InQuote(_))
    }
}

/// One literal field of a value tuple, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The bare `NULL` keyword (any case).
    Null,
    /// A quoted literal; `raw` keeps the quotes and escape doubling.
    Quoted { quote: char, raw: String },
    /// Any other unquoted token, passed through verbatim.
    Bare(String),
}

impl Field {
    /// Classify a trimmed token.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("NULL") {
            return Field::Null;
        }
        match token.chars().next() {
            Some(q @ ('\'' | '"')) => Field::Quoted {
                quote: q,
                raw: token.to_string(),
            },
            _ => Field::Bare(token.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// A separator with nothing between it and the next one.
    pub fn is_empty(&self) -> bool {
        matches!(self, Field::Bare(raw) if raw.is_empty())
    }

    /// Literal payload with surrounding quotes and escape doubling removed.
    pub fn unquoted(&self) -> String {
        match self {
            Field::Null => "NULL".to_string(),
            Field::Bare(raw) => raw.clone(),
            Field::Quoted { quote, raw } => {
                let inner = &raw[quote.len_utf8()..];
                let inner = if inner.len() >= quote.len_utf8() && inner.ends_with(*quote) {
                    &inner[..inner.len() - quote.len_utf8()]
                } else {
                    inner
                };
                let doubled: String = [*quote, *quote].iter().collect();
                inner.replace(&doubled, &quote.to_string())
            }
        }
    }

    /// Normalized SQL literal for re-emission.
    ///
    /// Double-quoted literals are rewritten as standard single-quoted
    /// strings since both target dialects read `"..."` as an identifier.
    pub fn as_sql(&self) -> String {
        match self {
            Field::Null => "NULL".to_string(),
            Field::Bare(raw) => raw.clone(),
            Field::Quoted { quote: '\'', raw } => raw.clone(),
            Field::Quoted { .. } => quote_literal(&self.unquoted()),
        }
    }
}

/// Quote a string as a single-quoted SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Ordered literal fields of one `INSERT` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    pub fields: Vec<Field>,
}

impl ParsedRow {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }
}

/// Split the inner text of a `VALUES (...)` clause into fields.
///
/// An unterminated quote swallows the rest of the input into the last
/// field; callers detect that through the resulting field count. Empty
/// fields, including one after a trailing comma, are kept as empty
/// [`Field::Bare`] tokens.
pub fn tokenize(inner: &str) -> ParsedRow {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = QuoteState::Unquoted;

    for ch in inner.chars() {
        let (next, action) = state.step(ch);
        match action {
            Action::Push => current.push(ch),
            Action::Split => {
                fields.push(Field::from_token(current.trim()));
                current.clear();
            }
        }
        state = next;
    }

    let last = current.trim();
    if !last.is_empty() || !fields.is_empty() {
        fields.push(Field::from_token(last));
    }

    ParsedRow { fields }
}

/// Inner text of the `VALUES (...)` clause of a single-row INSERT.
pub fn extract_values(stmt: &str) -> Option<&str> {
    VALUES_RE
        .captures(stmt)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Tokenize the value tuple of a single-row INSERT statement.
pub fn parse_insert_values(stmt: &str) -> Option<ParsedRow> {
    extract_values(stmt).map(tokenize)
}
