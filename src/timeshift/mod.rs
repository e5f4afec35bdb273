//! Timestamp relativization.
//!
//! Fixture timestamps are absolute, but the features that read them look at
//! windows ending "now" (24 hours, 7 days, 90 days). Each timestamp is
//! therefore rewritten as an expression "N intervals before now" whose
//! offset equals the timestamp's distance from the conversion [`Anchor`].
//! Evaluated at any later instant the expression keeps that distance, so
//! windowed aggregates over a loaded fixture stay stable.

use crate::dialect::TargetDialect;
use crate::parser::values::quote_literal;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Timestamps closer than this to the anchor (or after it) are clamped.
pub const CLAMP_WINDOW_MS: i64 = 60_000;

/// Offset given to clamped timestamps, before the microsecond tie-break.
pub const CLAMPED_OFFSET_SECS: i64 = 600;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// The instant a conversion pass is anchored to, in UTC with millisecond
/// precision. Every timestamp of one pass is measured against the same
/// anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Anchor(NaiveDateTime);

impl Anchor {
    /// Anchor at the current wall-clock time.
    pub fn now() -> Self {
        Self::at(Utc::now().naive_utc())
    }

    /// Anchor at a given UTC instant.
    pub fn at(instant: NaiveDateTime) -> Self {
        Self(instant.trunc_subsecs(3))
    }

    pub fn instant(&self) -> NaiveDateTime {
        self.0
    }
}

impl FromStr for Anchor {
    type Err = String;

    /// Accepts the fixture timestamp format or RFC 3339 with an offset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(ts) = parse_timestamp(s) {
            return Ok(Anchor::at(ts));
        }
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Anchor::at(dt.with_timezone(&Utc).naive_utc()))
            .map_err(|_| {
                format!(
                    "Invalid anchor: {}. Expected YYYY-MM-DD HH:MM:SS[.fff] (UTC) or RFC 3339",
                    s
                )
            })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} UTC", self.0.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// A distance before query time, decomposed largest unit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub millis: i64,
}

impl Offset {
    /// Decompose a millisecond total with floor division, carrying each
    /// remainder to the next smaller unit.
    pub fn from_millis(total: i64) -> Self {
        let days = total.div_euclid(MS_PER_DAY);
        let rest = total.rem_euclid(MS_PER_DAY);
        Self {
            days,
            hours: rest / MS_PER_HOUR,
            minutes: rest % MS_PER_HOUR / MS_PER_MINUTE,
            seconds: rest % MS_PER_MINUTE / MS_PER_SECOND,
            millis: rest % MS_PER_SECOND,
        }
    }

    pub fn total_millis(&self) -> i64 {
        self.days * MS_PER_DAY
            + self.hours * MS_PER_HOUR
            + self.minutes * MS_PER_MINUTE
            + self.seconds * MS_PER_SECOND
            + self.millis
    }

    pub fn is_zero(&self) -> bool {
        self.total_millis() == 0
    }

    /// Non-zero components paired with their unit.
    fn components(&self) -> impl Iterator<Item = (i64, Unit)> {
        [
            (self.days, Unit::Day),
            (self.hours, Unit::Hour),
            (self.minutes, Unit::Minute),
            (self.seconds, Unit::Second),
            (self.millis, Unit::Millisecond),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
}

impl Unit {
    fn clickhouse(self) -> &'static str {
        match self {
            Unit::Day => "DAY",
            Unit::Hour => "HOUR",
            Unit::Minute => "MINUTE",
            Unit::Second => "SECOND",
            Unit::Millisecond => "MILLISECOND",
            Unit::Microsecond => "MICROSECOND",
        }
    }

    fn postgres(self) -> &'static str {
        match self {
            Unit::Day => "days",
            Unit::Hour => "hours",
            Unit::Minute => "minutes",
            Unit::Second => "seconds",
            Unit::Millisecond => "milliseconds",
            Unit::Microsecond => "microseconds",
        }
    }
}

/// A relativized timestamp, rendered per dialect with [`TimeExpr::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeExpr {
    /// The source field was `NULL`.
    Null,
    /// `now - offset`.
    Offset(Offset),
    /// The timestamp was at, after, or within a minute before the anchor:
    /// `now - 600s - micros`.
    Clamped { micros: u32 },
    /// The literal could not be parsed; resolution is left to the backend.
    Unparsed(String),
}

impl TimeExpr {
    /// Total distance before query time in microseconds, if known and
    /// representable as an `i64`.
    pub fn offset_micros(&self) -> Option<i64> {
        match self {
            TimeExpr::Offset(offset) => offset.total_millis().checked_mul(1_000),
            TimeExpr::Clamped { micros } => {
                Some(CLAMPED_OFFSET_SECS * 1_000_000 + i64::from(*micros))
            }
            TimeExpr::Null | TimeExpr::Unparsed(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TimeExpr::Unparsed(_))
    }

    /// Render as a time expression for `dialect`.
    pub fn render(&self, dialect: TargetDialect) -> String {
        let mut terms: Vec<(i64, Unit)> = Vec::new();
        match self {
            TimeExpr::Null => return "NULL".to_string(),
            TimeExpr::Unparsed(literal) => {
                return match dialect {
                    TargetDialect::ClickHouse => {
                        format!("parseDateTimeBestEffort({})", quote_literal(literal))
                    }
                    TargetDialect::Postgres => {
                        format!("CAST({} AS TIMESTAMP)", quote_literal(literal))
                    }
                };
            }
            TimeExpr::Offset(offset) => terms.extend(offset.components()),
            TimeExpr::Clamped { micros } => {
                terms.push((CLAMPED_OFFSET_SECS, Unit::Second));
                terms.push((i64::from(*micros), Unit::Microsecond));
            }
        }

        let mut expr = now_expr(dialect).to_string();
        for (n, unit) in terms {
            match dialect {
                TargetDialect::ClickHouse => {
                    expr.push_str(&format!(" - INTERVAL {} {}", n, unit.clickhouse()))
                }
                TargetDialect::Postgres => {
                    expr.push_str(&format!(" - INTERVAL '{} {}'", n, unit.postgres()))
                }
            }
        }
        expr
    }
}

/// The dialect's "current time" expression at millisecond precision.
pub fn now_expr(dialect: TargetDialect) -> &'static str {
    match dialect {
        TargetDialect::ClickHouse => "now64(3)",
        TargetDialect::Postgres => "(NOW() AT TIME ZONE 'UTC')",
    }
}

/// Strip quotes, turn the `T` separator into a space and cut the fraction
/// to milliseconds.
fn normalize_literal(literal: &str) -> String {
    let trimmed = literal.trim();
    let unquoted = trimmed
        .strip_prefix(['\'', '"'])
        .map(|s| s.strip_suffix(['\'', '"']).unwrap_or(s))
        .unwrap_or(trimmed);

    let mut ts = unquoted.to_string();
    if ts.as_bytes().get(10) == Some(&b'T') {
        ts.replace_range(10..11, " ");
    }
    if let Some(dot) = ts.rfind('.') {
        let digits = ts.len() - dot - 1;
        if digits > 3 && ts[dot + 1..].bytes().all(|b| b.is_ascii_digit()) {
            ts.truncate(dot + 4);
        }
    }
    ts
}

/// Parse a fixture timestamp (`YYYY-MM-DD[ T]HH:MM:SS[.ffffff]`, naive UTC),
/// truncated to milliseconds.
pub fn parse_timestamp(literal: &str) -> Option<NaiveDateTime> {
    let ts = normalize_literal(literal);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&ts, fmt).ok())
        .map(|dt| dt.trunc_subsecs(3))
}

/// Relativize one timestamp literal against `anchor`.
pub fn relativize(literal: &str, anchor: &Anchor) -> TimeExpr {
    if literal.trim().eq_ignore_ascii_case("NULL") {
        return TimeExpr::Null;
    }

    let Some(ts) = parse_timestamp(literal) else {
        return TimeExpr::Unparsed(normalize_literal(literal));
    };

    let delta_ms = (anchor.instant() - ts).num_milliseconds();
    if delta_ms < CLAMP_WINDOW_MS {
        return TimeExpr::Clamped {
            micros: ts.nanosecond() % 1_000_000_000 / 1_000,
        };
    }

    TimeExpr::Offset(Offset::from_millis(delta_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn anchor(s: &str) -> Anchor {
        s.parse().unwrap()
    }

    #[test]
    fn test_offset_decomposition_carries_remainders() {
        let total = 2 * MS_PER_DAY + 3 * MS_PER_HOUR + 4 * MS_PER_MINUTE + 5 * MS_PER_SECOND + 6;
        let offset = Offset::from_millis(total);
        assert_eq!(
            offset,
            Offset {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5,
                millis: 6
            }
        );
        assert_eq!(offset.total_millis(), total);
    }

    #[test]
    fn test_parse_iso_separator_and_micros() {
        let ts = parse_timestamp("'2025-12-13T05:00:17.019788'").unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 12, 13)
            .unwrap()
            .and_hms_milli_opt(5, 0, 17, 19)
            .unwrap();
        assert_eq!(ts, expected);
    }

    #[test]
    fn test_parse_without_fraction() {
        assert!(parse_timestamp("2024-01-01 00:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_render_clickhouse_offset() {
        let expr = relativize(
            "'2024-05-30 21:59:58.500'",
            &anchor("2024-06-01 00:00:00"),
        );
        assert_eq!(
            expr.render(TargetDialect::ClickHouse),
            "now64(3) - INTERVAL 1 DAY - INTERVAL 2 HOUR - INTERVAL 1 SECOND - INTERVAL 500 MILLISECOND"
        );
    }

    #[test]
    fn test_render_postgres_offset() {
        let expr = relativize("'2024-05-31 23:00:00'", &anchor("2024-06-01 00:00:00"));
        assert_eq!(
            expr.render(TargetDialect::Postgres),
            "(NOW() AT TIME ZONE 'UTC') - INTERVAL '1 hours'"
        );
    }

    #[test]
    fn test_render_zero_offset_is_plain_now() {
        let expr = TimeExpr::Offset(Offset::default());
        assert_eq!(expr.render(TargetDialect::ClickHouse), "now64(3)");
    }

    #[test]
    fn test_clamped_render() {
        let expr = relativize("'2024-06-01 00:00:30.250'", &anchor("2024-06-01 00:00:00"));
        assert_eq!(expr, TimeExpr::Clamped { micros: 250_000 });
        assert_eq!(
            expr.render(TargetDialect::ClickHouse),
            "now64(3) - INTERVAL 600 SECOND - INTERVAL 250000 MICROSECOND"
        );
    }

    #[test]
    fn test_unparsed_fallback_is_dialect_native() {
        let expr = relativize("'last tuesday'", &anchor("2024-06-01 00:00:00"));
        assert!(expr.is_fallback());
        assert_eq!(
            expr.render(TargetDialect::ClickHouse),
            "parseDateTimeBestEffort('last tuesday')"
        );
        assert_eq!(
            expr.render(TargetDialect::Postgres),
            "CAST('last tuesday' AS TIMESTAMP)"
        );
    }

    #[test]
    fn test_null_passthrough() {
        assert_eq!(relativize("NULL", &Anchor::now()), TimeExpr::Null);
    }

    #[test]
    fn test_anchor_rfc3339() {
        let a: Anchor = "2024-06-01T02:00:00+02:00".parse().unwrap();
        assert_eq!(a, anchor("2024-06-01 00:00:00"));
    }
}
