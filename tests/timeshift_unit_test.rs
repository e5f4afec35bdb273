//! Tests for timestamp relativization.

use fixture_shift::dialect::TargetDialect;
use fixture_shift::timeshift::{relativize, Anchor, Offset, TimeExpr, CLAMPED_OFFSET_SECS};

fn anchor(s: &str) -> Anchor {
    s.parse().unwrap()
}

#[test]
fn test_152_days_exactly() {
    let expr = relativize("'2024-01-01 00:00:00.000'", &anchor("2024-06-01 00:00:00"));
    assert_eq!(
        expr,
        TimeExpr::Offset(Offset {
            days: 152,
            ..Default::default()
        })
    );
    assert_eq!(
        expr.render(TargetDialect::ClickHouse),
        "now64(3) - INTERVAL 152 DAY"
    );
    assert_eq!(
        expr.render(TargetDialect::Postgres),
        "(NOW() AT TIME ZONE 'UTC') - INTERVAL '152 days'"
    );
}

#[test]
fn test_order_preserved_outside_clamp_window() {
    let a = anchor("2024-06-01 00:00:00");
    let timestamps = [
        "2023-12-31 23:59:59.999",
        "2024-05-01 10:00:00.001",
        "2024-05-01 10:00:00.002",
        "2024-05-31 23:58:00",
        "2024-05-31 23:58:59.999",
    ];
    let offsets: Vec<i64> = timestamps
        .iter()
        .map(|ts| relativize(ts, &a).offset_micros().unwrap())
        .collect();
    for pair in offsets.windows(2) {
        assert!(pair[0] > pair[1], "offsets not decreasing: {:?}", offsets);
    }
}

#[test]
fn test_millisecond_precision_survives() {
    let a = anchor("2024-06-01 00:00:00");
    let expr = relativize("2024-05-31T12:00:00.123456", &a);
    assert_eq!(
        expr,
        TimeExpr::Offset(Offset {
            hours: 11,
            minutes: 59,
            seconds: 59,
            millis: 877,
            ..Default::default()
        })
    );
}

#[test]
fn test_future_and_recent_clamped() {
    let a = anchor("2024-06-01 00:00:00");
    for ts in [
        "2024-06-01 00:00:00",
        "2024-05-31 23:59:30",
        "2024-07-01 00:00:00.123",
    ] {
        let expr = relativize(ts, &a);
        let micros = expr.offset_micros().unwrap();
        assert!(
            micros >= CLAMPED_OFFSET_SECS * 1_000_000,
            "{} not clamped: {:?}",
            ts,
            expr
        );
        assert!(micros < (CLAMPED_OFFSET_SECS + 1) * 1_000_000);
    }
}

#[test]
fn test_exactly_one_minute_is_not_clamped() {
    let expr = relativize("2024-05-31 23:59:00", &anchor("2024-06-01 00:00:00"));
    assert_eq!(
        expr.render(TargetDialect::ClickHouse),
        "now64(3) - INTERVAL 1 MINUTE"
    );
}

#[test]
fn test_clamp_postgres_render() {
    let expr = relativize("2024-06-02 08:00:00.123", &anchor("2024-06-01 00:00:00"));
    assert_eq!(
        expr.render(TargetDialect::Postgres),
        "(NOW() AT TIME ZONE 'UTC') - INTERVAL '600 seconds' - INTERVAL '123000 microseconds'"
    );
}

#[test]
fn test_anchors_ten_minutes_apart_preserve_ordering() {
    let early = anchor("2024-06-01 00:00:00");
    let late = anchor("2024-06-01 00:10:00");
    let timestamps = [
        "2024-04-01 00:00:00",
        "2024-05-20 06:30:00.250",
        "2024-05-31 12:00:00",
        "2024-05-31 23:00:00",
    ];

    for pair in timestamps.windows(2) {
        for a in [&early, &late] {
            let older = relativize(pair[0], a).offset_micros().unwrap();
            let newer = relativize(pair[1], a).offset_micros().unwrap();
            assert!(older > newer);
        }
    }

    // Offsets shift uniformly by the distance between anchors
    for ts in timestamps {
        let shift = relativize(ts, &late).offset_micros().unwrap()
            - relativize(ts, &early).offset_micros().unwrap();
        assert_eq!(shift, 10 * 60 * 1_000_000);
    }
}

#[test]
fn test_unparseable_literal_falls_back() {
    let expr = relativize("'13/05/2024 10:00'", &anchor("2024-06-01 00:00:00"));
    assert!(expr.is_fallback());
    assert_eq!(expr.offset_micros(), None);
}

#[test]
fn test_offset_micros_out_of_range_is_none() {
    let huge = TimeExpr::Offset(Offset {
        days: 200_000_000,
        ..Default::default()
    });
    assert_eq!(huge.offset_micros(), None);
    assert_eq!(
        huge.render(TargetDialect::ClickHouse),
        "now64(3) - INTERVAL 200000000 DAY"
    );

    let ancient = relativize("0001-01-01 00:00:00", &anchor("9999-12-31 23:59:59"));
    assert!(ancient.offset_micros().unwrap() > 0);
}
