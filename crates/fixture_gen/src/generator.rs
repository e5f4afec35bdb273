//! Canonical fixture generator.
//!
//! Produces `events` and `list_entries` rows whose timestamps lie at random
//! distances before a fixed anchor, and renders them as the canonical
//! SQLite-flavoured SQL fixture: schema, `DELETE FROM` statements and one
//! single-row `INSERT` per line.

use crate::fake::{self, pick};
use chrono::{Duration, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use std::io::{self, Write};

/// Generation scale presets
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// 50 events, 10 list entries
    Small,
    /// 500 events, 50 list entries
    Medium,
    /// 10,000 events, 500 list entries
    Large,
}

impl Scale {
    pub fn events(&self) -> usize {
        match self {
            Scale::Small => 50,
            Scale::Medium => 500,
            Scale::Large => 10_000,
        }
    }

    pub fn list_entries(&self) -> usize {
        match self {
            Scale::Small => 10,
            Scale::Medium => 50,
            Scale::Large => 500,
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Scale::Small),
            "medium" | "m" => Ok(Scale::Medium),
            "large" | "l" => Ok(Scale::Large),
            _ => Err(format!("Unknown scale: {}. Use small, medium, or large", s)),
        }
    }
}

/// One canonical `events` row
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub event_type: String,
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    pub status: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub merchant_id: Option<String>,
    pub device_id: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub metadata: Option<String>,
    pub attributes: Option<String>,
}

/// One canonical `list_entries` row
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntryRow {
    pub list_id: String,
    pub value: String,
    pub expires_at: Option<NaiveDateTime>,
    pub metadata: Option<String>,
}

/// Generated rows of both tables
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub events: Vec<EventRow>,
    pub list_entries: Vec<ListEntryRow>,
}

const SCHEMA: &str = "\
-- Create events table
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    user_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    status TEXT,
    amount REAL,
    currency TEXT,
    merchant_id TEXT,
    device_id TEXT,
    ip_address TEXT,
    country TEXT,
    email TEXT,
    phone TEXT,
    metadata TEXT,
    attributes TEXT
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_user_id ON events(user_id);
CREATE INDEX IF NOT EXISTS idx_timestamp ON events(timestamp);
CREATE INDEX IF NOT EXISTS idx_event_type ON events(event_type);
CREATE INDEX IF NOT EXISTS idx_user_timestamp ON events(user_id, timestamp);

-- Create list_entries table
CREATE TABLE IF NOT EXISTS list_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id TEXT NOT NULL,
    value TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    expires_at TEXT,
    metadata TEXT
);

-- Clear existing data
DELETE FROM events;
DELETE FROM list_entries;
";

/// Timestamp in the canonical ISO form with microseconds
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn sql_opt(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(sql_string)
        .unwrap_or_else(|| "NULL".to_string())
}

impl EventRow {
    pub fn to_insert(&self) -> String {
        let values = [
            sql_string(&self.event_type),
            sql_string(&self.user_id),
            sql_string(&format_timestamp(&self.timestamp)),
            sql_opt(&self.status),
            self.amount
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| "NULL".to_string()),
            sql_opt(&self.currency),
            sql_opt(&self.merchant_id),
            sql_opt(&self.device_id),
            sql_opt(&self.ip_address),
            sql_opt(&self.country),
            sql_opt(&self.email),
            sql_opt(&self.phone),
            sql_opt(&self.metadata),
            sql_opt(&self.attributes),
        ];
        format!(
            "INSERT INTO events (event_type, user_id, timestamp, status, amount, currency, \
             merchant_id, device_id, ip_address, country, email, phone, metadata, attributes) \
             VALUES ({});",
            values.join(", ")
        )
    }
}

impl ListEntryRow {
    pub fn to_insert(&self) -> String {
        let expires_at = self
            .expires_at
            .map(|ts| sql_string(&format_timestamp(&ts)))
            .unwrap_or_else(|| "NULL".to_string());
        format!(
            "INSERT INTO list_entries (list_id, value, expires_at, metadata) VALUES ({}, {}, {}, {});",
            sql_string(&self.list_id),
            sql_string(&self.value),
            expires_at,
            sql_opt(&self.metadata)
        )
    }
}

impl Fixture {
    /// Render the canonical SQL fixture.
    pub fn write_sql<W: Write>(&self, writer: &mut W, anchor: &NaiveDateTime) -> io::Result<()> {
        writeln!(writer, "-- Canonical Test Data")?;
        writeln!(writer, "-- Generated at: {}", format_timestamp(anchor))?;
        writeln!(writer)?;
        writeln!(writer, "{}", SCHEMA)?;
        for event in &self.events {
            writeln!(writer, "{}", event.to_insert())?;
        }
        writeln!(writer)?;
        for entry in &self.list_entries {
            writeln!(writer, "{}", entry.to_insert())?;
        }
        Ok(())
    }

    pub fn to_sql(&self, anchor: &NaiveDateTime) -> String {
        let mut out = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_sql(&mut out, anchor);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Event families, with the window (in minutes before the anchor) their
/// timestamps are drawn from.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Transaction,
    Login,
    Payment,
    Suspicious,
    Velocity,
}

impl Pattern {
    fn window_minutes(self) -> f64 {
        match self {
            Pattern::Transaction => 720.0 * 60.0,
            Pattern::Login => 168.0 * 60.0,
            Pattern::Payment => 240.0 * 60.0,
            Pattern::Suspicious => 48.0 * 60.0,
            Pattern::Velocity => 60.0,
        }
    }
}

/// Deterministic fixture generator
pub struct Generator {
    rng: ChaCha8Rng,
    anchor: NaiveDateTime,
}

impl Generator {
    pub fn new(seed: u64, anchor: NaiveDateTime) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            anchor,
        }
    }

    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    pub fn generate(&mut self, scale: Scale) -> Fixture {
        let events = (0..scale.events()).map(|_| self.event()).collect();
        let list_entries = (0..scale.list_entries())
            .map(|_| self.list_entry())
            .collect();
        Fixture {
            events,
            list_entries,
        }
    }

    fn before_anchor(&mut self, window_minutes: f64) -> NaiveDateTime {
        let micros = (self.rng.random_range(0.0..window_minutes) * 60_000_000.0) as i64;
        self.anchor - Duration::microseconds(micros)
    }

    fn event(&mut self) -> EventRow {
        let roll: f64 = self.rng.random();
        let pattern = match roll {
            r if r < 0.40 => Pattern::Transaction,
            r if r < 0.70 => Pattern::Login,
            r if r < 0.85 => Pattern::Payment,
            r if r < 0.95 => Pattern::Suspicious,
            _ => Pattern::Velocity,
        };
        let timestamp = self.before_anchor(pattern.window_minutes());
        let rng = &mut self.rng;

        match pattern {
            Pattern::Transaction | Pattern::Payment => {
                let vip = rng.random_bool(0.1);
                let user_id = if vip {
                    fake::vip_user(rng)
                } else {
                    fake::normal_user(rng)
                };
                let amount = if vip {
                    fake::amount(rng, 50.0, 2000.0)
                } else {
                    fake::amount(rng, 10.0, 500.0)
                };
                let event_type = match pattern {
                    Pattern::Payment => "payment",
                    _ => "transaction",
                };
                let metadata = json!({
                    "payment_method": pick(rng, fake::PAYMENT_METHODS),
                    "merchant_category": pick(rng, fake::MERCHANT_CATEGORIES),
                    "is_vip": vip,
                });
                EventRow {
                    event_type: event_type.to_string(),
                    email: Some(fake::email(&user_id)),
                    user_id,
                    timestamp,
                    status: Some("completed".to_string()),
                    amount: Some(amount),
                    currency: Some(pick(rng, fake::CURRENCIES).to_string()),
                    merchant_id: Some(fake::merchant(rng)),
                    device_id: Some(fake::device(rng)),
                    ip_address: Some(fake::ip(rng)),
                    country: Some(pick(rng, fake::COUNTRIES).to_string()),
                    phone: Some(fake::phone(rng)),
                    metadata: Some(metadata.to_string()),
                    attributes: None,
                }
            }
            Pattern::Login => {
                let suspicious = rng.random_bool(0.2);
                let user_id = if suspicious {
                    fake::suspicious_user(rng)
                } else {
                    fake::normal_user(rng)
                };
                let success_rate = if suspicious { 0.4 } else { 0.95 };
                let status = if rng.random_bool(success_rate) {
                    "success"
                } else {
                    "failed"
                };
                let failed_attempts = if suspicious {
                    rng.random_range(0..=5)
                } else {
                    rng.random_range(0..=1)
                };
                let metadata = json!({
                    "login_method": pick(rng, fake::LOGIN_METHODS),
                    "failed_attempts": failed_attempts,
                });
                let (ip, country) = if suspicious {
                    (
                        pick(rng, fake::SUSPICIOUS_IPS).to_string(),
                        pick(rng, fake::SUSPICIOUS_COUNTRIES),
                    )
                } else {
                    (fake::ip(rng), pick(rng, fake::COUNTRIES))
                };
                EventRow {
                    event_type: "login".to_string(),
                    email: Some(fake::email(&user_id)),
                    user_id,
                    timestamp,
                    status: Some(status.to_string()),
                    amount: None,
                    currency: None,
                    merchant_id: None,
                    device_id: Some(fake::device(rng)),
                    ip_address: Some(ip),
                    country: Some(country.to_string()),
                    phone: None,
                    metadata: Some(metadata.to_string()),
                    attributes: Some(json!({ "channel": "web" }).to_string()),
                }
            }
            Pattern::Suspicious | Pattern::Velocity => {
                let user_id = fake::suspicious_user(rng);
                let (amount, event_type) = match pattern {
                    Pattern::Suspicious => (fake::amount(rng, 5000.0, 15000.0), "withdrawal"),
                    _ => (fake::amount(rng, 100.0, 500.0), "transfer"),
                };
                let metadata = json!({
                    "payment_method": pick(rng, fake::RISKY_PAYMENT_METHODS),
                    "note": "it's urgent, please",
                });
                EventRow {
                    event_type: event_type.to_string(),
                    email: None,
                    user_id,
                    timestamp,
                    status: Some("pending".to_string()),
                    amount: Some(amount),
                    currency: Some("USD".to_string()),
                    merchant_id: Some(fake::merchant(rng)),
                    device_id: Some(fake::device(rng)),
                    ip_address: Some(pick(rng, fake::SUSPICIOUS_IPS).to_string()),
                    country: Some(pick(rng, fake::SUSPICIOUS_COUNTRIES).to_string()),
                    phone: None,
                    metadata: Some(metadata.to_string()),
                    attributes: None,
                }
            }
        }
    }

    fn list_entry(&mut self) -> ListEntryRow {
        let rng = &mut self.rng;
        match rng.random_range(0..3) {
            0 => ListEntryRow {
                list_id: "blocked_ips".to_string(),
                value: pick(rng, fake::SUSPICIOUS_IPS).to_string(),
                expires_at: None,
                metadata: Some(json!({ "reason": "tor exit node" }).to_string()),
            },
            1 => ListEntryRow {
                list_id: "vip_users".to_string(),
                value: fake::vip_user(rng),
                expires_at: None,
                metadata: None,
            },
            _ => {
                let days = rng.random_range(1..=30);
                ListEntryRow {
                    list_id: "watchlist".to_string(),
                    value: fake::suspicious_user(rng),
                    expires_at: Some(self.anchor - Duration::days(days)),
                    metadata: None,
                }
            }
        }
    }
}
