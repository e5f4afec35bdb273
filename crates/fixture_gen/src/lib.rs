//! Deterministic canonical fixture generator for fixture-shift tests and
//! benchmarks.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fixture_gen::{Generator, Scale};
//!
//! let anchor = NaiveDate::from_ymd_opt(2024, 6, 1)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//! let fixture = Generator::new(42, anchor).generate(Scale::Small);
//! let sql = fixture.to_sql(&anchor);
//!
//! assert!(sql.contains("INSERT INTO events"));
//! ```

pub mod fake;
pub mod generator;

pub use generator::{format_timestamp, EventRow, Fixture, Generator, ListEntryRow, Scale};
