//! Roster - cached schedule and duty-roster queries over spreadsheets
//!
//! Schedule and roster workbooks are replaced periodically by an upload
//! process. This library keeps each (file, sheet) parsed and indexed in memory,
//! revalidates it by file fingerprint, and answers point queries against it.
//!
//! # Features
//!
//! - Fingerprint-validated sheet cache (mtime + SHA-256) with TTL and LRU capacity
//! - Name → row and (month, day) → column indices built once per load
//! - Deterministic cell classification and work-hour arithmetic (overnight shifts)
//! - Duty, head and group roster queries per division
//! - Loads run on the blocking pool, never on the async scheduler
//!
//! # Example
//!
//! ```no_run
//! use royalbit_roster::config::RosterConfig;
//! use royalbit_roster::header::Month;
//! use royalbit_roster::roster::RosterService;
//! use std::path::Path;
//!
//! # async fn run() -> royalbit_roster::RosterResult<()> {
//! let config = RosterConfig::load(Path::new("roster.yaml"))?;
//! let service = RosterService::from_config(config);
//!
//! let schedule = service
//!     .get_user_schedule("Петров Петр Петрович", Month::July, "support")
//!     .await?;
//! for (day, text) in schedule.pairs() {
//!     println!("{}: {}", day, text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod header;
pub mod index;
pub mod reader;
pub mod roster;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheOptions, SpreadsheetCache};
pub use error::{RosterError, RosterResult};
pub use header::Month;
pub use roster::RosterService;
pub use types::{Category, DayInfo, RosterEntry, RosterRole, Table, TimeRange, UserSchedule};
