//! Race State Library
//!
//! Tracks a multi-lane race on a timing gate board and exports it as compact
//! JSON snapshots for a display or upstream controller.
//!
//! # Architecture
//!
//! Two state containers and one encoder:
//! - [`RaceState`] - race lifecycle, participation, finish order and times
//! - [`BoardState`] - passive mirror of board triggers and sensor readings
//! - [`SnapshotEncoder`] - turns either container's snapshot into a string
//!
//! The library does NOT:
//! - Read sensors or talk to the board
//! - Decide finish order (it stores what the driver records)
//! - Transmit snapshots
//!
//! All of that belongs to the driver loop (see `race-cli` for a replay driver).
//!
//! # Example Usage
//!
//! ```
//! use race_state::{ManualClock, RaceState, RaceStatus};
//!
//! let clock = ManualClock::new(1_000);
//! let mut race = RaceState::new();
//!
//! race.update_racers(&[1, 0, 1, 0]);
//! race.advance_to(RaceStatus::Ready).unwrap();
//! race.advance_to(RaceStatus::Countdown).unwrap();
//! race.start_race(&clock);
//! race.advance_to(RaceStatus::Race).unwrap();
//!
//! clock.advance(4_321);
//! assert_eq!(race.record_finish_now(2, &clock).unwrap(), 1);
//!
//! let json = race.to_json().unwrap();
//! assert!(json.starts_with(r#"{"status":"RACE""#));
//! ```

// Public modules
pub mod board;
pub mod clock;
pub mod input;
pub mod race;
pub mod snapshot;
pub mod types;

// Re-export main types for convenience
pub use board::BoardState;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use race::RaceState;
pub use snapshot::{decode_snapshot, encode_snapshot, BoardSnapshot, RaceSnapshot, SnapshotEncoder};
pub use types::{status_to_string, RaceError, RaceStatus, Result, LANE_COUNT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
