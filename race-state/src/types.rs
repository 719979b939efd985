//! Core types for the race state library
//!
//! This module defines the race status enum, the lane count shared by the
//! state containers, and the error type every fallible operation returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of lanes on a standard gate board
pub const LANE_COUNT: usize = 4;

/// Result type for race state operations
pub type Result<T> = std::result::Result<T, RaceError>;

/// Errors that can occur while driving or exporting race state
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Snapshot needs {needed} bytes but the buffer holds {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: RaceStatus, to: RaceStatus },

    #[error("Lane {lane} out of range (board has {lanes} lanes)")]
    LaneOutOfRange { lane: usize, lanes: usize },

    #[error("Lane {0} already has a finish position")]
    AlreadyFinished(usize),
}

/// Lifecycle of a race
///
/// Serialized by name (`"SETUP"`, `"READY"`, ...). Each variant also carries
/// the numeric code the gate firmware uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceStatus {
    /// Racers are being assigned to lanes
    #[default]
    Setup,
    /// Lanes confirmed, waiting for the countdown
    Ready,
    /// Start sequence running
    Countdown,
    /// Clock running, waiting for finishes
    Race,
    /// Every participating lane has crossed the line
    Finished,
}

impl RaceStatus {
    /// All statuses in lifecycle order
    pub const ALL: [RaceStatus; 5] = [
        RaceStatus::Setup,
        RaceStatus::Ready,
        RaceStatus::Countdown,
        RaceStatus::Race,
        RaceStatus::Finished,
    ];

    /// Name used in snapshots
    pub fn as_str(self) -> &'static str {
        match self {
            RaceStatus::Setup => "SETUP",
            RaceStatus::Ready => "READY",
            RaceStatus::Countdown => "COUNTDOWN",
            RaceStatus::Race => "RACE",
            RaceStatus::Finished => "FINISHED",
        }
    }

    /// Numeric wire code
    pub fn code(self) -> i32 {
        match self {
            RaceStatus::Setup => 10,
            RaceStatus::Ready => 20,
            RaceStatus::Countdown => 30,
            RaceStatus::Race => 40,
            RaceStatus::Finished => 50,
        }
    }

    /// Look up a status by its wire code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Check whether the race may move from `self` to `next`
    ///
    /// Any status may fall back to `Setup`, and staying put is always allowed.
    pub fn can_advance_to(self, next: RaceStatus) -> bool {
        use RaceStatus::*;

        if self == next || next == Setup {
            return true;
        }

        matches!(
            (self, next),
            (Setup, Ready)
                | (Ready, Countdown)
                | (Countdown, Race)
                | (Countdown, Ready)
                | (Race, Finished)
                | (Finished, Ready)
        )
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for RaceStatus {
    type Error = i32;

    fn try_from(code: i32) -> std::result::Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Name of the status with the given wire code
///
/// Total over `i32`: codes outside the five known statuses map to `"UNKNOWN"`.
pub fn status_to_string(code: i32) -> &'static str {
    RaceStatus::from_code(code).map_or("UNKNOWN", RaceStatus::as_str)
}
