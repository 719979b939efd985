//! Board input mirror
//!
//! [`BoardState`] holds whatever the gate board last reported: trigger flags,
//! which lanes detected a racer, proximity readings and board health. It has
//! no transitions of its own; the driver writes the fields directly.
//!
//! `racers` is independent of [`RaceState`](crate::RaceState) participation.
//! The board reports raw detection, the race tracks confirmed entries, and
//! keeping the two in step is up to the driver.

use crate::snapshot::{flag, BoardSnapshot, SnapshotEncoder};
use crate::types::{Result, LANE_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState<const N: usize = LANE_COUNT> {
    /// Setup racers trigger
    pub setup_racers: bool,
    /// Setup trigger
    pub setup: bool,
    /// Ready trigger
    pub ready: bool,
    /// Start race trigger
    pub race: bool,
    /// Racers detected per lane
    pub racers: [bool; N],
    /// Raw proximity sensor reading per lane
    pub proximity: [u16; N],
    /// Board time since boot in milliseconds
    pub clock: u32,
    /// How many times the board needed a reset
    pub reset_count: u32,
}

impl BoardState<LANE_COUNT> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<const N: usize> Default for BoardState<N> {
    fn default() -> Self {
        Self {
            setup_racers: false,
            setup: false,
            ready: false,
            race: false,
            racers: [false; N],
            proximity: [0; N],
            clock: 0,
            reset_count: 0,
        }
    }
}

impl<const N: usize> BoardState<N> {
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            setup_racers: flag(self.setup_racers),
            setup: flag(self.setup),
            ready: flag(self.ready),
            race: flag(self.race),
            clock: self.clock,
            board_reset: self.reset_count,
            racers: self.racers.iter().map(|&racer| flag(racer)).collect(),
            proximity: self.proximity.to_vec(),
        }
    }

    /// Encode the board snapshot with an unbounded encoder
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&SnapshotEncoder::new())
    }

    pub fn to_json_with(&self, encoder: &SnapshotEncoder) -> Result<String> {
        encoder.encode(&self.snapshot())
    }
}
