//! Snapshot types and the encoder that turns them into wire strings
//!
//! Snapshots are plain serde structs whose field declaration order is the
//! wire order. Lane arrays are stored as `Vec`s of exactly lane-count length,
//! with booleans flattened to 0/1 integers.

use crate::types::{RaceError, RaceStatus, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;

/// Wire form of a race state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub message: String,
    /// Participation per lane (1 = racing)
    pub in_race: Vec<u8>,
    pub finish_position: Vec<u8>,
    /// Finish time per lane in milliseconds since race start
    pub finish_time: Vec<u32>,
}

/// Wire form of a board state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub setup_racers: u8,
    pub setup: u8,
    pub ready: u8,
    pub race: u8,
    pub clock: u32,
    pub board_reset: u32,
    pub racers: Vec<u8>,
    pub proximity: Vec<u16>,
}

/// Flatten a boolean into the 0/1 integer used on the wire
pub(crate) fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Turns snapshots into compact JSON strings
///
/// Without a capacity the encoder only fails if serialization itself fails.
/// With a capacity it measures the output first and refuses snapshots that
/// would not fit, so callers never see a truncated string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotEncoder {
    capacity: Option<usize>,
}

impl SnapshotEncoder {
    /// Create an encoder with no size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder that rejects output larger than `bytes`
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            capacity: Some(bytes),
        }
    }

    /// Configured capacity in bytes, if any
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Encode a snapshot
    pub fn encode<T: Serialize>(&self, snapshot: &T) -> Result<String> {
        if let Some(capacity) = self.capacity {
            let needed = measure(snapshot)?;
            log::trace!("Snapshot measured at {} bytes (capacity {})", needed, capacity);
            if needed > capacity {
                return Err(RaceError::BufferTooSmall { needed, capacity });
            }
        }

        serde_json::to_string(snapshot).map_err(RaceError::Encode)
    }

    /// Decode a snapshot produced by [`SnapshotEncoder::encode`]
    pub fn decode<T: DeserializeOwned>(&self, encoded: &str) -> Result<T> {
        serde_json::from_str(encoded).map_err(RaceError::Decode)
    }
}

/// Encode a snapshot with an unbounded encoder
pub fn encode_snapshot<T: Serialize>(snapshot: &T) -> Result<String> {
    SnapshotEncoder::new().encode(snapshot)
}

/// Decode a snapshot string
pub fn decode_snapshot<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    SnapshotEncoder::new().decode(encoded)
}

/// Serialized size of a value in bytes, without building the string
fn measure<T: Serialize>(value: &T) -> Result<usize> {
    let mut counter = ByteCounter(0);
    serde_json::to_writer(&mut counter, value).map_err(RaceError::Encode)?;
    Ok(counter.0)
}

struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
