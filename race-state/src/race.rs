//! Race state machine
//!
//! [`RaceState`] owns the race lifecycle, which lanes are racing, and the
//! results captured so far. The driver loop mutates it in response to gate
//! events and exports a snapshot whenever the display needs one.

use crate::clock::Clock;
use crate::snapshot::{flag, RaceSnapshot, SnapshotEncoder};
use crate::types::{RaceError, RaceStatus, Result, LANE_COUNT};
use serde_json::Value;

const RACER_LABEL: &str = "Racers participating : ";

/// State of one race across `N` lanes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceState<const N: usize = LANE_COUNT> {
    status: RaceStatus,
    participation: [bool; N],
    finish_position: [u8; N],
    finish_time: [u32; N],
    start_time: u32,
    message: String,
}

impl RaceState<LANE_COUNT> {
    /// Create a race for a standard four-lane board
    pub fn new() -> Self {
        Self::default()
    }
}

impl<const N: usize> Default for RaceState<N> {
    fn default() -> Self {
        Self {
            status: RaceStatus::Setup,
            participation: [false; N],
            finish_position: [0; N],
            finish_time: [0; N],
            start_time: 0,
            message: RaceStatus::Setup.as_str().to_string(),
        }
    }
}

impl<const N: usize> RaceState<N> {
    /// Number of lanes tracked
    pub const LANES: usize = N;

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    /// Move to `next` if the transition table allows it
    ///
    /// Staying in the current status is a no-op. A rejected transition leaves
    /// the status untouched.
    pub fn advance_to(&mut self, next: RaceStatus) -> Result<()> {
        if !self.status.can_advance_to(next) {
            log::warn!("Rejected status transition {} -> {}", self.status, next);
            return Err(RaceError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }

        if self.status != next {
            log::debug!("Race status {} -> {}", self.status, next);
            self.status = next;
        }
        Ok(())
    }

    /// Set the status without consulting the transition table
    pub fn force_status(&mut self, status: RaceStatus) {
        log::debug!("Race status forced {} -> {}", self.status, status);
        self.status = status;
    }

    pub fn participation(&self) -> &[bool; N] {
        &self.participation
    }

    /// Whether `lane` is racing; lanes past the board are never racing
    pub fn is_participating(&self, lane: usize) -> bool {
        self.participation.get(lane).copied().unwrap_or(false)
    }

    pub fn finish_positions(&self) -> &[u8; N] {
        &self.finish_position
    }

    pub fn finish_times(&self) -> &[u32; N] {
        &self.finish_time
    }

    /// Clock reading when the race started, 0 if not started or cleared
    pub fn start_time(&self) -> u32 {
        self.start_time
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Milliseconds since [`RaceState::start_race`]
    ///
    /// With a cleared timer this is the raw clock reading, so callers must
    /// check `start_time() != 0` before treating it as a race duration.
    pub fn elapsed_time(&self, clock: &impl Clock) -> u32 {
        clock.now_ms().wrapping_sub(self.start_time)
    }

    /// Start the race timer. The status is left to the caller.
    pub fn start_race(&mut self, clock: &impl Clock) {
        self.start_time = clock.now_ms();
        log::debug!("Race timer started at {} ms", self.start_time);
    }

    pub fn clear_timer(&mut self) {
        self.start_time = 0;
        log::debug!("Race timer cleared");
    }

    /// Update participation from raw integer flags (1 = racing)
    ///
    /// Only the lanes present in `racers` are written; extra entries are ignored.
    pub fn update_racers(&mut self, racers: &[i32]) {
        for (lane, &racer) in self.participation.iter_mut().zip(racers) {
            *lane = racer == 1;
        }
    }

    /// Update participation from a JSON array
    ///
    /// An entry counts as racing when it is numerically 1 (`1` or `1.0`) or
    /// `true`. Same partial-update rule as [`RaceState::update_racers`].
    pub fn update_racers_json(&mut self, racers: &[Value]) {
        for (lane, racer) in self.participation.iter_mut().zip(racers) {
            *lane = racer.as_f64() == Some(1.0) || racer.as_bool() == Some(true);
        }
    }

    /// Clear results and message, keeping status, participation and timer
    pub fn reset_data(&mut self) {
        self.message.clear();
        self.finish_position = [0; N];
        self.finish_time = [0; N];
        log::debug!("Race results reset");
    }

    /// Debug line showing which lanes race (`O`) and which don't (`X`)
    pub fn racer_string(&self) -> String {
        let lanes: Vec<&str> = self
            .participation
            .iter()
            .map(|&racing| if racing { "O" } else { "X" })
            .collect();
        format!("{}{}", RACER_LABEL, lanes.join(" | "))
    }

    /// Store a lane's finish position and time together
    ///
    /// Position uniqueness is not checked here.
    pub fn record_finish(&mut self, lane: usize, position: u8, time_ms: u32) -> Result<()> {
        if lane >= N {
            return Err(RaceError::LaneOutOfRange { lane, lanes: N });
        }

        self.finish_position[lane] = position;
        self.finish_time[lane] = time_ms;
        log::debug!("Lane {} finished P{} in {} ms", lane, position, time_ms);
        Ok(())
    }

    /// Record `lane` as the next finisher at the current race time
    ///
    /// Returns the assigned position.
    pub fn record_finish_now(&mut self, lane: usize, clock: &impl Clock) -> Result<u8> {
        match self.finish_position.get(lane) {
            None => return Err(RaceError::LaneOutOfRange { lane, lanes: N }),
            Some(&position) if position != 0 => return Err(RaceError::AlreadyFinished(lane)),
            Some(_) => {}
        }

        let position = self.next_finish_position();
        let time_ms = self.elapsed_time(clock);
        self.record_finish(lane, position, time_ms)?;
        Ok(position)
    }

    /// Position the next finisher would get
    pub fn next_finish_position(&self) -> u8 {
        let finished = self.finish_position.iter().filter(|&&p| p != 0).count();
        // At most N lanes can hold a position
        u8::try_from(finished + 1).unwrap_or(u8::MAX)
    }

    /// True once every participating lane has a finish position
    ///
    /// A race with no participants is never finished.
    pub fn all_finished(&self) -> bool {
        let mut lanes = self
            .participation
            .iter()
            .zip(&self.finish_position)
            .filter(|&(&racing, _)| racing)
            .peekable();

        lanes.peek().is_some() && lanes.all(|(_, &position)| position != 0)
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            message: self.message.clone(),
            in_race: self.participation.iter().map(|&racing| flag(racing)).collect(),
            finish_position: self.finish_position.to_vec(),
            finish_time: self.finish_time.to_vec(),
        }
    }

    /// Encode the race snapshot with an unbounded encoder
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(&SnapshotEncoder::new())
    }

    pub fn to_json_with(&self, encoder: &SnapshotEncoder) -> Result<String> {
        encoder.encode(&self.snapshot())
    }
}
