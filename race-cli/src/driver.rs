//! Replay driver
//!
//! Plays a scripted command stream against a [`RaceState`] / [`BoardState`]
//! pair, the way a gate board's main loop reacts to controller commands,
//! and writes a snapshot after every command.
//!
//! Scenario format: one JSON object per line, e.g.
//! `{"at": 1500, "command": "finish", "lane": 2}`. Blank lines and lines
//! starting with `#` are skipped.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use race_state::input::{get_lane_array, get_string_value};
use race_state::{
    BoardState, Clock, ManualClock, RaceError, RaceState, RaceStatus, SnapshotEncoder,
};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

/// Counters reported after a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub commands: usize,
    pub skipped: usize,
    pub snapshots: usize,
}

pub struct Driver {
    race: RaceState,
    board: BoardState,
    clock: ManualClock,
    encoder: SnapshotEncoder,
    include_board: bool,
    auto_reset_on_setup: bool,
}

impl Driver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            race: RaceState::new(),
            board: BoardState::new(),
            clock: ManualClock::new(0),
            encoder: config.snapshot.encoder(),
            include_board: config.snapshot.include_board,
            auto_reset_on_setup: config.race.auto_reset_on_setup,
        }
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Replay every command in `input`, writing snapshots to `out`
    pub fn replay(&mut self, input: impl BufRead, mut out: impl Write) -> Result<ReplayStats> {
        let mut stats = ReplayStats::default();

        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = line.with_context(|| format!("Failed to read scenario line {}", line_no))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let command = match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    log::warn!("Line {}: not a JSON object, skipping", line_no);
                    stats.skipped += 1;
                    continue;
                }
            };

            stats.commands += 1;
            if !self.apply(&command)? {
                stats.skipped += 1;
            }
            stats.snapshots += self.write_snapshots(&mut out)?;
        }

        out.flush().context("Failed to flush snapshot output")?;
        Ok(stats)
    }

    /// Apply one command. Returns false if it was rejected and skipped.
    pub fn apply(&mut self, command: &Map<String, Value>) -> Result<bool> {
        self.advance_clock(command);

        let name = get_string_value(command, "command");
        log::debug!("[{} ms] {}", self.clock.now_ms(), name);

        let outcome = match name.as_str() {
            "setup" => self.setup(),
            "racers" => {
                self.racers(command);
                Ok(())
            }
            "ready" => self.ready(),
            "countdown" => self.race.advance_to(RaceStatus::Countdown),
            "race" => self.start(),
            "finish" => self.finish(command),
            "proximity" => {
                self.proximity(command);
                Ok(())
            }
            "board_reset" => {
                self.board.reset_count += 1;
                Ok(())
            }
            "message" => {
                self.race.set_message(get_string_value(command, "text"));
                Ok(())
            }
            other => {
                log::warn!("Unknown command '{}', skipping", other);
                return Ok(false);
            }
        };

        self.board.clock = self.clock.now_ms();

        match outcome {
            Ok(()) => Ok(true),
            Err(
                err @ (RaceError::IllegalTransition { .. }
                | RaceError::LaneOutOfRange { .. }
                | RaceError::AlreadyFinished(_)),
            ) => {
                log::warn!("Command '{}' rejected: {}", name, err);
                Ok(false)
            }
            Err(err) => Err(err).with_context(|| format!("Command '{}' failed", name)),
        }
    }

    fn advance_clock(&mut self, command: &Map<String, Value>) {
        let Some(at) = command.get("at").and_then(Value::as_u64) else {
            return;
        };

        // The board clock is a u32 tick counter
        let Ok(at) = u32::try_from(at) else {
            log::warn!("Timestamp {} ms does not fit the board clock, keeping clock", at);
            return;
        };
        if at < self.clock.now_ms() {
            log::warn!(
                "Timestamp {} ms is before {} ms, keeping clock",
                at,
                self.clock.now_ms()
            );
            return;
        }
        self.clock.set(at);
    }

    fn setup(&mut self) -> race_state::Result<()> {
        self.race.advance_to(RaceStatus::Setup)?;
        if self.auto_reset_on_setup {
            self.race.reset_data();
        }
        self.race.set_message(RaceStatus::Setup.as_str());

        self.board.setup = true;
        self.board.ready = false;
        self.board.race = false;
        Ok(())
    }

    fn racers(&mut self, command: &Map<String, Value>) {
        let Some(racers) = get_lane_array(command, "racers") else {
            return;
        };

        self.race.update_racers_json(racers);
        // Board mirror follows the confirmed lineup
        self.board.racers = *self.race.participation();
        self.board.setup_racers = true;
        log::info!("{}", self.race.racer_string());
    }

    fn ready(&mut self) -> race_state::Result<()> {
        let rearm = self.race.status() == RaceStatus::Finished;
        self.race.advance_to(RaceStatus::Ready)?;
        if rearm {
            // New heat, same lineup
            self.race.reset_data();
            self.race.clear_timer();
        }
        self.race.set_message(RaceStatus::Ready.as_str());
        self.board.ready = true;
        Ok(())
    }

    fn start(&mut self) -> race_state::Result<()> {
        if self.race.status() == RaceStatus::Race {
            log::warn!("Race already running since {} ms, keeping timer", self.race.start_time());
            return Ok(());
        }

        self.race.advance_to(RaceStatus::Race)?;
        self.race.clear_timer();
        self.race.start_race(&self.clock);
        self.race.set_message(RaceStatus::Race.as_str());
        self.board.race = true;
        Ok(())
    }

    fn finish(&mut self, command: &Map<String, Value>) -> race_state::Result<()> {
        let Some(lane) = command.get("lane").and_then(Value::as_u64) else {
            log::warn!("lane doesn't exist in library");
            return Ok(());
        };
        let lane = usize::try_from(lane).unwrap_or(usize::MAX);

        if self.race.status() != RaceStatus::Race {
            log::warn!("Finish on lane {} outside of a race, ignoring", lane);
            return Ok(());
        }
        if !self.race.is_participating(lane) {
            log::warn!("Finish on lane {} which is not racing", lane);
        }

        let position = self.race.record_finish_now(lane, &self.clock)?;
        log::info!(
            "Lane {} finished P{} in {} ms",
            lane,
            position,
            self.race.finish_times()[lane]
        );

        if self.race.all_finished() {
            self.race.advance_to(RaceStatus::Finished)?;
            self.race.set_message(RaceStatus::Finished.as_str());
        }
        Ok(())
    }

    fn proximity(&mut self, command: &Map<String, Value>) {
        let Some(values) = get_lane_array(command, "values") else {
            return;
        };

        for (reading, value) in self.board.proximity.iter_mut().zip(values) {
            match value.as_u64().and_then(|v| u16::try_from(v).ok()) {
                Some(v) => *reading = v,
                None => log::warn!("Proximity value {} is not a 16-bit reading", value),
            }
        }
    }

    fn write_snapshots(&self, out: &mut impl Write) -> Result<usize> {
        let race = self
            .race
            .to_json_with(&self.encoder)
            .context("Failed to encode race snapshot")?;
        writeln!(out, "{}", race).context("Failed to write race snapshot")?;

        if !self.include_board {
            return Ok(1);
        }

        let board = self
            .board
            .to_json_with(&self.encoder)
            .context("Failed to encode board snapshot")?;
        writeln!(out, "{}", board).context("Failed to write board snapshot")?;
        Ok(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_state::{decode_snapshot, BoardSnapshot, RaceSnapshot};
    use std::io::Cursor;

    const SCENARIO: &str = r#"
# two lane heat
{"at": 0, "command": "setup"}
{"at": 100, "command": "racers", "racers": [1, 0, 1, 0]}
{"at": 200, "command": "ready"}
{"at": 300, "command": "countdown"}
{"at": 3300, "command": "race"}
{"at": 3400, "command": "proximity", "values": [870, 0, 910, 0]}
{"at": 8100, "command": "finish", "lane": 2}
{"at": 8350, "command": "finish", "lane": 0}
"#;

    fn run(scenario: &str, config: &AppConfig) -> (Driver, ReplayStats, Vec<String>) {
        let mut driver = Driver::new(config);
        let mut out = Vec::new();
        let stats = driver.replay(Cursor::new(scenario), &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        (driver, stats, lines)
    }

    #[test]
    fn test_replay_full_heat() {
        let (driver, stats, lines) = run(SCENARIO, &AppConfig::default());

        assert_eq!(stats.commands, 8);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.snapshots, 16);
        assert_eq!(lines.len(), 16);

        let race = driver.race();
        assert_eq!(race.status(), RaceStatus::Finished);
        assert_eq!(race.message(), "FINISHED");
        assert_eq!(race.finish_positions(), &[2, 0, 1, 0]);
        assert_eq!(race.finish_times(), &[5_050, 0, 4_800, 0]);

        let board = driver.board();
        assert_eq!(board.racers, [true, false, true, false]);
        assert_eq!(board.proximity, [870, 0, 910, 0]);
        assert_eq!(board.clock, 8_350);
        assert!(board.setup_racers && board.ready && board.race);

        let last_race: RaceSnapshot = decode_snapshot(&lines[14]).unwrap();
        assert_eq!(last_race, race.snapshot());
        let last_board: BoardSnapshot = decode_snapshot(&lines[15]).unwrap();
        assert_eq!(last_board, board.snapshot());
    }

    #[test]
    fn test_race_only_output() {
        let mut config = AppConfig::default();
        config.snapshot.include_board = false;

        let (_, stats, lines) = run(SCENARIO, &config);
        assert_eq!(stats.snapshots, 8);
        assert!(lines.iter().all(|line| line.starts_with(r#"{"status":"#)));
    }

    #[test]
    fn test_rejected_commands_are_skipped() {
        let scenario = r#"
{"at": 0, "command": "race"}
{"at": 10, "command": "fly"}
not json
{"at": 20, "command": "ready"}
{"at": 30, "command": "countdown"}
{"at": 40, "command": "race"}
{"at": 50, "command": "finish", "lane": 9}
"#;
        let (driver, stats, _) = run(scenario, &AppConfig::default());

        assert_eq!(stats.commands, 6);
        // race from setup, unknown command, not json, lane 9
        assert_eq!(stats.skipped, 4);
        assert_eq!(driver.race().status(), RaceStatus::Race);
        assert_eq!(driver.race().start_time(), 40);
    }

    #[test]
    fn test_setup_resets_results_and_board_reset_counts() {
        let scenario = r#"
{"at": 0, "command": "racers", "racers": [1, 1, 1, 1]}
{"at": 5, "command": "message", "text": "Heat 1"}
{"at": 6, "command": "board_reset"}
{"at": 7, "command": "board_reset"}
{"at": 10, "command": "setup"}
"#;
        let (driver, _, _) = run(scenario, &AppConfig::default());

        assert_eq!(driver.race().message(), "SETUP");
        assert_eq!(driver.race().participation(), &[true; 4]);
        assert_eq!(driver.board().reset_count, 2);
        assert!(driver.board().setup);
    }

    #[test]
    fn test_clock_never_runs_backwards() {
        let scenario = r#"
{"at": 500, "command": "board_reset"}
{"at": 100, "command": "board_reset"}
"#;
        let (driver, _, _) = run(scenario, &AppConfig::default());
        assert_eq!(driver.board().clock, 500);
    }

    #[test]
    fn test_second_heat_without_setup() {
        let scenario = r#"
{"at": 0, "command": "racers", "racers": [1, 1, 0, 0]}
{"at": 10, "command": "ready"}
{"at": 20, "command": "countdown"}
{"at": 30, "command": "race"}
{"at": 100, "command": "finish", "lane": 0}
{"at": 200, "command": "finish", "lane": 1}
{"at": 300, "command": "ready"}
{"at": 310, "command": "countdown"}
{"at": 320, "command": "race"}
{"at": 400, "command": "finish", "lane": 1}
{"at": 450, "command": "finish", "lane": 0}
"#;
        let (driver, stats, _) = run(scenario, &AppConfig::default());

        assert_eq!(stats.commands, 11);
        assert_eq!(stats.skipped, 0);
        let race = driver.race();
        assert_eq!(race.status(), RaceStatus::Finished);
        assert_eq!(race.finish_positions(), &[2, 1, 0, 0]);
        assert_eq!(race.finish_times(), &[130, 80, 0, 0]);
        assert_eq!(race.participation(), &[true, true, false, false]);
    }

    #[test]
    fn test_repeated_race_keeps_timer() {
        let scenario = r#"
{"at": 0, "command": "racers", "racers": [1, 1, 0, 0]}
{"at": 10, "command": "ready"}
{"at": 20, "command": "countdown"}
{"at": 30, "command": "race"}
{"at": 500, "command": "race"}
{"at": 1030, "command": "finish", "lane": 0}
"#;
        let (driver, _, _) = run(scenario, &AppConfig::default());

        assert_eq!(driver.race().start_time(), 30);
        assert_eq!(driver.race().finish_times(), &[1_000, 0, 0, 0]);
    }

    #[test]
    fn test_timestamp_past_board_clock_is_ignored() {
        let scenario = format!(
            "{{\"at\": 100, \"command\": \"board_reset\"}}\n{{\"at\": {}, \"command\": \"board_reset\"}}\n",
            u64::from(u32::MAX) + 200
        );
        let (driver, stats, _) = run(&scenario, &AppConfig::default());

        assert_eq!(stats.commands, 2);
        assert_eq!(driver.board().clock, 100);
        assert_eq!(driver.board().reset_count, 2);
    }

    #[test]
    fn test_oversized_snapshot_aborts_replay() {
        let mut config = AppConfig::default();
        config.snapshot.max_bytes = Some(32);

        let mut driver = Driver::new(&config);
        let result = driver.replay(Cursor::new(r#"{"command": "setup"}"#), Vec::new());
        assert!(result.is_err());
    }
}
