// End-to-end race scenarios against the public API
use race_state::{
    decode_snapshot, BoardSnapshot, BoardState, ManualClock, RaceError, RaceSnapshot, RaceState,
    RaceStatus, SnapshotEncoder,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn full_race_produces_expected_snapshots() {
    init_logging();

    let clock = ManualClock::new(0);
    let mut race = RaceState::new();

    race.update_racers(&[1, 1, 0, 1]);
    assert_eq!(race.racer_string(), "Racers participating : O | O | X | O");

    race.advance_to(RaceStatus::Ready).unwrap();
    race.set_message("READY");
    race.advance_to(RaceStatus::Countdown).unwrap();

    clock.set(5_000);
    race.clear_timer();
    race.start_race(&clock);
    race.advance_to(RaceStatus::Race).unwrap();

    clock.advance(3_210);
    race.record_finish_now(3, &clock).unwrap();
    clock.advance(45);
    race.record_finish_now(0, &clock).unwrap();
    clock.advance(1_000);
    race.record_finish_now(1, &clock).unwrap();

    assert!(race.all_finished());
    race.advance_to(RaceStatus::Finished).unwrap();

    assert_eq!(
        race.to_json().unwrap(),
        r#"{"status":"FINISHED","message":"READY","inRace":[1,1,0,1],"finishPosition":[2,3,0,1],"finishTime":[3255,4255,0,3210]}"#
    );
}

#[test]
fn race_snapshot_round_trips() {
    let clock = ManualClock::new(200);
    let mut race = RaceState::new();
    race.update_racers(&[0, 1, 1, 0]);
    race.force_status(RaceStatus::Race);
    race.set_message("Lane 3 false start");
    race.start_race(&clock);
    race.record_finish(1, 1, 9_999).unwrap();

    let json = race.to_json().unwrap();
    let decoded: RaceSnapshot = decode_snapshot(&json).unwrap();

    assert_eq!(decoded, race.snapshot());
    assert_eq!(decoded.status, RaceStatus::Race);
    assert_eq!(decoded.message, "Lane 3 false start");
    assert_eq!(decoded.in_race, vec![0, 1, 1, 0]);
    assert_eq!(decoded.finish_position, vec![0, 1, 0, 0]);
    assert_eq!(decoded.finish_time, vec![0, 9_999, 0, 0]);
}

#[test]
fn board_snapshot_round_trips() {
    let mut board = BoardState::new();
    board.ready = true;
    board.racers = [true, true, true, false];
    board.proximity = [11, 22, 33, 44];
    board.clock = 60_000;

    let encoder = SnapshotEncoder::new();
    let json = board.to_json_with(&encoder).unwrap();
    let decoded: BoardSnapshot = encoder.decode(&json).unwrap();

    assert_eq!(decoded, board.snapshot());
}

#[test]
fn reset_between_heats_keeps_lineup() {
    init_logging();

    let clock = ManualClock::new(1_000);
    let mut race = RaceState::new();
    race.update_racers(&[1, 1, 1, 1]);
    race.force_status(RaceStatus::Finished);
    race.start_race(&clock);
    race.record_finish(0, 1, 100).unwrap();

    race.reset_data();
    race.advance_to(RaceStatus::Ready).unwrap();

    let snapshot = race.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Ready);
    assert_eq!(snapshot.message, "");
    assert_eq!(snapshot.in_race, vec![1, 1, 1, 1]);
    assert_eq!(snapshot.finish_position, vec![0; 4]);
    assert_eq!(snapshot.finish_time, vec![0; 4]);
    assert_eq!(race.start_time(), 1_000);
}

#[test]
fn cleared_timer_reports_raw_clock() {
    let clock = ManualClock::new(750);
    let mut race = RaceState::new();

    race.start_race(&clock);
    clock.advance(250);
    race.clear_timer();

    assert_eq!(race.start_time(), 0);
    assert_eq!(race.elapsed_time(&clock), 1_000);
}

#[test]
fn bounded_encoder_never_truncates() {
    let mut race = RaceState::new();
    race.set_message("x".repeat(200));

    let encoder = SnapshotEncoder::with_capacity(128);
    match race.to_json_with(&encoder) {
        Err(RaceError::BufferTooSmall { needed, capacity }) => {
            assert!(needed > capacity);
            assert_eq!(capacity, 128);
        }
        other => panic!("expected BufferTooSmall, got {:?}", other),
    }

    race.reset_data();
    let json = race.to_json_with(&encoder).unwrap();
    assert!(json.len() <= 128);
    assert!(json.ends_with('}'));
}

#[test]
fn rejected_transition_is_reported() {
    let mut race = RaceState::new();
    let err = race.advance_to(RaceStatus::Finished).unwrap_err();
    assert_eq!(err.to_string(), "Illegal status transition: SETUP -> FINISHED");
    assert_eq!(race.status(), RaceStatus::Setup);
}
