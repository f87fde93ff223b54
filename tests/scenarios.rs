mod common;

use chrono::{Duration, TimeZone};
use move_me::{
    state::{EngineEvent, PersistedState},
    Phase, StateStore,
};
use tempfile::TempDir;

use common::{engine, settings, t0, Call, MESSAGES};

#[test]
fn scenario_a_full_cycle_with_per_second_ticks() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();
    assert!(recorder.calls().is_empty());

    let mut fired = Vec::new();
    for s in 0..=36 * 60 {
        let report = engine.tick(t0() + Duration::seconds(s));
        for event in report.events {
            fired.push((s, event));
        }
        if s == 30 * 60 - 1 {
            assert_eq!(engine.phase(), Phase::Working);
        }
        if s == 30 * 60 {
            assert_eq!(engine.phase(), Phase::Breaking);
        }
    }

    assert_eq!(fired.len(), 3);
    assert_eq!(
        fired[0],
        (29 * 60 + 30, EngineEvent::CountdownWarned { remaining_seconds: 30 })
    );
    assert_eq!(fired[1].0, 30 * 60);
    assert!(matches!(fired[1].1, EngineEvent::BreakStarted { .. }));
    assert_eq!(
        fired[2],
        (
            35 * 60,
            EngineEvent::BreakCompleted {
                next_break_at: t0() + Duration::minutes(65)
            }
        )
    );

    assert_eq!(engine.phase(), Phase::Working);
    assert_eq!(recorder.count(|c| *c == Call::Countdown(30)), 1);
    assert_eq!(recorder.count(|c| matches!(c, Call::Show(_))), 1);
    assert_eq!(recorder.count(|c| *c == Call::Hide), 1);
    assert_eq!(engine.ledger().store().state().total_breaks_completed, 1);

    let (reloaded, _) = StateStore::open(dir.path().join("state.json"));
    assert_eq!(reloaded.state().total_breaks_completed, 1);
    assert_eq!(
        reloaded.state().last_break_at,
        Some(t0() + Duration::minutes(35))
    );
}

#[test]
fn overlay_message_is_one_of_the_configured_messages() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();
    engine.tick(t0() + Duration::minutes(30));

    let shown: Vec<String> = recorder
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Show(message) => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(shown.len(), 1);
    assert!(MESSAGES.contains(&shown[0].as_str()));
}

#[test]
fn cycles_alternate_without_skipping_or_repeating_breaks() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(10, 2, 20, 3));
    engine.start(t0()).unwrap();

    let mut phases = vec![engine.phase()];
    // Uneven cadence: every 7 seconds for three hours
    for s in (0..3 * 3600).step_by(7) {
        engine.tick(t0() + Duration::seconds(s));
        if phases.last() != Some(&engine.phase()) {
            phases.push(engine.phase());
        }
    }

    assert!(phases
        .windows(2)
        .all(|w| w[0] != w[1] && matches!(w[0], Phase::Working | Phase::Breaking)));
    let breaks = phases.iter().filter(|p| **p == Phase::Breaking).count();
    let warnings = recorder.count(|c| matches!(c, Call::Countdown(_)));
    let shows = recorder.count(|c| matches!(c, Call::Show(_)));
    assert_eq!(shows, breaks);
    // One warning per work period, including the one in progress
    assert!(warnings == breaks || warnings == breaks + 1);
    assert_eq!(
        engine.ledger().store().state().total_breaks_completed as usize,
        recorder.count(|c| *c == Call::Hide)
    );
}

#[test]
fn countdown_never_early_never_twice() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();

    engine.tick(t0() + Duration::seconds(29 * 60 + 29));
    assert!(!engine.warning_fired());
    assert!(recorder.calls().is_empty());

    let at = t0() + Duration::seconds(29 * 60 + 45);
    for _ in 0..5 {
        engine.tick(at);
    }
    assert!(engine.warning_fired());
    assert_eq!(recorder.calls(), vec![Call::Countdown(15)]);
}

#[test]
fn pause_resume_preserves_remaining_work_time() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();

    let pause_at = t0() + Duration::minutes(12);
    let before = engine.next_break_at().unwrap() - pause_at;
    engine.pause(pause_at).unwrap();

    // Well past the original break instant: nothing happens while paused
    for m in 13..60 {
        assert!(engine.tick(t0() + Duration::minutes(m)).events.is_empty());
    }

    let resume_at = t0() + Duration::minutes(60);
    engine.resume(resume_at).unwrap();
    let after = engine.next_break_at().unwrap() - resume_at;

    assert_eq!(before, after);
    assert_eq!(engine.accumulated_pause(), Duration::minutes(48));
    assert_eq!(engine.phase(), Phase::Working);
    assert!(recorder.calls().is_empty());

    engine.tick(resume_at + after);
    assert_eq!(engine.phase(), Phase::Breaking);
}

#[test]
fn pause_after_warning_keeps_warning_consumed() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();
    engine.tick(t0() + Duration::seconds(29 * 60 + 40));
    engine.pause(t0() + Duration::seconds(29 * 60 + 50)).unwrap();
    engine.resume(t0() + Duration::minutes(45)).unwrap();

    engine.tick(t0() + Duration::minutes(45) + Duration::seconds(5));
    assert_eq!(recorder.count(|c| matches!(c, Call::Countdown(_))), 1);
    assert_eq!(engine.phase(), Phase::Working);

    engine.tick(t0() + Duration::minutes(45) + Duration::seconds(10));
    assert_eq!(engine.phase(), Phase::Breaking);
}

#[test]
fn scenario_b_three_overrides_then_denied() {
    let dir = TempDir::new().unwrap();
    let (mut engine, recorder) = engine(&dir, settings(30, 5, 30, 3));
    engine.start(t0()).unwrap();

    let mut work_start = t0();
    for expected_remaining in [2, 1, 0] {
        let break_at = work_start + Duration::minutes(30);
        engine.tick(break_at);
        assert_eq!(engine.phase(), Phase::Breaking);

        let override_at = break_at + Duration::minutes(1);
        let outcome = engine.request_override(override_at).unwrap();
        assert!(outcome.granted);
        assert_eq!(outcome.remaining, expected_remaining);
        assert!(outcome.persist_error.is_none());

        assert_eq!(engine.phase(), Phase::Working);
        assert!(!engine.warning_fired());
        assert_eq!(
            engine.next_break_at(),
            Some(override_at + Duration::minutes(30))
        );
        work_start = override_at;
    }
    assert_eq!(recorder.count(|c| *c == Call::Hide), 3);

    let break_at = work_start + Duration::minutes(30);
    engine.tick(break_at);
    let denied = engine
        .request_override(break_at + Duration::minutes(1))
        .unwrap();
    assert!(!denied.granted);
    assert_eq!(denied.remaining, 0);
    assert_eq!(engine.phase(), Phase::Breaking);
    assert_eq!(recorder.count(|c| *c == Call::Hide), 3);
    assert_eq!(
        engine.break_ends_at(),
        Some(break_at + Duration::minutes(5))
    );

    engine.tick(break_at + Duration::minutes(5));
    assert_eq!(engine.phase(), Phase::Working);
    assert_eq!(recorder.calls().last(), Some(&Call::BreakEnded(0)));

    let (reloaded, _) = StateStore::open(dir.path().join("state.json"));
    let state = reloaded.state();
    assert_eq!(state.overrides_used_today, 3);
    assert_eq!(state.total_overrides_used, 3);
    assert_eq!(state.total_breaks_completed, 1);
    assert_eq!(state.last_run_date, t0().date_naive());
}

#[test]
fn override_allowance_returns_after_midnight() {
    let dir = TempDir::new().unwrap();
    let (mut engine, _) = engine(&dir, settings(30, 5, 30, 1));
    let at = |day: u32, h: u32, m: u32| chrono::Local.with_ymd_and_hms(2024, 4, day, h, m, 0).unwrap();
    engine.start(at(15, 22, 0)).unwrap();

    engine.tick(at(15, 22, 30));
    assert!(engine.request_override(at(15, 22, 31)).unwrap().granted);

    engine.tick(at(15, 23, 1));
    assert_eq!(engine.phase(), Phase::Breaking);
    assert!(!engine.request_override(at(15, 23, 2)).unwrap().granted);
    assert_eq!(engine.snapshot(at(15, 23, 2)).overrides_remaining_today, 0);

    // Two completed cycles carry the timer past midnight
    engine.tick(at(15, 23, 6));
    engine.tick(at(15, 23, 36));
    engine.tick(at(15, 23, 41));
    assert_eq!(engine.next_break_at(), Some(at(16, 0, 11)));

    engine.tick(at(16, 0, 11));
    assert_eq!(engine.phase(), Phase::Breaking);
    assert_eq!(engine.snapshot(at(16, 0, 11)).overrides_remaining_today, 1);

    let outcome = engine.request_override(at(16, 0, 12)).unwrap();
    assert!(outcome.granted);
    assert_eq!(outcome.remaining, 0);
    let state = engine.ledger().store().state();
    assert_eq!(state.total_overrides_used, 2);
    assert_eq!(state.overrides_used_today, 1);
    assert_eq!(state.last_run_date, at(16, 0, 12).date_naive());
}

#[test]
fn scenario_c_bad_or_missing_state_file_yields_defaults() {
    let dir = TempDir::new().unwrap();

    let (absent, issue) = StateStore::open(dir.path().join("missing.json"));
    assert!(issue.is_none());
    assert_eq!(absent.state(), &PersistedState::default());

    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();
    let (corrupt, issue) = StateStore::open(&path);
    assert!(issue.is_some());
    let state = corrupt.state();
    assert_eq!(state.overrides_used_today, 0);
    assert_eq!(state.total_breaks_completed, 0);
    assert_eq!(state.total_overrides_used, 0);
}

#[test]
fn engine_keeps_running_when_state_cannot_be_written() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let recorder = common::Recorder::default();
    let (store, _) = StateStore::open(blocker.join("state.json"));
    let mut engine = move_me::TimerEngine::new(
        settings(30, 5, 30, 2),
        store,
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    );
    engine.start(t0()).unwrap();
    engine.tick(t0() + Duration::minutes(30));

    let outcome = engine
        .request_override(t0() + Duration::minutes(31))
        .unwrap();
    assert!(outcome.granted);
    assert!(outcome.persist_error.is_some());
    assert_eq!(engine.phase(), Phase::Working);

    engine.tick(t0() + Duration::minutes(61));
    let report = engine.tick(t0() + Duration::minutes(66));
    assert!(report.persist_error.is_some());
    assert_eq!(engine.phase(), Phase::Working);
    assert_eq!(engine.ledger().store().state().total_breaks_completed, 1);
    assert!(engine.ledger().store().is_dirty());
}
