//! Recording collaborators shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone};
use move_me::{
    services::{Notifier, OverlaySurface},
    StateStore, TimerEngine, TimerSettings,
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Countdown(u64),
    BreakStarted,
    BreakEnded(u32),
    OverrideUsed(u32),
    Show(String),
    Hide,
}

/// Shared call log; clones record into the same list
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    active: Arc<Mutex<bool>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Notifier for Recorder {
    fn countdown(&self, remaining_seconds: u64) -> anyhow::Result<()> {
        self.push(Call::Countdown(remaining_seconds));
        Ok(())
    }

    fn break_started(&self, _duration: Duration) -> anyhow::Result<()> {
        self.push(Call::BreakStarted);
        Ok(())
    }

    fn break_ended(&self, overrides_remaining: u32) -> anyhow::Result<()> {
        self.push(Call::BreakEnded(overrides_remaining));
        Ok(())
    }

    fn override_used(&self, overrides_remaining: u32) -> anyhow::Result<()> {
        self.push(Call::OverrideUsed(overrides_remaining));
        Ok(())
    }
}

impl OverlaySurface for Recorder {
    fn show(&mut self, message: &str) -> anyhow::Result<()> {
        let mut active = self.active.lock().unwrap();
        if !*active {
            *active = true;
            self.push(Call::Show(message.to_string()));
        }
        Ok(())
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        let mut active = self.active.lock().unwrap();
        if *active {
            *active = false;
            self.push(Call::Hide);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        *self.active.lock().unwrap()
    }
}

pub const MESSAGES: [&str; 3] = ["Stretch", "Drink water", "Look outside"];

pub fn t0() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 4, 15, 9, 0, 0).unwrap()
}

pub fn settings(work_min: i64, break_min: i64, lead_secs: i64, limit: u32) -> TimerSettings {
    TimerSettings::new(
        Duration::minutes(work_min),
        Duration::minutes(break_min),
        Duration::seconds(lead_secs),
        limit,
        MESSAGES.iter().map(|m| m.to_string()).collect(),
    )
    .unwrap()
}

/// Engine over a fresh state file, with one recorder as both sinks
pub fn engine(dir: &TempDir, settings: TimerSettings) -> (TimerEngine, Recorder) {
    let recorder = Recorder::default();
    let (store, _) = StateStore::open(dir.path().join("state.json"));
    let engine = TimerEngine::new(
        settings,
        store,
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    );
    (engine, recorder)
}
