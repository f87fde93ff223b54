//! Shared application state: the engine behind one lock

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{
    engine::{EngineEvent, TickReport, TimerEngine},
    ledger::OverrideOutcome,
    store::PersistedState,
    timer_state::StatusSnapshot,
};
use crate::{
    error::{Error, Result},
    utils::Clock,
};

/// Persisted counters as reported to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub overrides_used_today: u32,
    pub total_overrides_used: u64,
    pub total_breaks_completed: u64,
    pub last_break_at: Option<String>,
}

impl From<&PersistedState> for Stats {
    fn from(state: &PersistedState) -> Self {
        Self {
            overrides_used_today: state.overrides_used_today,
            total_overrides_used: state.total_overrides_used,
            total_breaks_completed: state.total_breaks_completed,
            last_break_at: state.last_break_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Main application state shared by the driver task and the HTTP handlers.
///
/// Every engine operation runs under `engine`'s mutex, so ticks and commands
/// never interleave.
pub struct AppState {
    engine: Mutex<TimerEngine>,
    clock: Arc<dyn Clock>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for status updates
    pub status_tx: watch::Sender<StatusSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _status_rx: watch::Receiver<StatusSnapshot>,
}

impl AppState {
    pub fn new(engine: TimerEngine, clock: Arc<dyn Clock>, port: u16, host: String) -> Self {
        let initial = engine.snapshot(clock.now());
        let (status_tx, status_rx) = watch::channel(initial);

        Self {
            engine: Mutex::new(engine),
            clock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            status_tx,
            _status_rx: status_rx,
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, TimerEngine>> {
        self.engine
            .lock()
            .map_err(|e| Error::LockPoisoned(e.to_string()))
    }

    /// Run a command against the engine at the current clock time, then
    /// record it and publish the new status
    fn command<T, F>(&self, action: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut TimerEngine, DateTime<chrono::Local>) -> Result<T>,
    {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now();
        let value = op(&mut *engine, now)?;
        let snapshot = engine.snapshot(now);
        drop(engine); // Release the lock early

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
        self.publish(snapshot);

        Ok(value)
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        if let Err(e) = self.status_tx.send(snapshot) {
            warn!("Failed to send status update: {}", e);
        }
    }

    pub fn start(&self) -> Result<StatusSnapshot> {
        self.command("start", |engine, now| {
            engine.start(now)?;
            Ok(engine.snapshot(now))
        })
    }

    pub fn pause(&self) -> Result<StatusSnapshot> {
        self.command("pause", |engine, now| {
            engine.pause(now)?;
            Ok(engine.snapshot(now))
        })
    }

    pub fn resume(&self) -> Result<StatusSnapshot> {
        self.command("resume", |engine, now| {
            engine.resume(now)?;
            Ok(engine.snapshot(now))
        })
    }

    pub fn force_break(&self) -> Result<EngineEvent> {
        self.command("break", |engine, now| engine.force_break(now))
    }

    pub fn stop(&self) -> Result<StatusSnapshot> {
        self.command("stop", |engine, now| {
            engine.stop(now)?;
            Ok(engine.snapshot(now))
        })
    }

    pub fn request_override(&self) -> Result<OverrideOutcome> {
        self.command("override", |engine, now| engine.request_override(now))
    }

    /// One driver step: tick at the current clock time and publish the status
    pub fn tick(&self) -> Result<TickReport> {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now();
        let report = engine.tick(now);
        let snapshot = engine.snapshot(now);
        drop(engine);

        self.publish(snapshot);
        Ok(report)
    }

    /// Get current status
    pub fn snapshot(&self) -> Result<StatusSnapshot> {
        let engine = self.lock_engine()?;
        Ok(engine.snapshot(self.clock.now()))
    }

    /// Get persisted statistics
    pub fn stats(&self) -> Result<Stats> {
        let engine = self.lock_engine()?;
        Ok(Stats::from(engine.ledger().store().state()))
    }

    /// Stop the engine if running and write any unsaved state
    pub fn shutdown(&self) -> Result<()> {
        let mut engine = self.lock_engine()?;
        let now = self.clock.now();
        if engine.phase() != super::Phase::Idle {
            engine.stop(now)?;
        }
        if engine.store_mut().flush_if_dirty()? {
            info!("Unsaved state flushed");
        }
        Ok(())
    }

    /// Calculate uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
