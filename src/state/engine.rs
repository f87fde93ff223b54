//! Work/break timer engine.
//!
//! A wall-clock state machine with no threads of its own. The driver calls
//! [`TimerEngine::tick`] at least once a second; commands (`pause`,
//! `request_override`, ...) arrive from the API. Both go through one lock in
//! [`AppState`](super::AppState).
//!
//! ```text
//! Idle -> Working -> Breaking -> Working -> ...
//!            |  ^
//!            v  |
//!           Paused
//! ```

use chrono::{DateTime, Duration, Local};
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::{
    ledger::{OverrideLedger, OverrideOutcome},
    store::StateStore,
    timer_state::{Phase, StatusSnapshot},
};
use crate::{
    error::{Error, PersistenceError, Result},
    services::{Notifier, OverlaySurface},
};

/// Longest accepted work or break period
const MAX_PERIOD_DAYS: i64 = 365;

/// Validated timer configuration, fixed for the engine's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSettings {
    work: Duration,
    break_duration: Duration,
    warning_lead: Duration,
    daily_override_limit: u32,
    messages: Vec<String>,
}

impl TimerSettings {
    pub fn new(
        work: Duration,
        break_duration: Duration,
        warning_lead: Duration,
        daily_override_limit: u32,
        messages: Vec<String>,
    ) -> Result<Self> {
        if work <= Duration::zero() {
            return Err(Error::Configuration(
                "work duration must be positive".to_string(),
            ));
        }
        if break_duration <= Duration::zero() {
            return Err(Error::Configuration(
                "break duration must be positive".to_string(),
            ));
        }
        let max_period = Duration::days(MAX_PERIOD_DAYS);
        if work > max_period || break_duration > max_period {
            return Err(Error::Configuration(format!(
                "work and break durations must not exceed {} days",
                MAX_PERIOD_DAYS
            )));
        }
        if warning_lead < Duration::zero() {
            return Err(Error::Configuration(
                "warning lead time must not be negative".to_string(),
            ));
        }
        if warning_lead >= work {
            return Err(Error::Configuration(format!(
                "warning lead time ({}s) must be shorter than the work duration ({}s)",
                warning_lead.num_seconds(),
                work.num_seconds()
            )));
        }
        if messages.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::Configuration(
                "at least one overlay message is required".to_string(),
            ));
        }

        Ok(Self {
            work,
            break_duration,
            warning_lead,
            daily_override_limit,
            messages,
        })
    }

    pub fn work(&self) -> Duration {
        self.work
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    pub fn warning_lead(&self) -> Duration {
        self.warning_lead
    }

    pub fn daily_override_limit(&self) -> u32 {
        self.daily_override_limit
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Side effect fired by a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    CountdownWarned { remaining_seconds: u64 },
    BreakStarted { message: String, ends_at: DateTime<Local> },
    BreakCompleted { next_break_at: DateTime<Local> },
}

/// What a tick did. Logging its contents is the caller's job.
#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<EngineEvent>,
    /// How far `now` lagged behind the latest time already seen
    pub clock_regressed_by: Option<Duration>,
    pub persist_error: Option<PersistenceError>,
}

/// The phase state machine
pub struct TimerEngine {
    settings: TimerSettings,
    ledger: OverrideLedger,
    notifier: Box<dyn Notifier>,
    overlay: Box<dyn OverlaySurface>,

    phase: Phase,
    next_break_at: Option<DateTime<Local>>,
    break_ends_at: Option<DateTime<Local>>,
    paused_at: Option<DateTime<Local>>,
    warning_fired: bool,
    /// Total time spent paused during the current work period
    accumulated_pause: Duration,
    /// Latest `now` observed; earlier timestamps are clamped up to it
    last_seen: Option<DateTime<Local>>,
}

impl TimerEngine {
    pub fn new(
        settings: TimerSettings,
        store: StateStore,
        notifier: Box<dyn Notifier>,
        overlay: Box<dyn OverlaySurface>,
    ) -> Self {
        let ledger = OverrideLedger::new(store, settings.daily_override_limit);
        Self {
            settings,
            ledger,
            notifier,
            overlay,
            phase: Phase::Idle,
            next_break_at: None,
            break_ends_at: None,
            paused_at: None,
            warning_fired: false,
            accumulated_pause: Duration::zero(),
            last_seen: None,
        }
    }

    // Queries

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn next_break_at(&self) -> Option<DateTime<Local>> {
        self.next_break_at
    }

    pub fn break_ends_at(&self) -> Option<DateTime<Local>> {
        self.break_ends_at
    }

    pub fn warning_fired(&self) -> bool {
        self.warning_fired
    }

    pub fn accumulated_pause(&self) -> Duration {
        self.accumulated_pause
    }

    pub fn ledger(&self) -> &OverrideLedger {
        &self.ledger
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        self.ledger.store_mut()
    }

    /// Status projection; never mutates
    pub fn snapshot(&self, now: DateTime<Local>) -> StatusSnapshot {
        let now = self.last_seen.map_or(now, |seen| now.max(seen));
        let remaining = match self.phase {
            Phase::Idle => None,
            Phase::Working => self.next_break_at.map(|at| at - now),
            Phase::Breaking => self.break_ends_at.map(|at| at - now),
            Phase::Paused => self
                .next_break_at
                .zip(self.paused_at)
                .map(|(at, paused)| at - paused),
        };

        StatusSnapshot {
            phase: self.phase,
            seconds_remaining_in_phase: remaining.map_or(0, whole_seconds),
            overrides_remaining_today: self.ledger.remaining_as_of(now),
            warning_fired: self.warning_fired,
        }
    }

    // Commands

    /// Begin the first work period
    pub fn start(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(Error::invalid("start", self.phase));
        }
        let now = self.observe(now);
        self.begin_work(now);
        info!("Timer started, first break at {}", self.fmt_next_break());
        Ok(())
    }

    /// Freeze the work countdown
    pub fn pause(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.phase != Phase::Working {
            return Err(Error::invalid("pause", self.phase));
        }
        let now = self.observe(now);
        self.phase = Phase::Paused;
        self.paused_at = Some(now);
        info!("Timer paused");
        Ok(())
    }

    /// Continue the work countdown; paused time does not count as work
    pub fn resume(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.phase != Phase::Paused {
            return Err(Error::invalid("resume", self.phase));
        }
        let now = self.observe(now);
        let paused_at = self.paused_at.take().unwrap_or(now);
        let elapsed = (now - paused_at).max(Duration::zero());

        self.accumulated_pause += elapsed;
        self.next_break_at = self.next_break_at.map(|at| at + elapsed);
        self.phase = Phase::Working;
        info!(
            "Timer resumed after {}s, next break at {}",
            elapsed.num_seconds(),
            self.fmt_next_break()
        );
        Ok(())
    }

    /// Start a break right away
    pub fn force_break(&mut self, now: DateTime<Local>) -> Result<EngineEvent> {
        if !matches!(self.phase, Phase::Working | Phase::Paused) {
            return Err(Error::invalid("force a break", self.phase));
        }
        let now = self.observe(now);
        info!("Forcing immediate break");
        Ok(self.begin_break(now))
    }

    /// End the current break early if today's allowance permits
    pub fn request_override(&mut self, now: DateTime<Local>) -> Result<OverrideOutcome> {
        if self.phase != Phase::Breaking {
            return Err(Error::invalid("override", self.phase));
        }
        let now = self.observe(now);

        let outcome = self.ledger.try_consume(now);
        if !outcome.granted {
            return Ok(outcome);
        }

        self.hide_overlay();
        self.begin_work(now);
        if let Err(e) = self.notifier.override_used(outcome.remaining) {
            warn!("Failed to send override notification: {}", e);
        }
        info!(
            "Break ended by override, {} left today, next break at {}",
            outcome.remaining,
            self.fmt_next_break()
        );
        Ok(outcome)
    }

    /// Return to `Idle`, closing any active break
    pub fn stop(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.phase == Phase::Idle {
            return Err(Error::invalid("stop", self.phase));
        }
        self.observe(now);
        if self.phase == Phase::Breaking {
            self.hide_overlay();
        }

        self.phase = Phase::Idle;
        self.next_break_at = None;
        self.break_ends_at = None;
        self.paused_at = None;
        self.warning_fired = false;
        self.accumulated_pause = Duration::zero();
        info!("Timer stopped");
        Ok(())
    }

    /// Advance the state machine to `now`, firing each due side effect once
    pub fn tick(&mut self, now: DateTime<Local>) -> TickReport {
        let mut report = TickReport::default();
        if let Some(seen) = self.last_seen {
            if now < seen {
                report.clock_regressed_by = Some(seen - now);
            }
        }
        let now = self.observe(now);

        match self.phase {
            Phase::Idle | Phase::Paused => {}
            Phase::Working => {
                let Some(next_break_at) = self.next_break_at else {
                    return report;
                };

                if !self.warning_fired && now >= next_break_at - self.settings.warning_lead {
                    let remaining_seconds = whole_seconds(next_break_at - now);
                    self.warning_fired = true;
                    if let Err(e) = self.notifier.countdown(remaining_seconds) {
                        warn!("Failed to send countdown notification: {}", e);
                    }
                    report
                        .events
                        .push(EngineEvent::CountdownWarned { remaining_seconds });
                }

                if now >= next_break_at {
                    report.events.push(self.begin_break(now));
                }
            }
            Phase::Breaking => {
                if self.break_ends_at.is_some_and(|ends| now >= ends) {
                    self.hide_overlay();
                    report.persist_error = self.ledger.store_mut().record_break_completed(now).err();
                    self.begin_work(now);

                    let (remaining, rollover_error) = self.ledger.remaining_today(now);
                    if report.persist_error.is_none() {
                        report.persist_error = rollover_error;
                    }
                    if let Err(e) = self.notifier.break_ended(remaining) {
                        warn!("Failed to send break-end notification: {}", e);
                    }
                    info!("Break over, next break at {}", self.fmt_next_break());
                    report.events.push(EngineEvent::BreakCompleted {
                        next_break_at: self.next_break_at.unwrap_or(now),
                    });
                }
            }
        }

        report
    }

    // Internals

    fn observe(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        let now = self.last_seen.map_or(now, |seen| now.max(seen));
        self.last_seen = Some(now);
        now
    }

    fn begin_work(&mut self, now: DateTime<Local>) {
        self.phase = Phase::Working;
        self.next_break_at = Some(now + self.settings.work);
        self.break_ends_at = None;
        self.paused_at = None;
        self.warning_fired = false;
        self.accumulated_pause = Duration::zero();
    }

    fn begin_break(&mut self, now: DateTime<Local>) -> EngineEvent {
        let ends_at = now + self.settings.break_duration;
        let message = self.pick_message();

        self.phase = Phase::Breaking;
        self.break_ends_at = Some(ends_at);
        self.next_break_at = None;
        self.paused_at = None;

        if let Err(e) = self.notifier.break_started(self.settings.break_duration) {
            warn!("Failed to send break-start notification: {}", e);
        }
        if let Err(e) = self.overlay.show(&message) {
            warn!("Failed to show break overlay: {}", e);
        }
        info!("Break started, ends at {}", ends_at.format("%H:%M:%S"));

        EngineEvent::BreakStarted { message, ends_at }
    }

    fn hide_overlay(&mut self) {
        if !self.overlay.is_active() {
            debug!("Overlay already hidden");
            return;
        }
        if let Err(e) = self.overlay.hide() {
            warn!("Failed to hide break overlay: {}", e);
        }
    }

    fn pick_message(&self) -> String {
        self.settings
            .messages
            .iter()
            .filter(|m| !m.trim().is_empty())
            .collect::<Vec<_>>()
            .choose(&mut rand::thread_rng())
            .map(|m| m.to_string())
            .unwrap_or_default()
    }

    fn fmt_next_break(&self) -> String {
        self.next_break_at
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Whole seconds, rounded up, never negative
fn whole_seconds(d: Duration) -> u64 {
    let millis = d.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}
