//! Daily override allowance on top of the state store

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::store::StateStore;
use crate::error::PersistenceError;

/// Result of an override attempt.
///
/// `persist_error` is set when the grant happened but could not be written
/// to disk; the grant still stands for the running process.
#[derive(Debug)]
#[must_use]
pub struct OverrideOutcome {
    pub granted: bool,
    pub remaining: u32,
    pub persist_error: Option<PersistenceError>,
}

impl OverrideOutcome {
    fn denied() -> Self {
        Self {
            granted: false,
            remaining: 0,
            persist_error: None,
        }
    }
}

/// Rate limiter for manual break overrides
#[derive(Debug)]
pub struct OverrideLedger {
    store: StateStore,
    daily_limit: u32,
}

impl OverrideLedger {
    pub fn new(store: StateStore, daily_limit: u32) -> Self {
        Self { store, daily_limit }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Consume one override if today's allowance is not exhausted
    pub fn try_consume(&mut self, now: DateTime<Local>) -> OverrideOutcome {
        let (_, rollover_error) = self.store.roll_over(now.date_naive());

        let used = self.store.state().overrides_used_today;
        if used >= self.daily_limit {
            warn!(
                "Override denied, daily limit of {} reached",
                self.daily_limit
            );
            let mut outcome = OverrideOutcome::denied();
            outcome.persist_error = rollover_error;
            return outcome;
        }

        let persist_error = self
            .store
            .update(|state| {
                state.overrides_used_today += 1;
                state.total_overrides_used += 1;
            })
            .err();

        let used = self.store.state().overrides_used_today;
        info!("Override used, {} of {} today", used, self.daily_limit);

        OverrideOutcome {
            granted: true,
            remaining: self.daily_limit.saturating_sub(used),
            persist_error,
        }
    }

    /// Overrides left today. Applies (and persists) the daily rollover; a
    /// failed write is handed back while the reset holds in memory.
    pub fn remaining_today(&mut self, now: DateTime<Local>) -> (u32, Option<PersistenceError>) {
        let (_, rollover_error) = self.store.roll_over(now.date_naive());
        let remaining = self
            .daily_limit
            .saturating_sub(self.store.state().overrides_used_today);
        (remaining, rollover_error)
    }

    /// Overrides left on the date of `now`, without touching the store
    pub fn remaining_as_of(&self, now: DateTime<Local>) -> u32 {
        self.store
            .state()
            .remaining_on(now.date_naive(), self.daily_limit)
    }
}
