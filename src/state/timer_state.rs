//! Phase enumeration and the status projection

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the work/break cycle.
///
/// The warning sub-states of a work period are not separate variants:
/// "warning pending" and "warning fired" are both `Working`, told apart by
/// [`StatusSnapshot::warning_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Working,
    Breaking,
    Paused,
}

impl Phase {
    /// Alias for a work period whose countdown warning has not fired yet
    pub const WARNING_PENDING: Phase = Phase::Working;
    /// Alias for a work period whose countdown warning already fired
    pub const WARNING_FIRED: Phase = Phase::Working;

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Working => "working",
            Phase::Breaking => "breaking",
            Phase::Paused => "paused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only status projection for reporting surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    /// Seconds left in the current phase; frozen while paused, zero when idle
    pub seconds_remaining_in_phase: u64,
    pub overrides_remaining_today: u32,
    pub warning_fired: bool,
}

impl StatusSnapshot {
    /// Snapshot of an engine that has not been started
    pub fn idle(overrides_remaining_today: u32) -> Self {
        Self {
            phase: Phase::Idle,
            seconds_remaining_in_phase: 0,
            overrides_remaining_today,
            warning_fired: false,
        }
    }

    /// Check if a break is in progress
    pub fn is_breaking(&self) -> bool {
        self.phase == Phase::Breaking
    }
}
