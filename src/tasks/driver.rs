//! Timer driver background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, EngineEvent, TickReport};

/// Tick cadence of the driver
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that ticks the engine once per `period`
pub async fn timer_driver_task(state: Arc<AppState>, period: Duration) {
    info!("Starting timer driver task");

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match state.tick() {
            Ok(report) => log_report(&report),
            Err(e) => error!("Timer tick failed: {}", e),
        }
    }
}

/// Log what a tick did
pub fn log_report(report: &TickReport) {
    if let Some(lag) = report.clock_regressed_by {
        warn!(
            "System clock moved backwards by {}s, holding timer position",
            lag.num_seconds()
        );
    }

    if let Some(e) = &report.persist_error {
        error!("Failed to persist break statistics: {}", e);
    }

    for event in &report.events {
        match event {
            EngineEvent::CountdownWarned { remaining_seconds } => {
                info!("Countdown warning sent, break in {}s", remaining_seconds)
            }
            EngineEvent::BreakStarted { message, ends_at } => {
                info!(
                    "Break started until {}: {}",
                    ends_at.format("%H:%M:%S"),
                    message
                )
            }
            EngineEvent::BreakCompleted { next_break_at } => {
                info!(
                    "Break ended - resuming work timer, next break at {}",
                    next_break_at.format("%H:%M:%S")
                )
            }
        }
    }

    if report.events.is_empty() {
        debug!("Tick: nothing due");
    }
}
