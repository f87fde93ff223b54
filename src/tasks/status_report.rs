//! Periodic status logging

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{info, warn};

use crate::state::{AppState, Phase, StatusSnapshot};

/// Background task that logs the timer status every `period`
pub async fn status_report_task(state: Arc<AppState>, period: Duration) {
    let mut interval = interval(period);

    loop {
        interval.tick().await;
        match state.snapshot() {
            Ok(snapshot) => info!("{}", describe(&snapshot)),
            Err(e) => warn!("Failed to read timer status: {}", e),
        }
    }
}

/// One-line description of a status snapshot
pub fn describe(snapshot: &StatusSnapshot) -> String {
    let secs = snapshot.seconds_remaining_in_phase;
    match snapshot.phase {
        Phase::Idle => "Timer idle".to_string(),
        Phase::Working => format!(
            "Next break in {} minutes ({} overrides left today)",
            secs.div_ceil(60),
            snapshot.overrides_remaining_today
        ),
        Phase::Breaking => format!("In break - {}s remaining", secs),
        Phase::Paused => format!("Paused - {} minutes of work left", secs.div_ceil(60)),
    }
}
