//! Desktop notifications

use chrono::Duration;
use notify_rust::{Notification, Timeout};
use tracing::info;

const APP_NAME: &str = "Move Me";

/// Side-effect sink for user-facing notifications.
///
/// Every call is best-effort: the engine logs a returned error and carries on.
pub trait Notifier: Send {
    /// A break starts in `remaining_seconds`
    fn countdown(&self, remaining_seconds: u64) -> anyhow::Result<()>;

    fn break_started(&self, _duration: Duration) -> anyhow::Result<()> {
        Ok(())
    }

    fn break_ended(&self, _overrides_remaining: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn override_used(&self, _overrides_remaining: u32) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Human readable countdown, minutes above one minute
pub fn countdown_text(remaining_seconds: u64) -> String {
    if remaining_seconds > 60 {
        format!("Screen will lock in {} minute(s)", remaining_seconds / 60)
    } else {
        format!("Screen will lock in {} second(s)", remaining_seconds)
    }
}

pub fn override_text(overrides_remaining: u32) -> String {
    if overrides_remaining > 0 {
        format!(
            "Break skipped. {} override(s) remaining today.",
            overrides_remaining
        )
    } else {
        "Break skipped. No more overrides available today.".to_string()
    }
}

/// Notifications through the desktop notification daemon
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    sound: bool,
}

impl DesktopNotifier {
    pub fn new(sound: bool) -> Self {
        Self { sound }
    }

    fn send(&self, summary: &str, body: &str, timeout_ms: u32) -> anyhow::Result<()> {
        let mut notification = Notification::new();
        notification
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .timeout(Timeout::Milliseconds(timeout_ms));
        if self.sound {
            notification.sound_name("message-new-instant");
        }
        notification
            .show()
            .map_err(|e| anyhow::anyhow!("failed to show notification: {}", e))?;
        Ok(())
    }
}

impl Notifier for DesktopNotifier {
    fn countdown(&self, remaining_seconds: u64) -> anyhow::Result<()> {
        let timeout = if remaining_seconds <= 10 { 3_000 } else { 5_000 };
        self.send(
            "Break Time Approaching",
            &countdown_text(remaining_seconds),
            timeout,
        )
    }

    fn break_started(&self, duration: Duration) -> anyhow::Result<()> {
        self.send(
            "Break Time!",
            &format!("Taking a {}-minute break.", duration.num_minutes()),
            3_000,
        )
    }

    fn break_ended(&self, overrides_remaining: u32) -> anyhow::Result<()> {
        self.send(
            "Break Complete",
            &format!(
                "Break time is over. Welcome back! {} override(s) remaining today.",
                overrides_remaining
            ),
            3_000,
        )
    }

    fn override_used(&self, overrides_remaining: u32) -> anyhow::Result<()> {
        self.send("Break Skipped", &override_text(overrides_remaining), 5_000)
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn countdown(&self, remaining_seconds: u64) -> anyhow::Result<()> {
        info!("{}", countdown_text(remaining_seconds));
        Ok(())
    }

    fn break_started(&self, duration: Duration) -> anyhow::Result<()> {
        info!("Taking a {}-minute break", duration.num_minutes());
        Ok(())
    }

    fn override_used(&self, overrides_remaining: u32) -> anyhow::Result<()> {
        info!("{}", override_text(overrides_remaining));
        Ok(())
    }
}
