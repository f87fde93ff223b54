//! External side-effect services
//!
//! Notification and break-overlay capabilities invoked by the timer engine.

pub mod notifier;
pub mod overlay;

// Re-export main types
pub use notifier::{DesktopNotifier, LogNotifier, Notifier};
pub use overlay::{CommandOverlay, HeadlessOverlay, OverlaySurface};
