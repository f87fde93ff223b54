//! Move Me - a work/break reminder
//!
//! This library provides the break timer state machine, the persisted
//! override/statistics bookkeeping and the services the timer drives.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::{Cli, Settings};
pub use error::{Error, PersistenceError, Result};
pub use state::{AppState, Phase, StateStore, StatusSnapshot, TimerEngine, TimerSettings};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
