//! State management module
//!
//! The timer engine, its persisted counters and the shared application state.

pub mod app_state;
pub mod engine;
pub mod ledger;
pub mod store;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Stats};
pub use engine::{EngineEvent, TickReport, TimerEngine, TimerSettings};
pub use ledger::{OverrideLedger, OverrideOutcome};
pub use store::{PersistedState, StateStore};
pub use timer_state::{Phase, StatusSnapshot};
