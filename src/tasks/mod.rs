//! Background tasks module
//!
//! The timer driver and the periodic status reporter run alongside the HTTP server.

pub mod driver;
pub mod status_report;

// Re-export main functions
pub use driver::{timer_driver_task, TICK_PERIOD};
pub use status_report::status_report_task;
