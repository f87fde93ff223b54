//! Error types shared by the engine, the state store and configuration

use std::path::PathBuf;
use thiserror::Error;

use crate::state::Phase;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for engine operations
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was requested from a phase that does not allow it.
    /// The engine state is left untouched.
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },

    /// Durable storage failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Rejected timer configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The shared engine lock was poisoned by a panicking holder
    #[error("failed to lock timer engine: {0}")]
    LockPoisoned(String),
}

impl Error {
    pub(crate) fn invalid(operation: &'static str, phase: Phase) -> Self {
        Self::InvalidTransition { operation, phase }
    }
}

/// Failures reading or writing the persisted state record
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read state file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse state file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write state file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
