//! Persisted counters and the single writer that keeps them durable

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Durable record of override usage and break statistics.
///
/// Serialized as one JSON document; every save overwrites the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// Local calendar date of the last daily rollover
    pub last_run_date: NaiveDate,
    pub overrides_used_today: u32,
    pub total_breaks_completed: u64,
    pub total_overrides_used: u64,
    pub last_break_at: Option<DateTime<Local>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            last_run_date: NaiveDate::default(),
            overrides_used_today: 0,
            total_breaks_completed: 0,
            total_overrides_used: 0,
            last_break_at: None,
        }
    }
}

impl PersistedState {
    /// Overrides still available on `today` for the given limit, without
    /// applying the rollover
    pub fn remaining_on(&self, today: NaiveDate, daily_limit: u32) -> u32 {
        if self.last_run_date != today {
            daily_limit
        } else {
            daily_limit.saturating_sub(self.overrides_used_today)
        }
    }
}

/// Read the state file. `Ok(None)` when it does not exist.
pub fn read_state(path: &Path) -> Result<Option<PersistedState>, PersistenceError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the state file atomically: temp sibling, fsync, rename.
pub fn write_state(path: &Path, state: &PersistedState) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(state).map_err(PersistenceError::Encode)?;
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp_path = temp_path_for(path);
    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }

    debug!("State saved to {}", path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Owner of [`PersistedState`].
///
/// All mutations go through [`StateStore::update`], which persists
/// immediately. A failed write leaves the in-memory record authoritative and
/// marks the store dirty so [`StateStore::flush_if_dirty`] can retry.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: PersistedState,
    dirty: bool,
}

impl StateStore {
    /// Load the record at `path`.
    ///
    /// A missing file yields defaults. An unreadable or unparsable file also
    /// yields defaults, and the cause is returned so the caller can log it.
    pub fn open(path: impl Into<PathBuf>) -> (Self, Option<PersistenceError>) {
        let path = path.into();
        let (state, issue) = match read_state(&path) {
            Ok(Some(state)) => (state, None),
            Ok(None) => {
                info!("No state file at {}, starting fresh", path.display());
                (PersistedState::default(), None)
            }
            Err(e) => (PersistedState::default(), Some(e)),
        };

        (Self::with_state(path, state), issue)
    }

    /// Build a store around an already loaded record
    pub fn with_state(path: impl Into<PathBuf>, state: PersistedState) -> Self {
        Self {
            path: path.into(),
            state,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Whether the last mutation failed to reach disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Overwrite the file with the current record
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        match write_state(&self.path, &self.state) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(e)
            }
        }
    }

    /// Apply a mutation and persist it right away
    pub(crate) fn update<F>(&mut self, mutate: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&mut PersistedState),
    {
        mutate(&mut self.state);
        self.save()
    }

    /// Reset the daily counter when `today` differs from the recorded date.
    ///
    /// Returns whether a rollover happened. The reset holds in memory even if
    /// persisting it fails.
    pub fn roll_over(&mut self, today: NaiveDate) -> (bool, Option<PersistenceError>) {
        if self.state.last_run_date == today {
            return (false, None);
        }

        info!(
            "New day detected ({} -> {}), resetting daily override counter",
            self.state.last_run_date, today
        );
        let result = self.update(|state| {
            state.overrides_used_today = 0;
            state.last_run_date = today;
        });
        (true, result.err())
    }

    /// Count a completed break
    pub fn record_break_completed(&mut self, at: DateTime<Local>) -> Result<(), PersistenceError> {
        self.update(|state| {
            state.total_breaks_completed += 1;
            state.last_break_at = Some(at);
        })?;
        info!(
            "Break completed, total breaks: {}",
            self.state.total_breaks_completed
        );
        Ok(())
    }

    /// Retry the last failed write. Returns whether a write was attempted.
    pub fn flush_if_dirty(&mut self) -> Result<bool, PersistenceError> {
        if !self.dirty {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
