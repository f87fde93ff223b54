//! Configuration: CLI arguments and the JSON settings file

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::TimerSettings;

const APP_DIR: &str = "move-me";
const CONFIG_FILE: &str = "config.json";

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "move-me")]
#[command(about = "Work/break reminder that enforces regular screen breaks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Work duration in minutes before a break
    #[arg(short, long = "work", global = true)]
    pub work: Option<u64>,

    /// Break duration in minutes
    #[arg(short, long = "break", global = true)]
    pub break_minutes: Option<u64>,

    /// Daily limit for manual overrides
    #[arg(short, long = "overrides", global = true)]
    pub overrides: Option<u32>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable notification sounds
    #[arg(long, global = true)]
    pub no_sound: bool,

    /// Run without showing the break overlay
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Port for the local status API
    #[arg(short, long, default_value = "20554", global = true)]
    pub port: u16,

    /// Host address for the local status API
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub host: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the timer (default)
    Run,
    /// Show persisted statistics
    Status,
    /// Show or reset the configuration file
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

impl Cli {
    /// Parse configuration from command line arguments
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Settings file location: `--config` or the default
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(CONFIG_FILE)),
        }
    }

    /// Layer command-line flags over file settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(work) = self.work {
            settings.work_duration_minutes = work;
        }
        if let Some(break_minutes) = self.break_minutes {
            settings.break_duration_minutes = break_minutes;
        }
        if let Some(overrides) = self.overrides {
            settings.daily_override_limit = overrides;
        }
        if self.no_sound {
            settings.notification_sound = false;
        }
        if self.dry_run {
            settings.auto_lock_enabled = false;
        }
    }
}

/// `~/.config/move-me` or the platform equivalent
pub fn config_dir() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("could not determine the configuration directory")
}

/// Settings file contents. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration_minutes: u64,
    #[serde(default = "default_break_duration")]
    pub break_duration_minutes: u64,
    #[serde(default = "default_warning_time")]
    pub warning_time_seconds: u64,
    #[serde(default = "default_override_limit")]
    pub daily_override_limit: u32,
    #[serde(default = "default_true")]
    pub notification_sound: bool,
    /// When false the overlay is only logged (dry run)
    #[serde(default = "default_true")]
    pub auto_lock_enabled: bool,
    /// State file; relative paths live next to the settings file
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// External overlay program and its arguments; the message is appended
    #[serde(default)]
    pub overlay_command: Option<Vec<String>>,
    #[serde(default = "default_overlay_messages")]
    pub overlay_messages: Vec<String>,
}

// Default functions
fn default_work_duration() -> u64 {
    45
}
fn default_break_duration() -> u64 {
    5
}
fn default_warning_time() -> u64 {
    30
}
fn default_override_limit() -> u32 {
    3
}
fn default_true() -> bool {
    true
}
fn default_state_file() -> PathBuf {
    PathBuf::from("move_me_state.json")
}
fn default_overlay_messages() -> Vec<String> {
    [
        "Time to take a break! Your eyes and body need rest.",
        "Step away from the screen. Move around, stretch, and relax.",
        "A short break now will help you stay productive longer.",
        "Remember: regular breaks prevent strain and boost creativity.",
        "Stand up, walk around, and give your mind a moment to refresh.",
        "Your health is more important than any deadline.",
        "Taking breaks is not lazy - it's essential for your wellbeing.",
        "Look at something far away, blink often, and breathe deeply.",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration_minutes: default_work_duration(),
            break_duration_minutes: default_break_duration(),
            warning_time_seconds: default_warning_time(),
            daily_override_limit: default_override_limit(),
            notification_sound: true,
            auto_lock_enabled: true,
            state_file: default_state_file(),
            overlay_command: None,
            overlay_messages: default_overlay_messages(),
        }
    }
}

impl Settings {
    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Resolve the state file against the directory holding the settings file
    pub fn state_file_path(&self, config_path: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            return self.state_file.clone();
        }
        config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.state_file)
    }

    /// Validate into engine settings
    pub fn timer_settings(&self) -> crate::error::Result<TimerSettings> {
        TimerSettings::new(
            minutes(self.work_duration_minutes),
            minutes(self.break_duration_minutes),
            Duration::seconds(clamp_i64(self.warning_time_seconds)),
            self.daily_override_limit,
            self.overlay_messages.clone(),
        )
    }
}

fn minutes(value: u64) -> Duration {
    Duration::minutes(clamp_i64(value).min(i64::MAX / 60_000))
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX).min(i64::MAX / 1_000)
}
