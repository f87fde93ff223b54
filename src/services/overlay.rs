//! Break overlay surfaces

use std::process::{Child, Command};

use anyhow::Context;
use tracing::{debug, info, warn};

/// Fullscreen break overlay.
///
/// `show` while already shown and `hide` while already hidden are no-ops.
pub trait OverlaySurface: Send {
    fn show(&mut self, message: &str) -> anyhow::Result<()>;
    fn hide(&mut self) -> anyhow::Result<()>;
    fn is_active(&self) -> bool;
}

/// Overlay that only logs; used in dry-run mode
#[derive(Debug, Default)]
pub struct HeadlessOverlay {
    active: bool,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlaySurface for HeadlessOverlay {
    fn show(&mut self, message: &str) -> anyhow::Result<()> {
        if self.active {
            return Ok(());
        }
        info!("Break overlay (dry run): {}", message);
        self.active = true;
        Ok(())
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        if self.active {
            info!("Break overlay (dry run) hidden");
            self.active = false;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Overlay rendered by an external program.
///
/// The message is appended as the last argument; hiding kills the process.
#[derive(Debug)]
pub struct CommandOverlay {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandOverlay {
    /// Build from an argv; fails when it is empty
    pub fn new(argv: &[String]) -> anyhow::Result<Self> {
        let (program, args) = argv
            .split_first()
            .context("overlay command must name a program")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            child: None,
        })
    }

    /// Drop the handle if the overlay program already exited on its own
    fn reap(&mut self) {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Overlay process exited with {}", status);
                    self.child = None;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to poll overlay process: {}", e),
            }
        }
    }
}

impl OverlaySurface for CommandOverlay {
    fn show(&mut self, message: &str) -> anyhow::Result<()> {
        self.reap();
        if self.child.is_some() {
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .spawn()
            .with_context(|| format!("failed to spawn overlay command {}", self.program))?;
        info!("Break overlay started (pid {})", child.id());
        self.child = Some(child);
        Ok(())
    }

    fn hide(&mut self) -> anyhow::Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_none() {
            child.kill().context("failed to stop overlay process")?;
        }
        child.wait()?;
        info!("Break overlay closed");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for CommandOverlay {
    fn drop(&mut self) {
        if let Err(e) = self.hide() {
            warn!("Failed to close overlay on drop: {}", e);
        }
    }
}
