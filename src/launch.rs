use crate::timer;
use crate::tui;
use anyhow::{Context, Result, bail};
use std::process::Command;
use std::time::Duration;
use tracing::{info, warn};

/// Runs a game, blocks until it exits and reports how long it ran.
pub trait Launcher {
    fn launch(&mut self, path: &str) -> Result<Duration>;
}

/// Launches the game as a child process. While it runs the terminal is handed
/// back so console games can use it.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, path: &str) -> Result<Duration> {
        tui::leave().context("Failed to release terminal")?;
        let result = timed_run(path);
        tui::enter().context("Failed to reclaim terminal")?;
        result
    }
}

/// Time the game process alone; the terminal handoff is not part of a session.
pub fn timed_run(path: &str) -> Result<Duration> {
    timer::measure(|| run(path))
}

/// Start `path` and wait for it. Any non-success exit is an error.
pub fn run(path: &str) -> Result<()> {
    info!(path, "launching game");
    let status = Command::new(path)
        .status()
        .with_context(|| format!("Failed to start {}", path))?;
    if !status.success() {
        warn!(path, %status, "game exited with failure");
        bail!("{} exited with {}", path, status);
    }
    Ok(())
}
