use anyhow::Result;
use std::time::{Duration, Instant};

/// Run `action` to completion and return how long it took.
///
/// A failing action yields its error and no duration, so a crashed launch is
/// never recorded as a session.
pub fn measure<F>(action: F) -> Result<Duration>
where
    F: FnOnce() -> Result<()>,
{
    let start = Instant::now();
    action()?;
    Ok(start.elapsed())
}

/// Format whole seconds as `HH:MM:SS`. Hours are not capped at 99.
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
