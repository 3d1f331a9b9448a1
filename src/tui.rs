use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch to the alternate screen in raw mode.
pub fn enter() -> io::Result<()> {
    execute!(io::stdout(), EnterAlternateScreen, Hide)?;
    enable_raw_mode()?;
    Ok(())
}

/// Give the terminal back to the shell (or to a launched game).
pub fn leave() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

// RAII wrapper for automatic cleanup
pub struct TuiGuard {
    pub terminal: Tui,
}

impl TuiGuard {
    pub fn new() -> io::Result<Self> {
        enter()?;
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(TuiGuard { terminal })
    }
}

impl Drop for TuiGuard {
    fn drop(&mut self) {
        if let Err(err) = leave() {
            eprintln!("Error restoring terminal: {}", err);
        }
    }
}

impl std::ops::Deref for TuiGuard {
    type Target = Tui;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl std::ops::DerefMut for TuiGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}
