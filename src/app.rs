use crate::launch::Launcher;
use crate::store::{GameRecord, RecordStore};
use crate::timer::format_hms;
use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::Path;
use tracing::{debug, info};

type Handler = fn(&mut App) -> Result<()>;

/// Key bindings. Keys not listed here are ignored.
const KEYMAP: &[(KeyCode, Handler)] = &[
    (KeyCode::Char('q'), App::quit),
    (KeyCode::Esc, App::quit),
    // Vim-style navigation
    (KeyCode::Char('k'), App::select_previous),
    (KeyCode::Up, App::select_previous),
    (KeyCode::Char('j'), App::select_next),
    (KeyCode::Down, App::select_next),
    (KeyCode::Char('g'), App::select_first),
    (KeyCode::Home, App::select_first),
    (KeyCode::Char('G'), App::select_last),
    (KeyCode::End, App::select_last),
    (KeyCode::Enter, App::launch_selected),
];

fn handler_for(code: KeyCode) -> Option<Handler> {
    KEYMAP
        .iter()
        .find(|(bound, _)| *bound == code)
        .map(|(_, handler)| *handler)
}

pub struct App {
    store: RecordStore,
    launcher: Box<dyn Launcher>,
    date_format: String,

    // UI state
    selected: usize,
    running: bool,
    clear_requested: bool,
    message: Option<String>,
}

impl App {
    pub fn new(store: RecordStore, launcher: Box<dyn Launcher>, date_format: String) -> Self {
        App {
            store,
            launcher,
            date_format,
            selected: 0,
            running: true,
            clear_requested: false,
            message: None,
        }
    }

    /// Block until the next terminal event and handle it.
    /// Returns true if the screen should be redrawn.
    pub fn handle_event(&mut self) -> Result<bool> {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key_event(key)?;
                Ok(true)
            }
            Event::Resize(_, _) => Ok(true),
            _ => Ok(false),
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Raw mode swallows SIGINT
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.quit();
        }
        match handler_for(key.code) {
            Some(handler) => handler(self),
            None => Ok(()),
        }
    }

    fn quit(&mut self) -> Result<()> {
        debug!("quit requested");
        self.running = false;
        Ok(())
    }

    fn select_previous(&mut self) -> Result<()> {
        self.selected = self.selected.saturating_sub(1);
        Ok(())
    }

    fn select_next(&mut self) -> Result<()> {
        let count = self.store.len();
        if count > 0 && self.selected < count - 1 {
            self.selected += 1;
        }
        Ok(())
    }

    fn select_first(&mut self) -> Result<()> {
        self.selected = 0;
        Ok(())
    }

    fn select_last(&mut self) -> Result<()> {
        self.selected = self.store.len().saturating_sub(1);
        Ok(())
    }

    fn launch_selected(&mut self) -> Result<()> {
        let today = Local::now().format(&self.date_format).to_string();
        self.launch_on(&today)
    }

    /// Play the selected game, then record the session under `today` and
    /// persist the table. A failed launch leaves the record as it was.
    pub fn launch_on(&mut self, today: &str) -> Result<()> {
        if self.store.is_empty() {
            return Ok(());
        }
        let index = self.selected;
        let path = self.store.records()[index].launch_path.clone();

        let seconds = self.launcher.launch(&path)?.as_secs();

        let record = &mut self.store.records_mut()[index];
        record.mark_played(today);
        record.add_session(seconds);
        info!(
            id = %record.id,
            name = %record.name,
            seconds,
            total = record.total_seconds.unwrap_or(0),
            "session recorded"
        );
        self.message = Some(format!("{} played for {}", record.name, format_hms(seconds)));

        self.store.save()?;
        self.clear_requested = true;
        Ok(())
    }

    /// True once after a launch, when the whole screen must be repainted.
    pub fn take_clear_request(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn header(&self) -> &[String] {
        self.store.header()
    }

    pub fn records(&self) -> &[GameRecord] {
        self.store.records()
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
