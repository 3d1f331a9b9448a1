use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STORE_FILE: &str = "gameinfo.csv";

/// Column names written to a freshly created store.
pub const DEFAULT_HEADER: [&str; 8] = [
    "id",
    "game_name",
    "version",
    "game_file_patn",
    "reg_date",
    "last_play",
    "bef_play_time",
    "total",
];

/// One tracked game. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub launch_path: String,
    pub first_played: String,
    pub last_played: String,
    pub last_session_seconds: Option<u64>,
    pub total_seconds: Option<u64>,
}

impl GameRecord {
    pub fn new(id: String, name: String, version: String, launch_path: String) -> Self {
        GameRecord {
            id,
            name,
            version,
            launch_path,
            first_played: String::new(),
            last_played: String::new(),
            last_session_seconds: None,
            total_seconds: None,
        }
    }

    /// Stamp the play dates before a launch. `first_played` is only ever
    /// written once.
    pub fn mark_played(&mut self, today: &str) {
        if self.first_played.is_empty() {
            self.first_played = today.to_string();
        }
        self.last_played = today.to_string();
    }

    /// Record a finished session of `seconds`; the total accumulates.
    pub fn add_session(&mut self, seconds: u64) {
        self.last_session_seconds = Some(seconds);
        let total = self.total_seconds.unwrap_or(0);
        self.total_seconds = Some(total.saturating_add(seconds));
    }
}

/// The persisted game table: a header row plus the records in file order.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    header: Vec<String>,
    records: Vec<GameRecord>,
}

impl RecordStore {
    /// Read the whole table from `path`, creating a header-only file first if
    /// none exists.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            init_file(path)?;
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let raw_header = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone();
        let header = if raw_header.is_empty() {
            default_header()
        } else {
            raw_header.iter().map(str::to_string).collect()
        };

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            // Row 1 is the header
            let line = index + 2;
            let row: StringRecord =
                row.with_context(|| format!("Failed to read row {} of {}", line, path.display()))?;
            let record: GameRecord = row
                .deserialize(None)
                .with_context(|| format!("Malformed row {} in {}", line, path.display()))?;
            records.push(record);
        }

        debug!(path = %path.display(), records = records.len(), "loaded game table");

        Ok(RecordStore {
            path: path.to_path_buf(),
            header,
            records,
        })
    }

    /// Rewrite the whole file with the current header and records.
    pub fn save(&self) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;

        writer
            .write_record(&self.header)
            .with_context(|| format!("Failed to encode header for {}", self.path.display()))?;
        for record in &self.records {
            writer
                .serialize(record)
                .with_context(|| format!("Failed to encode game {}", record.id))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = self.records.len(), "saved game table");
        Ok(())
    }

    /// Append a new game with the next free id and return a copy of it.
    pub fn add_game(&mut self, name: &str, version: &str, launch_path: &str) -> GameRecord {
        let record = GameRecord::new(
            self.next_id(),
            name.to_string(),
            version.to_string(),
            launch_path.to_string(),
        );
        info!(id = %record.id, name = %record.name, "registered game");
        self.records.push(record.clone());
        record
    }

    fn next_id(&self) -> String {
        let highest = self
            .records
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max();
        match highest {
            Some(id) => (id + 1).to_string(),
            None => (self.records.len() + 1).to_string(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [GameRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_header() -> Vec<String> {
    DEFAULT_HEADER.iter().map(|s| s.to_string()).collect()
}

fn init_file(path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer
        .write_record(DEFAULT_HEADER)
        .with_context(|| format!("Failed to encode header for {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "created empty game table");
    Ok(())
}

/// Make sure the directory holding the store exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}
