use crate::store::{GameRecord, RecordStore};
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::warn;

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<String> {
    write!(output, "Enter game {} >> ", label)?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .with_context(|| format!("Failed to read game {}", label))?;
    Ok(line.trim().to_string())
}

/// Ask for a game's name, version and path, then append it to the store and
/// save.
pub fn add_game<R: BufRead, W: Write>(
    store: &mut RecordStore,
    input: &mut R,
    output: &mut W,
) -> Result<GameRecord> {
    let name = prompt(input, output, "name")?;
    if name.is_empty() {
        bail!("Game name must not be empty");
    }
    let version = prompt(input, output, "version")?;
    let path = prompt(input, output, "path")?;
    if path.is_empty() {
        bail!("Game path must not be empty");
    }
    if !Path::new(&path).exists() {
        warn!(path = %path, "game path does not exist yet");
        writeln!(output, "Warning: {} does not exist", path)?;
    }

    let record = store.add_game(&name, &version, &path);
    store.save()?;
    writeln!(
        output,
        "Added [{}] {} {} {}",
        record.id, record.name, record.version, record.launch_path
    )?;
    Ok(record)
}
