use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "game-manager";
pub const DIR_ENV: &str = "GAME_MANAGER_DIR";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Pick the data directory: explicit flag, then `GAME_MANAGER_DIR`, then the
/// per-user config directory.
pub fn resolve_data_dir(flag: Option<PathBuf>, env_value: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = env_override(env_value) {
        return Ok(dir);
    }
    let base_dirs = BaseDirs::new().context("Unable to determine platform config directory")?;
    Ok(base_dirs.config_dir().join(APP_NAME))
}

/// A blank `GAME_MANAGER_DIR` counts as unset.
fn env_override(value: Option<String>) -> Option<PathBuf> {
    value.filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// strftime pattern for the played-on columns
    pub date_format: String,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn sanitize(&mut self) {
        self.date_format = self.date_format.trim().to_string();
        let invalid = self.date_format.is_empty()
            || StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error));
        if invalid {
            self.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        self.log_level = self.log_level.trim().to_string();
        if self.log_level.is_empty() {
            self.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
    }

    /// Read `settings.json` from `data_dir`, falling back to defaults when the
    /// file is absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        settings.sanitize();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_flag_wins_over_env() {
        let dir = resolve_data_dir(
            Some(PathBuf::from("/tmp/from-flag")),
            Some("/tmp/from-env".to_string()),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/from-flag"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let dir = resolve_data_dir(None, Some("/tmp/from-env".to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/from-env"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        assert_eq!(env_override(None), None);
        assert_eq!(env_override(Some(String::new())), None);
        assert_eq!(env_override(Some("  \t".to_string())), None);
        assert_eq!(
            env_override(Some("/srv/games".to_string())),
            Some(PathBuf::from("/srv/games"))
        );
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.date_format, "%Y/%m/%d");
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "date_format": "%d.%m.%Y" }"#,
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.date_format, "%d.%m.%Y");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_invalid_values_are_sanitized() {
        let mut settings = Settings {
            date_format: "%Q-%".to_string(),
            log_level: "   ".to_string(),
        };
        settings.sanitize();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unparsable_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }
}
