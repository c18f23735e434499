//! # Configuration Module
//!
//! Data directory layout and engine settings.
//!
//! Everything lives in the platform data directory under `moodmuse/`:
//! - Linux: `~/.local/share/moodmuse/`
//! - macOS: `~/Library/Application Support/moodmuse/`
//! - Windows: `%APPDATA%\moodmuse\`
//!
//! | File | Contents |
//! |---|---|
//! | `moodmuse.db` | saved playlists, feedback, preferences, mood history |
//! | `catalog.db` | local track catalog |
//! | `config.json` | [`EngineConfig`] (optional) |

use crate::lexicon::Lexicon;
use crate::resolver::DEFAULT_LIMIT;
use crate::tables::MoodTables;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the moodmuse data directory, creating it if needed.
///
/// # Errors
///
/// Fails if the platform data directory is unknown or the subdirectory
/// cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join("moodmuse");
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create moodmuse data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Path of the persistence database.
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("moodmuse.db"))
}

/// Path of the local track catalog.
pub fn get_catalog_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("catalog.db"))
}

/// Path of the optional engine config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("config.json"))
}

/// Engine settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Playlist length when a request does not give one.
    pub default_limit: usize,
    pub market: String,
    /// Upper bound for a single catalog call.
    pub catalog_timeout_ms: u64,
    /// Alternate lexicon JSON replacing the built-in word lists.
    pub lexicon_path: Option<PathBuf>,
    /// Alternate mood tables JSON replacing the built-in tables.
    pub mood_tables_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            market: crate::engine::DEFAULT_MARKET.to_string(),
            catalog_timeout_ms: 5000,
            lexicon_path: None,
            mood_tables_path: None,
        }
    }
}

impl EngineConfig {
    /// Load from the default config path; a missing file gives defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load from `path`; a missing file gives defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        anyhow::ensure!(config.default_limit > 0, "default_limit must be positive");
        Ok(config)
    }

    /// Write to `path` as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// The configured lexicon, or the built-in one.
    pub fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon_path {
            Some(path) => read_json(path, "lexicon"),
            None => Ok(Lexicon::default()),
        }
    }

    /// The configured mood tables, or the built-in ones.
    pub fn load_mood_tables(&self) -> Result<MoodTables> {
        match &self.mood_tables_path {
            Some(path) => read_json(path, "mood tables"),
            None => Ok(MoodTables::default()),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid {what} file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use tempfile::TempDir;

    #[test]
    fn test_data_paths_share_directory() {
        let db = get_db_path().expect("Should get db path");
        let catalog = get_catalog_path().expect("Should get catalog path");
        assert_eq!(db.parent(), catalog.parent());
        assert_eq!(db.file_name().unwrap(), "moodmuse.db");

        let parent = db.parent().expect("Should have parent directory");
        assert!(parent.is_dir());
        assert_eq!(parent.file_name().unwrap(), "moodmuse");
        assert!(db.is_absolute());
    }

    #[test]
    fn test_missing_config_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.market, "US");
        assert_eq!(config.catalog_timeout_ms, 5000);
    }

    #[test]
    fn test_partial_config_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"market": "GB"}"#).unwrap();
        let config = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config.market, "GB");
        assert_eq!(config.default_limit, 20);

        fs::write(&path, r#"{"default_limit": 0}"#).unwrap();
        assert!(EngineConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = EngineConfig {
            default_limit: 12,
            ..EngineConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_alternate_tables_are_loaded() {
        let dir = TempDir::new().unwrap();
        let tables_path = dir.path().join("tables.json");
        fs::write(
            &tables_path,
            r#"{"neutral": {"features": {}, "genres": ["jazz"]}}"#,
        )
        .unwrap();
        let lexicon_path = dir.path().join("lexicon.json");
        fs::write(&lexicon_path, r#"{"positive": ["sunny"]}"#).unwrap();

        let config = EngineConfig {
            mood_tables_path: Some(tables_path),
            lexicon_path: Some(lexicon_path),
            ..EngineConfig::default()
        };
        let tables = config.load_mood_tables().unwrap();
        assert_eq!(tables.profile(&Mood::Happy).genres, vec!["jazz".to_string()]);
        assert!(config.load_lexicon().unwrap().is_positive("sunny"));

        let broken = EngineConfig {
            lexicon_path: Some(dir.path().join("missing.json")),
            ..EngineConfig::default()
        };
        assert!(broken.load_lexicon().is_err());
    }
}
