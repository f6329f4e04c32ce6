use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;

use crate::colors;
use crate::describe::GEMINI_API_KEY_ENV;
use crate::SYSTEM_PATHS;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_DESCRIBE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder whose dropped files get organized.
    pub source_root: PathBuf,

    /// Model used by the description collaborator.
    pub model: String,

    /// Upper bound on one description call, in seconds.
    pub describe_timeout_secs: u64,

    /// Whether to request descriptions at all.
    pub describe_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            model: DEFAULT_MODEL.to_string(),
            describe_timeout_secs: DEFAULT_DESCRIBE_TIMEOUT_SECS,
            describe_enabled: true,
        }
    }
}

fn default_source_root() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tidydrop.json"))
    }

    /// Get the path to the config backup file
    pub fn backup_path() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        Ok(config_path.with_extension("json.backup"))
    }

    /// Load config from disk, or write defaults if none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let data = fs::read_to_string(config_path).context("Failed to read config file")?;

            match serde_json::from_str(&data) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Config is corrupted, try backup
                    eprintln!("{} Config corrupted, trying backup...", "⚠️".yellow());
                    if let Ok(backup) = Self::load_backup(config_path) {
                        eprintln!("{} Restored from backup", "✅".green());
                        return Ok(backup);
                    }
                    Err(e.into())
                }
            }
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Load config from backup file
    fn load_backup(config_path: &Path) -> Result<Self> {
        let backup_path = config_path.with_extension("json.backup");
        if backup_path.exists() {
            let data = fs::read_to_string(&backup_path).context("Failed to read backup file")?;
            serde_json::from_str(&data).context("Failed to parse backup file")
        } else {
            Err(anyhow::anyhow!("No backup file found"))
        }
    }

    /// Save config to disk with backup
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        let backup_path = config_path.with_extension("json.backup");

        // Create backup of existing config if it exists
        if config_path.exists() {
            fs::copy(config_path, &backup_path).context("Failed to create backup")?;
        }

        // Write to temp file first
        let temp_path = config_path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&temp_path, &data).context("Failed to write temp config")?;

        // Atomically rename temp file to final location
        fs::rename(&temp_path, config_path).context("Failed to finalize config")?;

        Ok(())
    }

    /// The Gemini credential, if the environment carries one. Never read
    /// from or written to the config file.
    pub fn api_key() -> Option<String> {
        std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn describe_timeout(&self) -> Duration {
        Duration::from_secs(self.describe_timeout_secs)
    }

    /// Check if a path is a system path
    pub fn is_system_path(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        SYSTEM_PATHS
            .iter()
            .any(|sys: &&str| path_str.contains(&sys.to_lowercase()))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("{}", "🔧 CURRENT CONFIGURATION".bold().color(colors::HEADER));
        println!();

        println!(
            "{} Source root: {}",
            "•".cyan(),
            self.source_root.display().to_string().color(colors::PATH)
        );
        println!("{} Description model: {}", "•".cyan(), self.model);
        println!(
            "{} Description timeout: {}s",
            "•".cyan(),
            self.describe_timeout_secs
        );
        println!(
            "{} Descriptions: {}",
            "•".cyan(),
            if self.describe_enabled { "Enabled" } else { "Disabled" }
        );
        println!(
            "{} API key: {}",
            "•".cyan(),
            if Self::api_key().is_some() {
                "present (from environment)"
            } else {
                "not set (records get no description)"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.describe_enabled);
    }

    #[test]
    fn config_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.source_root = PathBuf::from("/tmp/drop");
        config.describe_timeout_secs = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.source_root, PathBuf::from("/tmp/drop"));
        assert_eq!(loaded.describe_timeout_secs, 3);
    }

    #[test]
    fn save_leaves_no_temp_file_and_keeps_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::default();
        config.save_to(&path).unwrap();
        config.save_to(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.with_extension("json.backup").exists());
    }

    #[test]
    fn corrupt_config_recovers_from_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.model = "backup-model".to_string();
        config.save_to(&path).unwrap();
        // Second save copies the good file to the backup slot.
        config.save_to(&path).unwrap();

        fs::write(&path, "{not json").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model, "backup-model");
    }

    #[test]
    fn system_paths_are_flagged() {
        assert!(Config::is_system_path(Path::new("/usr/share/fonts")));
        assert!(Config::is_system_path(Path::new(r"C:\Windows\Temp")));
        assert!(!Config::is_system_path(Path::new("/home/user/Downloads")));
    }
}
