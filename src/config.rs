//! User configuration
//!
//! Loads stream preferences from `~/.iostreams/config.toml`: which pager to
//! use, whether prompting is allowed, and the color preference.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::ColorPreference;
use crate::streams::IoStreams;

/// Environment variable that overrides the configured pager
pub const PAGER_OVERRIDE_ENV: &str = "IOSTREAMS_PAGER";

/// Stream preferences
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pager command; unset falls back to `$PAGER`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager: Option<String>,

    /// Whether interactive prompts are allowed
    #[serde(default = "default_prompt")]
    pub prompt: bool,

    /// "auto", "always" or "never"
    #[serde(default)]
    pub color: ColorPreference,
}

fn default_prompt() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pager: None,
            prompt: default_prompt(),
            color: ColorPreference::default(),
        }
    }
}

impl Config {
    /// Get config directory path (~/.iostreams)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".iostreams"))
    }

    /// Get config file path (~/.iostreams/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, or return default if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename config file to {}", path.display()))?;

        Ok(())
    }

    /// Resolve the pager from the override variable, then the config file.
    /// `None` leaves whatever `$PAGER` gave the bundle.
    pub fn resolve_pager(&self, override_value: Option<String>) -> Option<String> {
        override_value
            .filter(|value| !value.is_empty())
            .or_else(|| self.pager.clone())
    }

    /// Apply pager and prompt preferences to a bundle
    pub fn apply(&self, io: &mut IoStreams) {
        if let Some(pager) = self.resolve_pager(env::var(PAGER_OVERRIDE_ENV).ok()) {
            io.set_pager(pager);
        }
        io.set_never_prompt(!self.prompt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.prompt);
        assert_eq!(config.color, ColorPreference::Auto);
    }

    #[test]
    fn test_parse_all_fields() {
        let config: Config = toml::from_str(
            r#"
            pager = "less -S"
            prompt = false
            color = "never"
            "#,
        )
        .unwrap();
        assert_eq!(config.pager.as_deref(), Some("less -S"));
        assert!(!config.prompt);
        assert_eq!(config.color, ColorPreference::Never);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            pager: Some("more".to_string()),
            prompt: false,
            color: ColorPreference::Always,
        };
        config.save_to(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "color = \"sometimes\"").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_pager_precedence() {
        let config = Config {
            pager: Some("less".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolve_pager(Some("most".into())).as_deref(), Some("most"));
        assert_eq!(config.resolve_pager(Some(String::new())).as_deref(), Some("less"));
        assert_eq!(config.resolve_pager(None).as_deref(), Some("less"));
        assert_eq!(Config::default().resolve_pager(None), None);
    }

    #[test]
    fn test_apply_sets_prompt_and_pager() {
        let (mut io, _) = IoStreams::test();
        io.set_stdin_tty(true);
        io.set_stdout_tty(true);
        let config = Config {
            pager: Some("less".to_string()),
            prompt: false,
            ..Config::default()
        };
        config.apply(&mut io);
        assert!(!io.can_prompt());
        if env::var(PAGER_OVERRIDE_ENV).is_err() {
            assert_eq!(io.pager_command(), "less");
        }
    }
}
