//! Configuration management

use ag3ntum_core::{ConfigManager, ConsoleConfig, CONFIG_FILE_NAMES};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SettingsManager;

impl SettingsManager {
    /// Get the ag3ntum home directory (~/.ag3ntum)
    pub fn ag3ntum_home() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("AG3NTUM_HOME") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".ag3ntum"))
    }

    /// Get the user-level config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::ag3ntum_home()?.join(CONFIG_FILE_NAMES[0]))
    }

    /// Load the effective configuration.
    ///
    /// A config file in the working directory wins over the user-level one;
    /// `AG3NTUM_*` environment variables override both.
    pub fn load() -> Result<(ConsoleConfig, Option<PathBuf>)> {
        let cwd = std::env::current_dir()?;
        let (mut config, path) = Self::load_from(&cwd, &Self::ag3ntum_home()?)?;
        config.apply_env();
        Ok((config, path))
    }

    fn load_from(project_dir: &Path, home: &Path) -> Result<(ConsoleConfig, Option<PathBuf>)> {
        let mut manager = ConfigManager::new();

        let path = ConfigManager::find_config_file(project_dir)
            .or_else(|| ConfigManager::find_config_file(home));

        match path {
            Some(path) => {
                debug!("loading config from {}", path.display());
                let config = manager
                    .load(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))?;
                Ok((config, Some(path)))
            }
            None => Ok((ConsoleConfig::default(), None)),
        }
    }

    /// Load only the user-level config file, without overrides
    pub fn load_user() -> Result<ConsoleConfig> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(ConsoleConfig::default());
        }
        ConfigManager::new()
            .load(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))
    }

    /// Save the configuration to the user-level config file
    pub fn save(config: &ConsoleConfig) -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::save_to(config, &path)?;
        Ok(path)
    }

    fn save_to(config: &ConsoleConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        ConfigManager::new()
            .save(config, path)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        // The file may hold a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_config_wins_over_home() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();

        let mut home_config = ConsoleConfig::default();
        home_config.list_limit = 50;
        SettingsManager::save_to(&home_config, &home.path().join(CONFIG_FILE_NAMES[0])).unwrap();

        let (config, path) = SettingsManager::load_from(project.path(), home.path()).unwrap();
        assert_eq!(config.list_limit, 50);
        assert_eq!(path.unwrap().parent().unwrap(), home.path());

        let mut project_config = ConsoleConfig::default();
        project_config.list_limit = 7;
        SettingsManager::save_to(&project_config, &project.path().join(CONFIG_FILE_NAMES[0])).unwrap();

        let (config, _) = SettingsManager::load_from(project.path(), home.path()).unwrap();
        assert_eq!(config.list_limit, 7);
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let empty = TempDir::new().unwrap();
        let (config, path) = SettingsManager::load_from(empty.path(), empty.path()).unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert!(path.is_none());
    }
}
