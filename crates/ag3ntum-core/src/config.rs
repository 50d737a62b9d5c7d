//! Configuration management for the Ag3ntum console

use crate::cache::CacheConfig;
use crate::error::{ConsoleError, Result};
use ag3ntum_types::is_valid_session_id;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "ag3ntum.config.yaml",
    "ag3ntum.config.yml",
    "ag3ntum.config.json",
];

pub const ENV_SERVER_URL: &str = "AG3NTUM_SERVER_URL";
pub const ENV_TOKEN: &str = "AG3NTUM_TOKEN";
pub const ENV_SESSION: &str = "AG3NTUM_SESSION";

/// Console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the API, including any version prefix
    pub server_url: String,
    pub auth_token: Option<String>,
    pub default_session: Option<String>,
    /// Maximum entries requested per directory listing
    pub list_limit: u32,
    pub include_hidden: bool,
    pub cache: CachePolicies,
    pub render: RenderSettings,
    pub widgets: WidgetLimits,
    /// How long a navigation highlight stays on, in milliseconds
    pub highlight_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:40080/api/v1".to_string(),
            auth_token: None,
            default_session: None,
            list_limit: 500,
            include_hidden: false,
            cache: CachePolicies::default(),
            render: RenderSettings::default(),
            widgets: WidgetLimits::default(),
            highlight_ms: 3000,
        }
    }
}

impl ConsoleConfig {
    /// Apply `AG3NTUM_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.auth_token = Some(token);
        }
        if let Some(session) = lookup(ENV_SESSION).filter(|v| !v.is_empty()) {
            self.default_session = Some(session);
        }
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

/// Cache policy as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub ttl_secs: u64,
    #[serde(default)]
    pub stale_while_revalidate: bool,
}

impl From<CachePolicy> for CacheConfig {
    fn from(policy: CachePolicy) -> Self {
        CacheConfig {
            ttl: Duration::from_secs(policy.ttl_secs),
            stale_while_revalidate: policy.stale_while_revalidate,
        }
    }
}

/// Named cache policies for the read endpoints outside the file tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicies {
    /// Lists that change often, such as sessions
    pub frequent: CachePolicy,
    /// Reference data that rarely changes, such as skills
    pub reference: CachePolicy,
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self {
            frequent: CachePolicy {
                ttl_secs: 60,
                stale_while_revalidate: true,
            },
            reference: CachePolicy {
                ttl_secs: 300,
                stale_while_revalidate: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub class_prefix: String,
    pub wrap_container: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            class_prefix: "md".to_string(),
            wrap_container: true,
        }
    }
}

/// Line limits of inline file widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetLimits {
    /// Lines shown before the widget is expanded
    pub preview_lines: usize,
    /// Hard ceiling of lines shown when expanded
    pub max_lines: usize,
}

impl Default for WidgetLimits {
    fn default() -> Self {
        Self {
            preview_lines: 10,
            max_lines: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: ValidationError) -> Self {
        self.valid = false;
        self.errors.push(error);
        self
    }

    pub fn with_warning(mut self, warning: ValidationWarning) -> Self {
        self.warnings.push(warning);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration manager for loading and saving console configurations
pub struct ConfigManager {
    cache: std::collections::HashMap<PathBuf, CachedConfig>,
}

struct CachedConfig {
    config: ConsoleConfig,
    modified_time: std::time::SystemTime,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            cache: std::collections::HashMap::new(),
        }
    }

    /// Find configuration file in a directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load configuration from a file
    pub fn load(&mut self, config_path: &Path) -> Result<ConsoleConfig> {
        let metadata = std::fs::metadata(config_path)?;
        let modified_time = metadata
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        if let Some(cached) = self.cache.get(config_path) {
            if cached.modified_time == modified_time {
                return Ok(cached.config.clone());
            }
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: ConsoleConfig = if is_json(config_path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.cache.insert(
            config_path.to_path_buf(),
            CachedConfig {
                config: config.clone(),
                modified_time,
            },
        );

        Ok(config)
    }

    /// Load configuration from a directory (searches for config files)
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<(ConsoleConfig, PathBuf)> {
        let config_path = Self::find_config_file(dir)
            .ok_or_else(|| ConsoleError::ConfigNotFound(dir.display().to_string()))?;

        let config = self.load(&config_path)?;
        Ok((config, config_path))
    }

    /// Validate a configuration
    pub fn validate(&self, config: &ConsoleConfig) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if !(config.server_url.starts_with("http://") || config.server_url.starts_with("https://"))
        {
            result = result.with_error(ValidationError {
                field: "server_url".to_string(),
                message: "Server URL must start with http:// or https://".to_string(),
                code: "INVALID_SERVER_URL".to_string(),
            });
        }

        if let Some(ref session) = config.default_session {
            if !is_valid_session_id(session) {
                result = result.with_error(ValidationError {
                    field: "default_session".to_string(),
                    message: format!("Not a valid session id: {}", session),
                    code: "INVALID_SESSION_ID".to_string(),
                });
            }
        }

        if config.list_limit == 0 {
            result = result.with_error(ValidationError {
                field: "list_limit".to_string(),
                message: "Listing limit must be greater than zero".to_string(),
                code: "INVALID_LIMIT".to_string(),
            });
        }

        if config.widgets.preview_lines == 0
            || config.widgets.preview_lines > config.widgets.max_lines
        {
            result = result.with_error(ValidationError {
                field: "widgets".to_string(),
                message: "preview_lines must be between 1 and max_lines".to_string(),
                code: "INVALID_WIDGET_LIMITS".to_string(),
            });
        }

        if config.auth_token.is_none() {
            result = result.with_warning(ValidationWarning {
                field: "auth_token".to_string(),
                message: "No auth token configured; requests will be anonymous".to_string(),
                suggestion: Some(format!("Set auth_token or export {}", ENV_TOKEN)),
            });
        }

        for (name, policy) in [
            ("cache.frequent", config.cache.frequent),
            ("cache.reference", config.cache.reference),
        ] {
            if policy.ttl_secs == 0 {
                result = result.with_warning(ValidationWarning {
                    field: name.to_string(),
                    message: "A zero TTL disables caching for this policy".to_string(),
                    suggestion: None,
                });
            }
        }

        result
    }

    /// Save configuration to a file
    pub fn save(&self, config: &ConsoleConfig, config_path: &Path) -> Result<()> {
        let content = if is_json(config_path) {
            serde_json::to_string_pretty(config)?
        } else {
            serde_yaml::to_string(config)?
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml_with_partial_fields() -> Result<()> {
        let dir = TempDir::new()?;
        let content = r#"
server_url: https://agent.example.com/api/v1
default_session: 20240115_143052_a1b2c3d4
cache:
  frequent:
    ttl_secs: 30
    stale_while_revalidate: true
"#;
        std::fs::write(dir.path().join("ag3ntum.config.yaml"), content)?;

        let mut manager = ConfigManager::new();
        let (config, _) = manager.load_from_directory(dir.path())?;

        assert_eq!(config.server_url, "https://agent.example.com/api/v1");
        assert_eq!(config.cache.frequent.ttl_secs, 30);
        assert_eq!(config.cache.reference.ttl_secs, 300);
        assert_eq!(config.widgets.preview_lines, 10);
        assert_eq!(config.highlight_ms, 3000);
        assert!(manager.validate(&config).valid);
        Ok(())
    }

    #[test]
    fn test_missing_config_reports_directory() {
        let dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new();
        let result = manager.load_from_directory(dir.path());
        assert!(matches!(result, Err(ConsoleError::ConfigNotFound(_))));
    }

    #[test]
    fn test_save_and_reload_json() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("ag3ntum.config.json");
        let mut config = ConsoleConfig::default();
        config.list_limit = 50;

        let mut manager = ConfigManager::new();
        manager.save(&config, &path)?;
        let loaded = manager.load(&path)?;

        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ConsoleConfig {
            server_url: "agent.example.com".to_string(),
            default_session: Some("../../etc/passwd".to_string()),
            list_limit: 0,
            ..ConsoleConfig::default()
        };

        let result = ConfigManager::new().validate(&config);
        assert!(!result.valid);
        let codes: Vec<_> = result.errors.iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"INVALID_SERVER_URL"));
        assert!(codes.contains(&"INVALID_SESSION_ID"));
        assert!(codes.contains(&"INVALID_LIMIT"));
        assert!(result.warnings.iter().any(|w| w.field == "auth_token"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| match key {
            ENV_SERVER_URL => Some("https://override.example.com".to_string()),
            ENV_TOKEN => Some("secret".to_string()),
            ENV_SESSION => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.server_url, "https://override.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert!(config.default_session.is_none());
    }

    #[test]
    fn test_policy_conversion() {
        let cache: CacheConfig = CachePolicies::default().frequent.into();
        assert_eq!(cache.ttl, Duration::from_secs(60));
        assert!(cache.stale_while_revalidate);
    }
}
