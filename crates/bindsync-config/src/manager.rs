//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    types::{ConfigManager as ConfigManagerTrait, SyncConfig},
};

const DEFAULT_ENV_PREFIX: &str = "BINDSYNC";

/// Layered configuration loader: defaults, then the TOML file, then
/// `<PREFIX>_SECTION__KEY` environment variables, then `<PREFIX>_TOKEN`.
pub struct ConfigManager {
    config_path: PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Manager for the default location
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// `<config dir>/bindsync/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bindsync")
            .join("config.toml")
    }

    /// Parse a TOML document on its own, without file or env layers
    pub fn from_toml_str(content: &str) -> Result<SyncConfig> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn token_override(&self) -> Option<String> {
        std::env::var(format!("{}_TOKEN", self.env_prefix))
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

impl ConfigManagerTrait for ConfigManager {
    fn load_config(&mut self) -> Result<SyncConfig> {
        debug!(path = %self.config_path.display(), "Loading configuration");

        let builder = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut sync_config: SyncConfig = builder.build()?.try_deserialize()?;
        if let Some(token) = self.token_override() {
            debug!("Using token from environment");
            sync_config.remote.token = Some(token);
        }
        Ok(sync_config)
    }

    fn save_config(&self, config: &SyncConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config)?;
        let parent = self.config_path.parent().ok_or_else(|| {
            ConfigError::NotFound(format!(
                "no parent directory for {}",
                self.config_path.display()
            ))
        })?;
        std::fs::create_dir_all(parent)?;
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let path = ConfigManager::default_config_path();
        assert!(path.ends_with("bindsync/config.toml"));
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = ConfigManager::from_toml_str(
            r#"
            [remote]
            database_id = "abc"

            [properties]
            action = "Keys"
            "#,
        )
        .unwrap();
        assert_eq!(config.remote.database_id.as_deref(), Some("abc"));
        assert_eq!(config.properties.action, "Keys");
        assert_eq!(config.properties.name, "Name");
        assert_eq!(config.remote.page_size, 100);
    }
}
