// Configuration inspection

use std::path::PathBuf;

use bindsync_config::{ConfigManager, SyncConfig};

use super::{load_config, Command};
use crate::error::{CliError, CliResult};
use crate::output::print_success;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Effective configuration as TOML, token redacted
    Show,
    /// Path of the configuration file in use
    Path,
    /// Validate without touching the network
    Check,
}

pub struct ConfigCommand {
    pub config: Option<PathBuf>,
    pub action: ConfigAction,
}

impl ConfigCommand {
    pub fn new(config: Option<PathBuf>, action: ConfigAction) -> Self {
        Self { config, action }
    }

    fn path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(ConfigManager::default_config_path)
    }
}

/// TOML rendering with the credential masked
pub fn render_redacted(config: &SyncConfig) -> CliResult<String> {
    let mut shown = config.clone();
    if shown.remote.token.is_some() {
        shown.remote.token = Some("********".to_string());
    }
    toml::to_string_pretty(&shown).map_err(|e| CliError::Internal(e.to_string()))
}

#[async_trait::async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> CliResult<()> {
        match self.action {
            ConfigAction::Path => {
                println!("{}", self.path().display());
            }
            ConfigAction::Show => {
                let config = load_config(self.config.as_deref())?;
                print!("{}", render_redacted(&config)?);
            }
            ConfigAction::Check => {
                let config = load_config(self.config.as_deref())?;
                config.validate()?;
                print_success("Configuration is valid");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_redacted_hides_token() {
        let mut config = SyncConfig::default();
        config.remote.token = Some("secret_value".to_string());
        let rendered = render_redacted(&config).unwrap();
        assert!(!rendered.contains("secret_value"));
        assert!(rendered.contains("********"));
        assert!(rendered.contains("[properties]"));
    }
}
