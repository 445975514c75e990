//! Core configuration types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// trace, debug, info, warn or error
    pub log_level: Option<String>,
    /// Remote store identifiers and credentials
    pub remote: RemoteConfig,
    /// HTTP tuning
    pub http: HttpSettings,
    /// Logical field -> remote column label
    pub properties: PropertyMap,
    /// Reconciliation guardrails and static values
    pub sync: SyncSettings,
    /// Key normalization and classification hints
    pub keys: KeySettings,
}

impl SyncConfig {
    /// Check everything the core needs before touching the network
    pub fn validate(&self) -> Result<()> {
        match self.remote.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => {}
            _ => return Err(ConfigError::Missing("remote.token".to_string())),
        }
        match self.remote.database_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {}
            _ => return Err(ConfigError::Missing("remote.database_id".to_string())),
        }
        if self.remote.api_base.trim().is_empty() {
            return Err(ConfigError::Missing("remote.api_base".to_string()));
        }
        if self.http.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "http.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.sync.builtin_sentinel.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sync.builtin_sentinel must not be empty".to_string(),
            ));
        }
        self.properties.validate()
    }

    /// Token, assuming `validate` passed
    pub fn token(&self) -> &str {
        self.remote.token.as_deref().unwrap_or("")
    }

    /// Database id, assuming `validate` passed
    pub fn database_id(&self) -> &str {
        self.remote.database_id.as_deref().unwrap_or("")
    }
}

/// Remote store identifiers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Bearer token; `BINDSYNC_TOKEN` overrides it
    pub token: Option<String>,
    /// Target database
    pub database_id: Option<String>,
    pub api_base: String,
    /// Value of the protocol version header
    pub api_version: String,
    /// Rows per query page
    pub page_size: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            database_id: None,
            api_base: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
            page_size: 100,
        }
    }
}

/// HTTP tuning in plain integers so TOML and env vars stay readable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_ms: u64,
    /// Total attempts per request
    pub max_attempts: u32,
    /// The n-th retry waits `retry_base_delay_ms * n`
    pub retry_base_delay_ms: u64,
    /// Sleep after every request
    pub pacing_ms: u64,
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 4,
            retry_base_delay_ms: 800,
            pacing_ms: 350,
            proxy: None,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Remote column labels; the core never hard-codes them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropertyMap {
    pub name: String,
    /// Column holding the normalized key sequence
    pub action: String,
    pub status: String,
    #[serde(rename = "type")]
    pub binding_type: String,
    pub category: String,
    pub scope: String,
    pub prefix: String,
    pub mode: String,
    pub command: String,
    pub description: String,
    pub docs: String,
    pub uid: String,
    pub tier: String,
    pub date: String,
    pub platform: String,
    pub application: String,
    pub plugin: String,
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            action: "Action".to_string(),
            status: "Status".to_string(),
            binding_type: "Type".to_string(),
            category: "Category".to_string(),
            scope: "Scope".to_string(),
            prefix: "Prefix".to_string(),
            mode: "Mode".to_string(),
            command: "Command".to_string(),
            description: "Description".to_string(),
            docs: "Docs".to_string(),
            uid: "UID".to_string(),
            tier: "Tier".to_string(),
            date: "Date".to_string(),
            platform: "Platform".to_string(),
            application: "Application".to_string(),
            plugin: "Plugin".to_string(),
        }
    }
}

impl PropertyMap {
    /// (logical field, remote label) pairs
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", self.name.as_str()),
            ("action", self.action.as_str()),
            ("status", self.status.as_str()),
            ("type", self.binding_type.as_str()),
            ("category", self.category.as_str()),
            ("scope", self.scope.as_str()),
            ("prefix", self.prefix.as_str()),
            ("mode", self.mode.as_str()),
            ("command", self.command.as_str()),
            ("description", self.description.as_str()),
            ("docs", self.docs.as_str()),
            ("uid", self.uid.as_str()),
            ("tier", self.tier.as_str()),
            ("date", self.date.as_str()),
            ("platform", self.platform.as_str()),
            ("application", self.application.as_str()),
            ("plugin", self.plugin.as_str()),
        ]
    }

    /// Labels must be non-empty and distinct
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (field, label) in self.entries() {
            if label.trim().is_empty() {
                return Err(ConfigError::Missing(format!("properties.{}", field)));
            }
            if !seen.insert(label) {
                return Err(ConfigError::Validation(format!(
                    "property label '{}' is mapped more than once",
                    label
                )));
            }
        }
        Ok(())
    }
}

/// Reconciliation guardrails and static values written on create
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Command text marking editor builtins
    pub builtin_sentinel: String,
    /// When false, unmatched rows become `skip_no_match` instead of `create`
    pub allow_create: bool,
    /// Delay after every executor network call
    pub op_delay_ms: u64,
    /// Status written on rebind
    pub status_changed: String,
    /// Status written on create, if any
    pub status_new: Option<String>,
    pub tier: Option<String>,
    pub platform: Option<String>,
    /// Page id for the Application relation
    pub application_page_id: Option<String>,
    /// Plugin slug -> page id for the Plugin relation
    pub plugin_pages: BTreeMap<String, String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            builtin_sentinel: "Built in".to_string(),
            allow_create: true,
            op_delay_ms: 0,
            status_changed: "Changed".to_string(),
            status_new: None,
            tier: None,
            platform: None,
            application_page_id: None,
            plugin_pages: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    pub fn op_delay(&self) -> Duration {
        Duration::from_millis(self.op_delay_ms)
    }
}

/// Key normalization and classification hints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeySettings {
    pub leader: String,
    pub localleader: String,
    /// Substring -> plugin slug
    pub plugin_aliases: BTreeMap<String, String>,
    /// Plugin slugs whose bindings are project-scoped
    pub project_scoped_plugins: Vec<String>,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            leader: " ".to_string(),
            localleader: "\\".to_string(),
            plugin_aliases: BTreeMap::new(),
            project_scoped_plugins: Vec::new(),
        }
    }
}

/// Configuration manager trait
pub trait ConfigManager {
    /// Load configuration
    fn load_config(&mut self) -> Result<SyncConfig>;
    /// Save configuration
    fn save_config(&self, config: &SyncConfig) -> Result<()>;
    /// Validate configuration
    fn validate_config(&self, config: &SyncConfig) -> Result<()> {
        config.validate()
    }
}
