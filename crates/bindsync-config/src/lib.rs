//! bindsync configuration
//!
//! Loads the fully resolved configuration the sync core runs with: remote
//! identifiers and credentials, HTTP tuning, the logical-to-remote property
//! name map, sync guardrails and key/classification hints. Sources are
//! layered (defaults, TOML file, environment) and validated before any
//! network call is made.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{
    ConfigManager as ConfigManagerTrait, HttpSettings, KeySettings, PropertyMap, RemoteConfig,
    SyncConfig, SyncSettings,
};
