// Command handlers for the bindsync CLI

pub mod backfill;
pub mod config;
pub mod describe;
pub mod plan;
pub mod sync;
pub mod whoami;

pub use backfill::BackfillCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use describe::DescribeCommand;
pub use plan::PlanCommand;
pub use sync::SyncCommand;
pub use whoami::WhoamiCommand;

use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::sync::Arc;

use bindsync_config::{ConfigManager, ConfigManagerTrait, SyncConfig};
use bindsync_keybinds::{ParserRegistry, RawRecord};
use bindsync_sync::{RemoteClient, SyncContext, SyncEngine};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Load configuration from `path`, or the default location
pub fn load_config(path: Option<&Path>) -> CliResult<SyncConfig> {
    let mut manager = match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            ConfigManager::with_path(path.to_path_buf())
        }
        None => ConfigManager::new(),
    };
    debug!(path = %manager.config_path().display(), "Using configuration");
    Ok(manager.load_config()?)
}

/// Read collector output from a file, or stdin for `-`
pub fn read_records(input: &Path, format: Option<&str>) -> CliResult<Vec<RawRecord>> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|e| {
            CliError::Input(format!("{}: {}", input.display(), e))
        })?
    };

    let registry = ParserRegistry::new();
    let records = match format {
        Some(format) => registry.parse(&content, format)?,
        None => registry.parse_auto(&content)?,
    };
    debug!(count = records.len(), "Read records");
    Ok(records)
}

/// Validated context plus an engine over the HTTP client
pub fn open_engine(config: SyncConfig) -> CliResult<SyncEngine> {
    let ctx = SyncContext::new(config)?;
    let client = RemoteClient::from_config(ctx.config())?;
    Ok(SyncEngine::new(ctx, Arc::new(client)))
}

/// First Ctrl-C requests a cooperative abort; the in-flight call finishes
pub fn abort_on_ctrl_c(engine: &SyncEngine) {
    let token = engine.context().cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Abort requested; finishing the current request");
            token.cancel();
        }
    });
}

/// Ask a yes/no question on stdin; `assume_yes` skips the prompt
pub fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    if !atty::is(atty::Stream::Stdin) {
        warn!("No terminal to confirm on; pass --yes to apply");
        return false;
    }

    print!("{} [y/N] ", question);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
