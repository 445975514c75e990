//! Per-run context: resolved configuration plus the abort token

use std::collections::HashSet;
use std::sync::Arc;

use bindsync_config::SyncConfig;
use bindsync_keybinds::{KeyNormalizer, RowBuilder, RowBuilderOptions, RuleClassifier};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SyncError};

/// Everything one reconciliation run reads, passed explicitly into each stage
#[derive(Debug, Clone)]
pub struct SyncContext {
    config: Arc<SyncConfig>,
    cancel: CancellationToken,
}

impl SyncContext {
    /// Validate the configuration and open a fresh run
    pub fn new(config: SyncConfig) -> Result<Self> {
        if config.remote.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(SyncError::Auth("no API token configured".to_string()));
        }
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    /// Skip validation; used where the caller already validated
    pub fn unchecked(config: SyncConfig) -> Self {
        Self {
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Token shared with whoever may request an abort (signal handler, UI)
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Row builder wired to the key and classification settings
    pub fn row_builder(&self) -> RowBuilder {
        let keys = &self.config.keys;
        let classifier = RuleClassifier::new().with_aliases(keys.plugin_aliases.clone());
        let options = RowBuilderOptions {
            builtin_sentinel: self.config.sync.builtin_sentinel.clone(),
            project_scoped_plugins: keys
                .project_scoped_plugins
                .iter()
                .cloned()
                .collect::<HashSet<_>>(),
        };
        RowBuilder::new(
            KeyNormalizer::new(&keys.leader, &keys.localleader),
            Arc::new(classifier),
            options,
        )
    }
}
