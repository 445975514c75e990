//! Row builder: raw records to canonical rows
//!
//! Records are grouped by (scope flag, normalized lhs). The first record seen
//! for a group fixes every field except `modes`, which accumulates the union
//! of all modes in the group. Output keeps first-seen order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::{is_runtime_origin, plugin_tag, ClassificationResult, Classifier, RuleClassifier};
use crate::keys::KeyNormalizer;
use crate::models::{Mode, RawRecord, Row, Scope};

/// Builder knobs that come from configuration
#[derive(Debug, Clone)]
pub struct RowBuilderOptions {
    /// Command text written for builtin bindings
    pub builtin_sentinel: String,
    /// Plugin slugs whose bindings are project-scoped
    pub project_scoped_plugins: HashSet<String>,
}

impl Default for RowBuilderOptions {
    fn default() -> Self {
        RowBuilderOptions {
            builtin_sentinel: "Built in".to_string(),
            project_scoped_plugins: HashSet::new(),
        }
    }
}

/// Turns collector output into finalized rows
pub struct RowBuilder {
    normalizer: KeyNormalizer,
    classifier: Arc<dyn Classifier>,
    options: RowBuilderOptions,
}

impl RowBuilder {
    pub fn new(
        normalizer: KeyNormalizer,
        classifier: Arc<dyn Classifier>,
        options: RowBuilderOptions,
    ) -> Self {
        RowBuilder {
            normalizer,
            classifier,
            options,
        }
    }

    /// Default normalizer, rule classifier and options
    pub fn with_defaults() -> Self {
        Self::new(
            KeyNormalizer::default(),
            Arc::new(RuleClassifier::new()),
            RowBuilderOptions::default(),
        )
    }

    pub fn normalizer(&self) -> &KeyNormalizer {
        &self.normalizer
    }

    /// Build finalized rows; malformed records are skipped
    pub fn build(&self, records: &[RawRecord]) -> Vec<Row> {
        let mut rows: Vec<Row> = Vec::new();
        let mut positions: HashMap<(bool, String), usize> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let mode = match Mode::from_code(&record.mode) {
                Ok(mode) => mode,
                Err(e) => {
                    warn!("Skipping record {}: {}", idx + 1, e);
                    continue;
                }
            };
            if record.lhs.is_empty() {
                warn!("Skipping record {}: empty lhs", idx + 1);
                continue;
            }

            let lhs = self.normalizer.normalize(&record.lhs);
            let group = (record.scope_flag, lhs.clone());

            if let Some(&pos) = positions.get(&group) {
                rows[pos].add_mode(mode);
                continue;
            }

            let classification = self.classifier.classify(record, &lhs);
            positions.insert(group, rows.len());
            rows.push(self.new_row(record, lhs, mode, classification));
        }

        for row in &mut rows {
            row.finalize();
        }

        debug!("Built {} rows from {} records", rows.len(), records.len());
        rows
    }

    fn new_row(
        &self,
        record: &RawRecord,
        lhs: String,
        mode: Mode,
        classification: ClassificationResult,
    ) -> Row {
        let scope = match &classification.plugin {
            Some(slug) if self.options.project_scoped_plugins.contains(slug) => Scope::Project,
            _ if record.scope_flag => Scope::Buffer,
            _ => Scope::Global,
        };

        let description = record
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let mut display_name = description.clone().unwrap_or_else(|| lhs.clone());
        if let Some(slug) = &classification.plugin {
            display_name = format!("{} ({})", display_name, plugin_tag(slug));
        }

        let command_text = self.command_text(record, description.as_deref(), &classification);

        let mut row = Row::new(display_name, lhs, mode, scope, classification, command_text);
        row.scope_flag = record.scope_flag;
        row.description = description;
        row
    }

    fn command_text(
        &self,
        record: &RawRecord,
        description: Option<&str>,
        classification: &ClassificationResult,
    ) -> String {
        if is_runtime_origin(record.origin_path.as_deref().unwrap_or("")) {
            return self.options.builtin_sentinel.clone();
        }

        if let Some(slug) = &classification.plugin {
            return format!("Plugin: {}", slug);
        }

        if let Some(description) = description {
            return description.to_string();
        }

        match record.rhs.as_deref().map(str::trim) {
            Some(rhs) if !rhs.is_empty() && !is_callback_marker(rhs) => rhs.to_string(),
            _ => self.options.builtin_sentinel.clone(),
        }
    }
}

/// Placeholders collectors emit instead of a textual rhs
fn is_callback_marker(rhs: &str) -> bool {
    rhs.starts_with("<Lua") || rhs.starts_with("<function") || rhs.starts_with("<lua")
}
