//! Planner: classify each row against the remote index
//!
//! Pure and synchronous. Plan order equals row order and the result depends
//! only on the rows, the index and the options.

use std::fmt;

use bindsync_config::SyncSettings;
use bindsync_keybinds::Row;
use serde::Serialize;

use crate::index::{IdentityIndex, IdentityRecord};

/// What the executor should do with one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Rebind,
    SkipSame,
    SkipBuiltin,
    SkipNoMatch,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Rebind => "rebind",
            Operation::SkipSame => "skip_same",
            Operation::SkipBuiltin => "skip_builtin",
            Operation::SkipNoMatch => "skip_no_match",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Operation::SkipSame | Operation::SkipBuiltin | Operation::SkipNoMatch
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which index produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedVia {
    Identity,
    Binding,
    Name,
    Command,
}

impl fmt::Display for MatchedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchedVia::Identity => "identity",
            MatchedVia::Binding => "binding",
            MatchedVia::Name => "name",
            MatchedVia::Command => "command",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub operation: Operation,
    pub row: Row,
    pub matched_remote_id: Option<String>,
    pub matched_via: Option<MatchedVia>,
}

/// Count per operation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub create: usize,
    pub update: usize,
    pub rebind: usize,
    pub skip_same: usize,
    pub skip_builtin: usize,
    pub skip_no_match: usize,
}

impl PlanStats {
    pub fn record(&mut self, operation: Operation) {
        match operation {
            Operation::Create => self.create += 1,
            Operation::Update => self.update += 1,
            Operation::Rebind => self.rebind += 1,
            Operation::SkipSame => self.skip_same += 1,
            Operation::SkipBuiltin => self.skip_builtin += 1,
            Operation::SkipNoMatch => self.skip_no_match += 1,
        }
    }

    /// Items that would touch the remote
    pub fn mutations(&self) -> usize {
        self.create + self.update + self.rebind
    }

    pub fn skipped(&self) -> usize {
        self.skip_same + self.skip_builtin + self.skip_no_match
    }

    pub fn total(&self) -> usize {
        self.mutations() + self.skipped()
    }
}

impl fmt::Display for PlanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "create={} update={} rebind={} skip_same={} skip_builtin={} skip_no_match={}",
            self.create,
            self.update,
            self.rebind,
            self.skip_same,
            self.skip_builtin,
            self.skip_no_match
        )
    }
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub builtin_sentinel: String,
    /// When false, unmatched rows become `skip_no_match`
    pub allow_create: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self::from(&SyncSettings::default())
    }
}

impl From<&SyncSettings> for PlanOptions {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            builtin_sentinel: settings.builtin_sentinel.clone(),
            allow_create: settings.allow_create,
        }
    }
}

/// Classify every row; see [`classify`] for the per-row rules
pub fn compute_plan(
    rows: &[Row],
    index: &IdentityIndex,
    options: &PlanOptions,
) -> (Vec<PlanItem>, PlanStats) {
    let mut stats = PlanStats::default();
    let plan = rows
        .iter()
        .map(|row| {
            let item = classify(row, index, options);
            stats.record(item.operation);
            item
        })
        .collect();
    (plan, stats)
}

/// Match order: identity key, fingerprint in the identity keyspace, display
/// name, then command key (rebind). Builtin rows never reach matching.
pub fn classify(row: &Row, index: &IdentityIndex, options: &PlanOptions) -> PlanItem {
    if row.is_builtin(&options.builtin_sentinel) {
        return item(Operation::SkipBuiltin, row, None);
    }

    let direct = index
        .by_identity(&row.identity_key)
        .map(|r| (r, MatchedVia::Identity))
        .or_else(|| {
            index
                .by_identity(&row.binding_fingerprint)
                .map(|r| (r, MatchedVia::Binding))
        })
        .or_else(|| index.by_name(&row.display_name).map(|r| (r, MatchedVia::Name)));

    if let Some((record, via)) = direct {
        let operation = if record.is_builtin {
            Operation::SkipBuiltin
        } else if differs(row, record) {
            Operation::Update
        } else {
            Operation::SkipSame
        };
        return item(operation, row, Some((record, via)));
    }

    let command = row.command_key();
    if let Some(record) = index
        .by_command(&command)
        .filter(|r| !command.is_empty() && !r.is_builtin)
    {
        let operation = if differs(row, record) {
            Operation::Rebind
        } else {
            Operation::SkipSame
        };
        return item(operation, row, Some((record, MatchedVia::Command)));
    }

    let operation = if options.allow_create {
        Operation::Create
    } else {
        Operation::SkipNoMatch
    };
    item(operation, row, None)
}

fn differs(row: &Row, record: &IdentityRecord) -> bool {
    record.comparison_key() != Some(row.binding_fingerprint.as_str())
}

fn item(operation: Operation, row: &Row, matched: Option<(&IdentityRecord, MatchedVia)>) -> PlanItem {
    PlanItem {
        operation,
        row: row.clone(),
        matched_remote_id: matched.map(|(r, _)| r.remote_id.clone()),
        matched_via: matched.map(|(_, via)| via),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindsync_keybinds::{RawRecord, RowBuilder};

    fn record(id: &str, identity: Option<&str>, fingerprint: Option<&str>, command: &str) -> IdentityRecord {
        IdentityRecord {
            remote_id: id.to_string(),
            display_name: format!("remote {}", id),
            command_text: command.to_string(),
            command_key: bindsync_keybinds::command_key(command),
            identity_key_stored: identity.map(str::to_string),
            identity_key_synthetic: None,
            binding_fingerprint: fingerprint.map(str::to_string),
            is_builtin: bindsync_keybinds::is_builtin_command(command, "Built in"),
            last_modified: None,
        }
    }

    fn rows(records: &[RawRecord]) -> Vec<Row> {
        RowBuilder::with_defaults().build(records)
    }

    fn find_files() -> Row {
        rows(&[RawRecord::new("n", " pf")
            .with_description("Find Files")
            .with_origin("/home/u/.local/share/nvim/lazy/telescope.nvim/lua/x.lua")])
        .remove(0)
    }

    #[test]
    fn test_builtin_row_is_skipped() {
        let builtin = rows(&[RawRecord::new("n", "gx")]).remove(0);
        assert_eq!(builtin.command_text, "Built in");

        let index = IdentityIndex::default();
        let item = classify(&builtin, &index, &PlanOptions::default());
        assert_eq!(item.operation, Operation::SkipBuiltin);
    }

    #[test]
    fn test_identity_match_same_fingerprint() {
        let row = find_files();
        let index = IdentityIndex::from_records(vec![record(
            "p1",
            Some(row.identity_key.as_str()),
            Some(row.binding_fingerprint.as_str()),
            &row.command_text,
        )]);
        let item = classify(&row, &index, &PlanOptions::default());
        assert_eq!(item.operation, Operation::SkipSame);
        assert_eq!(item.matched_via, Some(MatchedVia::Identity));
        assert_eq!(item.matched_remote_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_type_change_is_update() {
        let row = find_files();
        assert_eq!(row.identity_key, "n|<leader>pf|Global");
        let mut stale = row.clone();
        stale.binding_fingerprint = "chord||<leader>pf".to_string();

        let index = IdentityIndex::from_records(vec![record(
            "p1",
            Some("n|<leader>pf|Global"),
            Some("leader||<leader>pf"),
            "Plugin: telescope",
        )]);
        assert_eq!(classify(&row, &index, &PlanOptions::default()).operation, Operation::SkipSame);
        assert_eq!(classify(&stale, &index, &PlanOptions::default()).operation, Operation::Update);
    }

    #[test]
    fn test_matched_builtin_record_is_skipped() {
        let row = find_files();
        let index = IdentityIndex::from_records(vec![record(
            "p1",
            Some(row.identity_key.as_str()),
            Some("other"),
            "built in",
        )]);
        let item = classify(&row, &index, &PlanOptions::default());
        assert_eq!(item.operation, Operation::SkipBuiltin);
    }

    #[test]
    fn test_fingerprint_recovers_drifted_identity() {
        let row = find_files();
        let index = IdentityIndex::from_records(vec![record(
            "p1",
            Some("v|<leader>pf|Global"),
            Some(row.binding_fingerprint.as_str()),
            "Plugin: telescope",
        )]);
        let item = classify(&row, &index, &PlanOptions::default());
        assert_eq!(item.matched_via, Some(MatchedVia::Binding));
        assert_eq!(item.operation, Operation::SkipSame);
    }

    #[test]
    fn test_name_match() {
        let row = find_files();
        let mut remote = record("p1", Some("x|y|Global"), Some("key||y"), "something");
        remote.display_name = row.display_name.clone();
        let index = IdentityIndex::from_records(vec![remote]);
        let item = classify(&row, &index, &PlanOptions::default());
        assert_eq!(item.matched_via, Some(MatchedVia::Name));
        assert_eq!(item.operation, Operation::Update);
    }

    #[test]
    fn test_command_match_is_rebind() {
        let row = find_files();
        let index = IdentityIndex::from_records(vec![record(
            "p9",
            Some("n|<leader>ff|Global"),
            Some("leader||<leader>ff"),
            "plugin:  Telescope.nvim",
        )]);
        let item = classify(&row, &index, &PlanOptions::default());
        assert_eq!(item.operation, Operation::Rebind);
        assert_eq!(item.matched_via, Some(MatchedVia::Command));
        assert_eq!(item.matched_remote_id.as_deref(), Some("p9"));
    }

    #[test]
    fn test_unmatched_create_guardrail() {
        let row = find_files();
        let index = IdentityIndex::default();
        assert_eq!(classify(&row, &index, &PlanOptions::default()).operation, Operation::Create);

        let options = PlanOptions {
            allow_create: false,
            ..Default::default()
        };
        assert_eq!(classify(&row, &index, &options).operation, Operation::SkipNoMatch);
    }

    #[test]
    fn test_stats() {
        let all = rows(&[
            RawRecord::new("n", "gx"),
            RawRecord::new("n", " pf").with_description("Find Files"),
            RawRecord::new("i", "<C-s>").with_description("Save"),
        ]);
        let (plan, stats) = compute_plan(&all, &IdentityIndex::default(), &PlanOptions::default());
        assert_eq!(plan.len(), 3);
        assert_eq!(stats.skip_builtin, 1);
        assert_eq!(stats.create, 2);
        assert_eq!(stats.mutations(), 2);
        assert_eq!(stats.total(), 3);
        assert_eq!(plan[1].operation, Operation::Create);
    }
}
