//! Remote indexer
//!
//! Decodes remote rows into [`IdentityRecord`]s and builds the lookup
//! indices the planner matches against. On key collisions the record with
//! the later `last_modified` keeps the slot, except in `by_name`, where the
//! last record fetched always wins.

use std::collections::HashMap;

use bindsync_config::PropertyMap;
use bindsync_keybinds::{
    binding_fingerprint, command_key, identity_key, is_builtin_command, Mode, ModeClass, Scope,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::RemoteError;
use crate::properties::{property_list, read_text};
use crate::remote::{RemotePage, RemoteStore};

/// One remote row reduced to the fields reconciliation compares
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRecord {
    pub remote_id: String,
    pub display_name: String,
    pub command_text: String,
    pub command_key: String,
    /// Explicit identity column, if filled in
    pub identity_key_stored: Option<String>,
    /// Recomputed from the row's own Mode, Action and Scope columns
    pub identity_key_synthetic: Option<String>,
    pub binding_fingerprint: Option<String>,
    pub is_builtin: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

impl IdentityRecord {
    pub fn decode(page: &RemotePage, labels: &PropertyMap, builtin_sentinel: &str) -> Self {
        let props = &page.properties;
        let text = |label: &str| read_text(props, label);

        let command_text = text(&labels.command).unwrap_or_default();
        let action = text(&labels.action);

        let identity_key_synthetic = action.as_deref().and_then(|lhs| {
            let modes: Vec<Mode> = props
                .get(&labels.mode)
                .map(property_list)
                .unwrap_or_default()
                .iter()
                .filter_map(|label| label.parse::<Mode>().ok())
                .collect();
            let class = ModeClass::of(&modes)?;
            let scope = text(&labels.scope)
                .and_then(|s| s.parse::<Scope>().ok())
                .unwrap_or_default();
            Some(identity_key(class, lhs, scope))
        });

        let fingerprint = action.as_deref().map(|lhs| {
            binding_fingerprint(
                &text(&labels.binding_type).unwrap_or_default(),
                &text(&labels.prefix).unwrap_or_default(),
                lhs,
            )
        });

        IdentityRecord {
            remote_id: page.id.clone(),
            display_name: text(&labels.name).unwrap_or_default(),
            command_key: command_key(&command_text),
            is_builtin: is_builtin_command(&command_text, builtin_sentinel),
            command_text,
            identity_key_stored: text(&labels.uid),
            identity_key_synthetic,
            binding_fingerprint: fingerprint,
            last_modified: page
                .last_edited_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Stored identity if present, else the synthetic one
    pub fn identity_key(&self) -> Option<&str> {
        self.identity_key_stored
            .as_deref()
            .or(self.identity_key_synthetic.as_deref())
    }

    /// Value compared against a row's fingerprint
    pub fn comparison_key(&self) -> Option<&str> {
        self.binding_fingerprint
            .as_deref()
            .or_else(|| self.identity_key())
    }

    /// Unparseable timestamps order before any real one
    fn is_newer_than(&self, other: &IdentityRecord) -> bool {
        self.last_modified > other.last_modified
    }
}

/// Lookup structure over one full listing; read-only once built
#[derive(Debug, Default)]
pub struct IdentityIndex {
    records: Vec<IdentityRecord>,
    by_identity: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_command: HashMap<String, usize>,
}

impl IdentityIndex {
    pub fn from_records(records: Vec<IdentityRecord>) -> Self {
        let mut index = IdentityIndex {
            records: Vec::with_capacity(records.len()),
            ..Default::default()
        };
        for record in records {
            index.insert(record);
        }
        index
    }

    /// Decode and index raw pages
    pub fn from_pages(pages: &[RemotePage], labels: &PropertyMap, builtin_sentinel: &str) -> Self {
        Self::from_records(
            pages
                .iter()
                .map(|p| IdentityRecord::decode(p, labels, builtin_sentinel))
                .collect(),
        )
    }

    fn insert(&mut self, record: IdentityRecord) {
        let pos = self.records.len();

        if !record.display_name.is_empty() {
            self.by_name.insert(record.display_name.clone(), pos);
        }
        if let Some(key) = record.identity_key() {
            let key = key.to_string();
            Self::claim(&self.records, &mut self.by_identity, key, pos, &record);
        }
        if let Some(fingerprint) = record.binding_fingerprint.clone() {
            Self::claim(&self.records, &mut self.by_identity, fingerprint, pos, &record);
        }
        if !record.is_builtin && !record.command_key.is_empty() {
            let key = record.command_key.clone();
            Self::claim(&self.records, &mut self.by_command, key, pos, &record);
        }

        self.records.push(record);
    }

    fn claim(
        records: &[IdentityRecord],
        slots: &mut HashMap<String, usize>,
        key: String,
        pos: usize,
        record: &IdentityRecord,
    ) {
        match slots.get(&key) {
            Some(&held) if !record.is_newer_than(&records[held]) => {
                debug!(key = %key, kept = %records[held].remote_id, "Index collision");
            }
            _ => {
                slots.insert(key, pos);
            }
        }
    }

    pub fn by_identity(&self, key: &str) -> Option<&IdentityRecord> {
        self.by_identity.get(key).map(|&i| &self.records[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&IdentityRecord> {
        self.by_name.get(name).map(|&i| &self.records[i])
    }

    pub fn by_command(&self, command_key: &str) -> Option<&IdentityRecord> {
        self.by_command.get(command_key).map(|&i| &self.records[i])
    }

    /// Records in fetch order
    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Index plus fetch status; `ok == false` means the listing was partial
#[derive(Debug)]
pub struct IndexOutcome {
    pub index: IdentityIndex,
    pub ok: bool,
    pub error: Option<RemoteError>,
}

/// Fetch every remote row and index it; failures are reported, not raised
pub async fn build_index(
    store: &dyn RemoteStore,
    database_id: &str,
    labels: &PropertyMap,
    builtin_sentinel: &str,
) -> IndexOutcome {
    let listing = store.list_all(database_id).await;
    let index = IdentityIndex::from_pages(&listing.rows, labels, builtin_sentinel);

    match listing.error {
        None => {
            info!(rows = index.len(), "Remote index built");
            IndexOutcome {
                index,
                ok: true,
                error: None,
            }
        }
        Some(error) => {
            warn!(rows = index.len(), "Remote index is partial: {}", error);
            IndexOutcome {
                index,
                ok: false,
                error: Some(error),
            }
        }
    }
}
