//! In-memory remote store for executor and engine tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bindsync_config::SyncConfig;
use bindsync_sync::properties::read_text;
use bindsync_sync::{DatabaseSchema, ListResult, RemoteError, RemotePage, RemoteStore, RemoteUser};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct MemoryStore {
    pub pages: Mutex<Vec<RemotePage>>,
    /// "create <name>" / "update <id>" in call order
    pub calls: Mutex<Vec<String>>,
    fail_names: Mutex<HashSet<String>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    mutations: AtomicUsize,
    next_id: AtomicUsize,
    partial_listing: AtomicBool,
    reject_token: AtomicBool,
    hidden_labels: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every mutation of the row with this display name
    pub fn fail_on(&self, name: &str) {
        self.fail_names.lock().unwrap().insert(name.to_string());
    }

    /// Cancel `token` once `count` mutations have completed
    pub fn cancel_after(&self, count: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((count, token));
    }

    /// Listing returns what it has plus an error
    pub fn break_listing(&self) {
        self.partial_listing.store(true, Ordering::SeqCst);
    }

    pub fn reject_token(&self) {
        self.reject_token.store(true, Ordering::SeqCst);
    }

    /// Leave `label` out of the described schema
    pub fn hide_label(&self, label: &str) {
        self.hidden_labels.lock().unwrap().insert(label.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page(&self, id: &str) -> Option<RemotePage> {
        self.pages.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    fn after_mutation(&self) {
        let done = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((count, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if done >= *count {
                token.cancel();
            }
        }
    }

    fn fails(&self, properties: &Value) -> bool {
        let name = properties
            .as_object()
            .and_then(|p| read_text(p, "Name"))
            .unwrap_or_default();
        self.fail_names.lock().unwrap().contains(&name)
    }

    fn stamp(&self) -> String {
        let tick = self.mutations.load(Ordering::SeqCst);
        format!("2024-01-01T00:00:{:02}Z", tick % 60)
    }
}

pub fn config() -> SyncConfig {
    let mut config = SyncConfig::default();
    config.remote.token = Some("secret".to_string());
    config.remote.database_id = Some("db".to_string());
    config
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn whoami(&self) -> Result<RemoteUser, RemoteError> {
        if self.reject_token.load(Ordering::SeqCst) {
            return Err(RemoteError::Auth(401));
        }
        Ok(RemoteUser {
            id: "user".to_string(),
            name: Some("Test".to_string()),
            kind: Some("bot".to_string()),
        })
    }

    async fn describe(&self, database_id: &str) -> Result<DatabaseSchema, RemoteError> {
        let labels = bindsync_config::PropertyMap::default();
        let hidden = self.hidden_labels.lock().unwrap().clone();
        Ok(DatabaseSchema {
            id: database_id.to_string(),
            title: "Keymaps".to_string(),
            properties: labels
                .entries()
                .into_iter()
                .filter(|(_, label)| !hidden.contains(*label))
                .map(|(_, label)| (label.to_string(), "rich_text".to_string()))
                .collect(),
        })
    }

    async fn list_all(&self, _database_id: &str) -> ListResult {
        let mut rows = self.pages.lock().unwrap().clone();
        if self.partial_listing.load(Ordering::SeqCst) {
            rows.truncate(1);
            return ListResult {
                rows,
                error: Some(RemoteError::Malformed("cursor expired".to_string())),
            };
        }
        ListResult { rows, error: None }
    }

    async fn create(&self, _database_id: &str, properties: Value) -> Result<String, RemoteError> {
        let name = properties
            .as_object()
            .and_then(|p| read_text(p, "Name"))
            .unwrap_or_default();
        self.calls.lock().unwrap().push(format!("create {}", name));

        let result = if self.fails(&properties) {
            Err(RemoteError::Malformed(format!("rejected {}", name)))
        } else {
            let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let page = RemotePage {
                id: id.clone(),
                properties: properties.as_object().cloned().unwrap_or_default(),
                last_edited_time: Some(self.stamp()),
            };
            self.pages.lock().unwrap().push(page);
            Ok(id)
        };
        self.after_mutation();
        result
    }

    async fn update(&self, page_id: &str, properties: Value) -> Result<String, RemoteError> {
        self.calls.lock().unwrap().push(format!("update {}", page_id));

        let result = if self.fails(&properties) {
            Err(RemoteError::Malformed(format!("rejected {}", page_id)))
        } else {
            let stamp = self.stamp();
            let mut pages = self.pages.lock().unwrap();
            match pages.iter_mut().find(|p| p.id == page_id) {
                Some(page) => {
                    if let Some(props) = properties.as_object() {
                        for (k, v) in props {
                            page.properties.insert(k.clone(), v.clone());
                        }
                    }
                    page.last_edited_time = Some(stamp);
                    Ok(page_id.to_string())
                }
                None => Err(RemoteError::Malformed(format!("no page {}", page_id))),
            }
        };
        self.after_mutation();
        result
    }
}
