//! Property payloads
//!
//! Encoding writes each logical field under its configured label with the
//! column type the remote schema uses. Decoding is type-agnostic: any
//! supported property shape is flattened to text.

use bindsync_config::{PropertyMap, SyncSettings};
use bindsync_keybinds::Row;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

/// Longest text a single rich-text run may carry
const MAX_TEXT_LEN: usize = 2000;

fn truncated(text: &str) -> String {
    text.chars().take(MAX_TEXT_LEN).collect()
}

pub fn title(text: &str) -> Value {
    json!({ "title": [{ "type": "text", "text": { "content": truncated(text) } }] })
}

pub fn rich_text(text: &str) -> Value {
    if text.is_empty() {
        return json!({ "rich_text": [] });
    }
    json!({ "rich_text": [{ "type": "text", "text": { "content": truncated(text) } }] })
}

pub fn select(name: &str) -> Value {
    if name.is_empty() {
        return json!({ "select": null });
    }
    json!({ "select": { "name": name } })
}

pub fn multi_select<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    let options: Vec<Value> = names.into_iter().map(|n| json!({ "name": n })).collect();
    json!({ "multi_select": options })
}

pub fn date(at: DateTime<Utc>) -> Value {
    json!({ "date": { "start": at.to_rfc3339_opts(SecondsFormat::Secs, true) } })
}

pub fn relation<'a>(page_ids: impl IntoIterator<Item = &'a str>) -> Value {
    let ids: Vec<Value> = page_ids.into_iter().map(|id| json!({ "id": id })).collect();
    json!({ "relation": ids })
}

/// Builds property objects for rows, keyed by the configured labels
pub struct PayloadBuilder<'a> {
    labels: &'a PropertyMap,
    settings: &'a SyncSettings,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(labels: &'a PropertyMap, settings: &'a SyncSettings) -> Self {
        Self { labels, settings }
    }

    /// Fields derived from the row itself; written on every mutation
    pub fn row_fields(&self, row: &Row) -> Map<String, Value> {
        let l = self.labels;
        let mut props = Map::new();
        props.insert(l.name.clone(), title(&row.display_name));
        props.insert(l.action.clone(), rich_text(&row.lhs_normalized));
        props.insert(l.binding_type.clone(), select(&row.binding_type.to_string()));
        props.insert(l.category.clone(), select(&row.category.to_string()));
        props.insert(l.scope.clone(), select(&row.scope.to_string()));
        props.insert(l.prefix.clone(), rich_text(&row.prefix));
        props.insert(l.mode.clone(), multi_select(row.mode_labels()));
        props.insert(l.command.clone(), rich_text(&row.command_text));
        props.insert(
            l.description.clone(),
            rich_text(row.description.as_deref().unwrap_or("")),
        );
        props.insert(l.uid.clone(), rich_text(&row.identity_key));
        props
    }

    /// Row fields plus the configured static values and a date stamp
    pub fn for_create(&self, row: &Row, now: DateTime<Utc>) -> Value {
        let l = self.labels;
        let s = self.settings;
        let mut props = self.row_fields(row);

        if let Some(status) = &s.status_new {
            props.insert(l.status.clone(), select(status));
        }
        if let Some(tier) = &s.tier {
            props.insert(l.tier.clone(), select(tier));
        }
        if let Some(platform) = &s.platform {
            props.insert(l.platform.clone(), select(platform));
        }
        if let Some(app) = &s.application_page_id {
            props.insert(l.application.clone(), relation([app.as_str()]));
        }
        if let Some(page) = row
            .plugin
            .as_ref()
            .and_then(|slug| s.plugin_pages.get(slug))
        {
            props.insert(l.plugin.clone(), relation([page.as_str()]));
        }
        props.insert(l.date.clone(), date(now));
        Value::Object(props)
    }

    pub fn for_update(&self, row: &Row) -> Value {
        Value::Object(self.row_fields(row))
    }

    /// Update that also flags the row as changed for a human reviewer
    pub fn for_rebind(&self, row: &Row, now: DateTime<Utc>) -> Value {
        let mut props = self.row_fields(row);
        props.insert(
            self.labels.status.clone(),
            select(&self.settings.status_changed),
        );
        props.insert(self.labels.date.clone(), date(now));
        Value::Object(props)
    }

    /// Only the identity column
    pub fn identity_only(&self, identity_key: &str) -> Value {
        let mut props = Map::new();
        props.insert(self.labels.uid.clone(), rich_text(identity_key));
        Value::Object(props)
    }
}

fn join_text(parts: Option<&Value>) -> Option<String> {
    let parts = parts?.as_array()?;
    Some(
        parts
            .iter()
            .filter_map(|p| {
                p.get("plain_text")
                    .and_then(Value::as_str)
                    .or_else(|| p.pointer("/text/content").and_then(Value::as_str))
            })
            .collect(),
    )
}

fn option_name(value: Option<&Value>) -> Option<String> {
    value?.get("name")?.as_str().map(str::to_string)
}

/// Flatten a property of any supported type to text
pub fn property_text(property: &Value) -> Option<String> {
    let kind = property.get("type").and_then(Value::as_str).or_else(|| {
        // Payloads we built ourselves carry no "type" tag
        property
            .as_object()
            .and_then(|o| o.keys().find(|k| k.as_str() != "id"))
            .map(String::as_str)
    })?;
    let inner = property.get(kind);

    match kind {
        "title" | "rich_text" => join_text(inner),
        "select" | "status" => option_name(inner),
        "multi_select" => inner.and_then(Value::as_array).map(|opts| {
            opts.iter()
                .filter_map(|o| o.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        }),
        "url" | "email" | "phone_number" => inner.and_then(Value::as_str).map(str::to_string),
        "date" => inner
            .and_then(|d| d.get("start"))
            .and_then(Value::as_str)
            .map(str::to_string),
        "number" => inner.filter(|n| n.is_number()).map(Value::to_string),
        "checkbox" => inner.and_then(Value::as_bool).map(|b| b.to_string()),
        "formula" => inner.and_then(|f| {
            let result_kind = f.get("type").and_then(Value::as_str)?;
            match result_kind {
                "string" => f.get("string").and_then(Value::as_str).map(str::to_string),
                "number" => f.get("number").filter(|n| n.is_number()).map(Value::to_string),
                "boolean" => f.get("boolean").and_then(Value::as_bool).map(|b| b.to_string()),
                "date" => f.pointer("/date/start").and_then(Value::as_str).map(str::to_string),
                _ => None,
            }
        }),
        _ => None,
    }
}

/// Multi-select names, or comma-separated text for other types
pub fn property_list(property: &Value) -> Vec<String> {
    if let Some(options) = property.get("multi_select").and_then(Value::as_array) {
        return options
            .iter()
            .filter_map(|o| o.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
    }
    property_text(property)
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read a labelled property as trimmed, non-empty text
pub fn read_text(properties: &Map<String, Value>, label: &str) -> Option<String> {
    properties
        .get(label)
        .and_then(property_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindsync_keybinds::{RawRecord, RowBuilder};
    use chrono::TimeZone;

    fn row() -> Row {
        let records = vec![
            RawRecord::new("n", " pf").with_description("Find Files"),
            RawRecord::new("v", " pf").with_description("Find Files"),
        ];
        RowBuilder::with_defaults().build(&records).remove(0)
    }

    #[test]
    fn test_decode_wire_shapes() {
        let title = json!({ "type": "title", "title": [
            { "plain_text": "Find " }, { "plain_text": "Files" }
        ]});
        assert_eq!(property_text(&title).as_deref(), Some("Find Files"));

        let select = json!({ "type": "select", "select": { "name": "leader" } });
        assert_eq!(property_text(&select).as_deref(), Some("leader"));

        let empty = json!({ "type": "select", "select": null });
        assert_eq!(property_text(&empty), None);

        let modes = json!({ "type": "multi_select", "multi_select": [
            { "name": "Normal" }, { "name": "Visual" }
        ]});
        assert_eq!(property_list(&modes), vec!["Normal", "Visual"]);

        let formula = json!({ "type": "formula", "formula": { "type": "number", "number": 3 } });
        assert_eq!(property_text(&formula).as_deref(), Some("3"));

        let status = json!({ "type": "status", "status": { "name": "Changed" } });
        assert_eq!(property_text(&status).as_deref(), Some("Changed"));
    }

    #[test]
    fn test_decode_own_payloads() {
        assert_eq!(property_text(&rich_text("abc")).as_deref(), Some("abc"));
        assert_eq!(property_text(&title("T")).as_deref(), Some("T"));
        assert_eq!(property_list(&multi_select(["Normal", "Insert"])), vec!["Normal", "Insert"]);
    }

    #[test]
    fn test_update_payload_uses_labels() {
        let mut labels = PropertyMap::default();
        labels.action = "Keys".to_string();
        let settings = SyncSettings::default();
        let payload = PayloadBuilder::new(&labels, &settings).for_update(&row());

        let props = payload.as_object().unwrap();
        assert!(props.contains_key("Keys"));
        assert!(!props.contains_key("Action"));
        assert!(!props.contains_key("Status"));
        assert_eq!(read_text(props, "Keys").as_deref(), Some("<leader>pf"));
        assert_eq!(read_text(props, "UID").as_deref(), Some("v|<leader>pf|Global"));
        assert_eq!(property_list(&props["Mode"]), vec!["Normal", "Visual"]);
    }

    #[test]
    fn test_create_payload_static_values() {
        let labels = PropertyMap::default();
        let mut settings = SyncSettings::default();
        settings.status_new = Some("New".to_string());
        settings.tier = Some("Core".to_string());
        settings.application_page_id = Some("app-page".to_string());
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let payload = PayloadBuilder::new(&labels, &settings).for_create(&row(), now);
        let props = payload.as_object().unwrap();
        assert_eq!(read_text(props, "Status").as_deref(), Some("New"));
        assert_eq!(read_text(props, "Tier").as_deref(), Some("Core"));
        assert_eq!(read_text(props, "Date").as_deref(), Some("2024-05-01T12:00:00Z"));
        assert_eq!(props["Application"]["relation"][0]["id"], "app-page");
        assert!(!props.contains_key("Platform"));
        assert!(!props.contains_key("Plugin"));
    }

    #[test]
    fn test_rebind_marks_changed() {
        let labels = PropertyMap::default();
        let settings = SyncSettings::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let payload = PayloadBuilder::new(&labels, &settings).for_rebind(&row(), now);
        let props = payload.as_object().unwrap();
        assert_eq!(read_text(props, "Status").as_deref(), Some("Changed"));
        assert!(props.contains_key("Date"));
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "x".repeat(MAX_TEXT_LEN + 10);
        let value = rich_text(&long);
        assert_eq!(property_text(&value).unwrap().len(), MAX_TEXT_LEN);
    }
}
