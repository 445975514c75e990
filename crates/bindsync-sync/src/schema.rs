//! Schema check: which mapped labels exist on the remote database

use bindsync_config::PropertyMap;
use serde::Serialize;

use crate::remote::DatabaseSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyStatus {
    pub field: &'static str,
    pub label: String,
    /// Remote column type, `None` when the label is absent
    pub remote_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub database_title: String,
    pub properties: Vec<PropertyStatus>,
}

/// Fields a sync cannot run without
const REQUIRED_FIELDS: &[&str] = &["name", "action"];

impl SchemaReport {
    pub fn missing(&self) -> impl Iterator<Item = &PropertyStatus> {
        self.properties.iter().filter(|p| p.remote_type.is_none())
    }

    /// Labels of required fields absent remotely
    pub fn missing_required(&self) -> Vec<String> {
        self.missing()
            .filter(|p| REQUIRED_FIELDS.contains(&p.field))
            .map(|p| p.label.clone())
            .collect()
    }

    pub fn is_usable(&self) -> bool {
        self.missing_required().is_empty()
    }
}

pub fn check_schema(schema: &DatabaseSchema, labels: &PropertyMap) -> SchemaReport {
    SchemaReport {
        database_title: schema.title.clone(),
        properties: labels
            .entries()
            .into_iter()
            .map(|(field, label)| PropertyStatus {
                field,
                label: label.to_string(),
                remote_type: schema.properties.get(label).cloned(),
            })
            .collect(),
    }
}
