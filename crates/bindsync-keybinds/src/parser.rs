//! Parsers for collector output

use crate::error::ParseError;
use crate::models::{Mode, RawRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for parsing collector dumps
pub trait RecordParser: Send + Sync {
    /// Parse raw records from content
    fn parse(&self, content: &str) -> Result<Vec<RawRecord>, ParseError>;
}

/// Registry for record parsers supporting multiple formats
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn RecordParser>>,
}

impl ParserRegistry {
    /// Create a new parser registry with default parsers
    pub fn new() -> Self {
        let mut parsers = HashMap::new();
        parsers.insert("json".to_string(), Arc::new(JsonRecordParser) as Arc<dyn RecordParser>);
        parsers.insert("jsonl".to_string(), Arc::new(JsonLinesRecordParser) as Arc<dyn RecordParser>);
        parsers.insert("ndjson".to_string(), Arc::new(JsonLinesRecordParser) as Arc<dyn RecordParser>);

        ParserRegistry { parsers }
    }

    /// Register a custom parser for a format
    pub fn register(&mut self, format: impl Into<String>, parser: Arc<dyn RecordParser>) {
        self.parsers.insert(format.into(), parser);
    }

    /// Get a parser for a specific format
    pub fn get_parser(&self, format: &str) -> Option<Arc<dyn RecordParser>> {
        self.parsers.get(format).cloned()
    }

    /// Auto-detect format and parse content
    pub fn parse_auto(&self, content: &str) -> Result<Vec<RawRecord>, ParseError> {
        let trimmed = content.trim_start();
        let format = if trimmed.starts_with('[') {
            "json"
        } else if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(content).is_ok() {
            "json"
        } else {
            "jsonl"
        };
        self.parse(content, format)
    }

    /// Parse content with explicit format
    pub fn parse(&self, content: &str, format: &str) -> Result<Vec<RawRecord>, ParseError> {
        let parser = self
            .get_parser(format)
            .ok_or_else(|| ParseError::UnknownFormat(format.to_string()))?;
        parser.parse(content)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A JSON array of records, or an object with a `records` array
pub struct JsonRecordParser;

impl RecordParser for JsonRecordParser {
    fn parse(&self, content: &str) -> Result<Vec<RawRecord>, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let items = match &value {
            serde_json::Value::Array(items) => items,
            other => other
                .get("records")
                .and_then(|v| v.as_array())
                .ok_or_else(|| ParseError::MissingField("records".to_string()))?,
        };

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let record: RawRecord =
                    serde_json::from_value(item.clone()).map_err(|e| ParseError::LineError {
                        line: idx + 1,
                        message: e.to_string(),
                    })?;
                validate(record, idx + 1)
            })
            .collect()
    }
}

/// One JSON record per line; blank lines are ignored
pub struct JsonLinesRecordParser;

impl RecordParser for JsonLinesRecordParser {
    fn parse(&self, content: &str) -> Result<Vec<RawRecord>, ParseError> {
        let mut records = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: RawRecord =
                serde_json::from_str(trimmed).map_err(|e| ParseError::LineError {
                    line: line_num + 1,
                    message: e.to_string(),
                })?;
            records.push(validate(record, line_num + 1)?);
        }

        Ok(records)
    }
}

fn validate(record: RawRecord, line: usize) -> Result<RawRecord, ParseError> {
    if record.lhs.is_empty() {
        return Err(ParseError::LineError {
            line,
            message: "Missing lhs".to_string(),
        });
    }
    Mode::from_code(&record.mode).map_err(|e| ParseError::LineError {
        line,
        message: e.to_string(),
    })?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_registry_creation() {
        let registry = ParserRegistry::new();
        assert!(registry.get_parser("json").is_some());
        assert!(registry.get_parser("jsonl").is_some());
        assert!(registry.get_parser("ndjson").is_some());
        assert!(registry.get_parser("yaml").is_none());
    }

    #[test]
    fn test_json_parser_array() {
        let json = r#"[
            {"mode": "n", "lhs": "<Space>pf", "desc": "Find Files", "scope_flag": 0},
            {"mode": "i", "lhs": "jk", "rhs": "<Esc>"}
        ]"#;

        let records = JsonRecordParser.parse(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description.as_deref(), Some("Find Files"));
        assert_eq!(records[1].rhs.as_deref(), Some("<Esc>"));
    }

    #[test]
    fn test_json_parser_wrapped() {
        let json = r#"{"records": [{"mode": "t", "lhs": "<Esc><Esc>", "buffer": 1}]}"#;
        let records = JsonRecordParser.parse(json).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].scope_flag);
    }

    #[test]
    fn test_json_parser_missing_records() {
        let result = JsonRecordParser.parse(r#"{"version": "1.0"}"#);
        assert!(matches!(result, Err(ParseError::MissingField(_))));
    }

    #[test]
    fn test_json_parser_invalid_mode() {
        let result = JsonRecordParser.parse(r#"[{"mode": "q", "lhs": "x"}]"#);
        assert!(matches!(result, Err(ParseError::LineError { line: 1, .. })));
    }

    #[test]
    fn test_jsonl_parser() {
        let content = "{\"mode\":\"n\",\"lhs\":\"gd\"}\n\n{\"mode\":\"x\",\"lhs\":\"gc\"}\n";
        let records = JsonLinesRecordParser.parse(content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].mode, "x");
    }

    #[test]
    fn test_jsonl_parser_reports_line() {
        let content = "{\"mode\":\"n\",\"lhs\":\"gd\"}\nnot json\n";
        let result = JsonLinesRecordParser.parse(content);
        assert!(matches!(result, Err(ParseError::LineError { line: 2, .. })));
    }

    #[test]
    fn test_parse_auto() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.parse_auto(r#"[{"mode":"n","lhs":"x"}]"#).unwrap().len(), 1);
        assert_eq!(
            registry
                .parse_auto("{\"mode\":\"n\",\"lhs\":\"x\"}\n{\"mode\":\"n\",\"lhs\":\"y\"}")
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            registry
                .parse_auto(r#"{"records": [{"mode":"n","lhs":"x"}]}"#)
                .unwrap()
                .len(),
            1
        );
    }
}
