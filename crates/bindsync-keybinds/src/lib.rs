//! Keybinding records and the row builder
//!
//! This crate turns the raw keymap records a collector dumps into canonical
//! [`Row`]s:
//! - JSON and JSON-lines record parsing
//! - Key-sequence normalization (modifier case, named keys, leader)
//! - Rule-based classification (plugin, category, binding type, prefix)
//! - Deduplication by (scope flag, normalized lhs) with mode merging
//! - Identity keys and binding fingerprints for remote reconciliation

pub mod builder;
pub mod classify;
pub mod error;
pub mod keys;
pub mod models;
pub mod parser;

// Re-export public types
pub use builder::{RowBuilder, RowBuilderOptions};
pub use classify::{BindingType, Category, ClassificationResult, Classifier, RuleClassifier};
pub use error::ParseError;
pub use keys::KeyNormalizer;
pub use models::{
    binding_fingerprint, command_key, identity_key, is_builtin_command, Mode, ModeClass,
    RawRecord, Row, Scope,
};
pub use parser::{JsonLinesRecordParser, JsonRecordParser, ParserRegistry, RecordParser};
