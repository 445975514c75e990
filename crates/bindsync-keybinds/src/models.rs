//! Core data models for keybinding rows

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::classify::{BindingType, Category, ClassificationResult};
use crate::error::ParseError;

/// Editor mode a mapping is defined in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    Normal,
    Visual,
    VisualOnly,
    Select,
    Insert,
    CommandLine,
    Terminal,
    OperatorPending,
}

impl Mode {
    /// Parse the single-letter mode code emitted by the collector
    pub fn from_code(code: &str) -> Result<Self, ParseError> {
        match code.trim() {
            "n" => Ok(Mode::Normal),
            "v" => Ok(Mode::Visual),
            "x" => Ok(Mode::VisualOnly),
            "s" => Ok(Mode::Select),
            "i" => Ok(Mode::Insert),
            "c" => Ok(Mode::CommandLine),
            "t" => Ok(Mode::Terminal),
            "o" => Ok(Mode::OperatorPending),
            other => Err(ParseError::InvalidMode(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Mode::Normal => "n",
            Mode::Visual => "v",
            Mode::VisualOnly => "x",
            Mode::Select => "s",
            Mode::Insert => "i",
            Mode::CommandLine => "c",
            Mode::Terminal => "t",
            Mode::OperatorPending => "o",
        }
    }

    /// Human-readable name, as written to the remote Mode column
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "Normal",
            Mode::Visual => "Visual",
            Mode::VisualOnly => "Visual Only",
            Mode::Select => "Select",
            Mode::Insert => "Insert",
            Mode::CommandLine => "Command-line",
            Mode::Terminal => "Terminal",
            Mode::OperatorPending => "Operator-pending",
        }
    }

    pub fn class(&self) -> ModeClass {
        match self {
            Mode::Visual | Mode::VisualOnly | Mode::Select => ModeClass::Visual,
            Mode::Insert => ModeClass::Insert,
            Mode::CommandLine => ModeClass::CommandLine,
            Mode::Terminal => ModeClass::Terminal,
            Mode::OperatorPending => ModeClass::OperatorPending,
            Mode::Normal => ModeClass::Normal,
        }
    }

    pub fn all() -> [Mode; 8] {
        [
            Mode::Normal,
            Mode::Visual,
            Mode::VisualOnly,
            Mode::Select,
            Mode::Insert,
            Mode::CommandLine,
            Mode::Terminal,
            Mode::OperatorPending,
        ]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Mode {
    type Err = ParseError;

    /// Accepts either a mode code or a label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(mode) = Mode::from_code(trimmed) {
            return Ok(mode);
        }
        Mode::all()
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseError::InvalidMode(s.to_string()))
    }
}

/// Collapsed mode family used in identity keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeClass {
    Visual,
    Insert,
    CommandLine,
    Terminal,
    OperatorPending,
    Normal,
}

impl ModeClass {
    pub fn symbol(&self) -> &'static str {
        match self {
            ModeClass::Visual => "v",
            ModeClass::Insert => "i",
            ModeClass::CommandLine => "c",
            ModeClass::Terminal => "t",
            ModeClass::OperatorPending => "o",
            ModeClass::Normal => "n",
        }
    }

    /// Higher wins when several modes are merged into one row
    pub fn priority(&self) -> u8 {
        match self {
            ModeClass::Visual => 5,
            ModeClass::Insert => 4,
            ModeClass::CommandLine => 3,
            ModeClass::Terminal => 2,
            ModeClass::OperatorPending => 1,
            ModeClass::Normal => 0,
        }
    }

    /// Pick the winning class for a set of modes
    pub fn of<'a>(modes: impl IntoIterator<Item = &'a Mode>) -> Option<ModeClass> {
        modes
            .into_iter()
            .map(Mode::class)
            .max_by_key(ModeClass::priority)
    }
}

impl fmt::Display for ModeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Where a binding applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Scope {
    #[default]
    Global,
    Buffer,
    Project,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "Global"),
            Scope::Buffer => write!(f, "Buffer"),
            Scope::Project => write!(f, "Project"),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "buffer" | "local" => Ok(Scope::Buffer),
            "project" => Ok(Scope::Project),
            _ => Err(ParseError::InvalidScope(s.to_string())),
        }
    }
}

/// One keymap record as produced by the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub mode: String,
    pub lhs: String,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
    #[serde(default, alias = "rhs_or_callback_marker", alias = "callback")]
    pub rhs: Option<String>,
    #[serde(default, alias = "origin", alias = "source")]
    pub origin_path: Option<String>,
    /// Buffer-local when set
    #[serde(default, alias = "buffer", deserialize_with = "flag_from_int_or_bool")]
    pub scope_flag: bool,
}

impl RawRecord {
    /// Create a global record with no metadata
    pub fn new(mode: impl Into<String>, lhs: impl Into<String>) -> Self {
        RawRecord {
            mode: mode.into(),
            lhs: lhs.into(),
            description: None,
            rhs: None,
            origin_path: None,
            scope_flag: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_rhs(mut self, rhs: impl Into<String>) -> Self {
        self.rhs = Some(rhs.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_path = Some(origin.into());
        self
    }

    pub fn buffer_local(mut self) -> Self {
        self.scope_flag = true;
        self
    }
}

fn flag_from_int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// A reconciled keybinding, one per (scope flag, normalized lhs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub display_name: String,
    pub lhs_normalized: String,
    pub modes: BTreeSet<Mode>,
    pub scope: Scope,
    pub scope_flag: bool,
    pub binding_type: BindingType,
    pub prefix: String,
    pub category: Category,
    pub plugin: Option<String>,
    pub description: Option<String>,
    pub command_text: String,
    pub identity_key: String,
    pub binding_fingerprint: String,
}

impl Row {
    /// Create an unfinalized row holding a single mode
    pub fn new(
        display_name: impl Into<String>,
        lhs_normalized: impl Into<String>,
        mode: Mode,
        scope: Scope,
        classification: ClassificationResult,
        command_text: impl Into<String>,
    ) -> Self {
        let mut modes = BTreeSet::new();
        modes.insert(mode);
        Row {
            display_name: display_name.into(),
            lhs_normalized: lhs_normalized.into(),
            modes,
            scope,
            scope_flag: scope == Scope::Buffer,
            binding_type: classification.binding_type,
            prefix: classification.prefix,
            category: classification.category,
            plugin: classification.plugin,
            description: None,
            command_text: command_text.into(),
            identity_key: String::new(),
            binding_fingerprint: String::new(),
        }
    }

    pub fn add_mode(&mut self, mode: Mode) {
        self.modes.insert(mode);
    }

    /// Recompute identity key and fingerprint from the current fields
    pub fn finalize(&mut self) {
        let class = self.mode_class();
        self.identity_key = identity_key(class, &self.lhs_normalized, self.scope);
        self.binding_fingerprint = binding_fingerprint(
            &self.binding_type.to_string(),
            &self.prefix,
            &self.lhs_normalized,
        );
    }

    /// Winning mode class; rows always hold at least one mode
    pub fn mode_class(&self) -> ModeClass {
        ModeClass::of(&self.modes).unwrap_or(ModeClass::Normal)
    }

    pub fn command_key(&self) -> String {
        command_key(&self.command_text)
    }

    /// Whether the command text is the builtin sentinel (or empty)
    pub fn is_builtin(&self, sentinel: &str) -> bool {
        is_builtin_command(&self.command_text, sentinel)
    }

    pub fn mode_labels(&self) -> Vec<&'static str> {
        self.modes.iter().map(Mode::label).collect()
    }
}

/// `<mode_class>|<lhs>|<scope>`
pub fn identity_key(class: ModeClass, lhs_normalized: &str, scope: Scope) -> String {
    format!("{}|{}|{}", class.symbol(), lhs_normalized, scope)
}

/// `<type>|<prefix>|<lhs>`; modes and free text are deliberately absent
pub fn binding_fingerprint(binding_type: &str, prefix: &str, lhs_normalized: &str) -> String {
    format!("{}|{}|{}", binding_type, prefix, lhs_normalized)
}

/// Canonical form of a command string used for rebind lookups
pub fn command_key(command_text: &str) -> String {
    let collapsed = command_text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if collapsed.starts_with("plugin:") {
        let trimmed = collapsed.strip_suffix(".lua").unwrap_or(&collapsed);
        let trimmed = trimmed.strip_suffix(".nvim").unwrap_or(trimmed);
        return trimmed.to_string();
    }
    collapsed
}

/// Empty text or a case-insensitive sentinel match
pub fn is_builtin_command(command_text: &str, sentinel: &str) -> bool {
    let text = command_text.trim();
    text.is_empty() || text.eq_ignore_ascii_case(sentinel.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes_round_trip() {
        for mode in Mode::all() {
            assert_eq!(Mode::from_code(mode.code()).unwrap(), mode);
            assert_eq!(mode.label().parse::<Mode>().unwrap(), mode);
        }
        assert!(Mode::from_code("q").is_err());
    }

    #[test]
    fn test_mode_class_priority() {
        let modes: BTreeSet<Mode> = [Mode::Normal, Mode::Insert].into_iter().collect();
        assert_eq!(ModeClass::of(&modes), Some(ModeClass::Insert));

        let modes: BTreeSet<Mode> = [Mode::Normal, Mode::Select, Mode::Terminal]
            .into_iter()
            .collect();
        assert_eq!(ModeClass::of(&modes), Some(ModeClass::Visual));

        let modes: BTreeSet<Mode> = [Mode::OperatorPending, Mode::Normal].into_iter().collect();
        assert_eq!(ModeClass::of(&modes), Some(ModeClass::OperatorPending));

        assert_eq!(ModeClass::of(&BTreeSet::<Mode>::new()), None);
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("Buffer".parse::<Scope>().unwrap(), Scope::Buffer);
        assert_eq!("PROJECT".parse::<Scope>().unwrap(), Scope::Project);
        assert!("galaxy".parse::<Scope>().is_err());
    }

    #[test]
    fn test_identity_key_format() {
        assert_eq!(
            identity_key(ModeClass::Normal, "<leader>pf", Scope::Global),
            "n|<leader>pf|Global"
        );
        assert_eq!(binding_fingerprint("leader", "", "<leader>pf"), "leader||<leader>pf");
    }

    #[test]
    fn test_command_key_canonicalization() {
        assert_eq!(command_key("  Find   Files "), "find files");
        assert_eq!(command_key("Plugin: telescope.nvim"), "plugin: telescope");
        assert_eq!(command_key("Plugin: lazy.lua"), "plugin: lazy");
        assert_eq!(command_key("Plugin:   which-key.nvim.lua"), "plugin: which-key");
        assert_eq!(command_key("open init.lua"), "open init.lua");
    }

    #[test]
    fn test_builtin_detection() {
        assert!(is_builtin_command("built IN", "Built in"));
        assert!(is_builtin_command("   ", "Built in"));
        assert!(!is_builtin_command("Plugin: telescope", "Built in"));
    }

    #[test]
    fn test_raw_record_scope_flag_accepts_int_and_bool() {
        let r: RawRecord = serde_json::from_str(r#"{"mode":"n","lhs":"x","scope_flag":1}"#).unwrap();
        assert!(r.scope_flag);
        let r: RawRecord =
            serde_json::from_str(r#"{"mode":"n","lhs":"x","buffer":false}"#).unwrap();
        assert!(!r.scope_flag);
        let r: RawRecord = serde_json::from_str(r#"{"mode":"n","lhs":"x"}"#).unwrap();
        assert!(!r.scope_flag);
    }
}
