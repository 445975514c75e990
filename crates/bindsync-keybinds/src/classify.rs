//! Heuristic classification of keybinding records
//!
//! Classification is a pure function of a record and its normalized lhs. The
//! rules are held in ordered tables; the first matching rule wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::keys::tokenize;
use crate::models::RawRecord;

/// Shape of the key sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingType {
    Leader,
    LocalLeader,
    Ctrl,
    Alt,
    Function,
    Plug,
    Chord,
    Key,
}

impl BindingType {
    /// Derive the type from a normalized sequence
    pub fn of(lhs_normalized: &str) -> Self {
        if lhs_normalized.starts_with("<leader>") {
            return BindingType::Leader;
        }
        if lhs_normalized.starts_with("<localleader>") {
            return BindingType::LocalLeader;
        }
        if lhs_normalized.starts_with("<Plug>") {
            return BindingType::Plug;
        }

        let tokens = tokenize(lhs_normalized);
        let first = tokens.first().map(String::as_str).unwrap_or("");
        if first.starts_with("<C-") {
            BindingType::Ctrl
        } else if first.starts_with("<M-") {
            BindingType::Alt
        } else if first.starts_with("<F") && first[2..].starts_with(|c: char| c.is_ascii_digit()) {
            BindingType::Function
        } else if tokens.len() > 1 {
            BindingType::Chord
        } else {
            BindingType::Key
        }
    }
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BindingType::Leader => "leader",
            BindingType::LocalLeader => "localleader",
            BindingType::Ctrl => "ctrl",
            BindingType::Alt => "alt",
            BindingType::Function => "function",
            BindingType::Plug => "plug",
            BindingType::Chord => "chord",
            BindingType::Key => "key",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BindingType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leader" => Ok(BindingType::Leader),
            "localleader" => Ok(BindingType::LocalLeader),
            "ctrl" => Ok(BindingType::Ctrl),
            "alt" => Ok(BindingType::Alt),
            "function" => Ok(BindingType::Function),
            "plug" => Ok(BindingType::Plug),
            "chord" => Ok(BindingType::Chord),
            "key" => Ok(BindingType::Key),
            _ => Err(ParseError::InvalidBindingType(s.to_string())),
        }
    }
}

/// Functional area of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Search,
    Files,
    Git,
    Lsp,
    Diagnostics,
    Completion,
    Windows,
    Buffers,
    Terminal,
    Editing,
    Navigation,
    Ui,
    #[default]
    General,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Search => "Search",
            Category::Files => "Files",
            Category::Git => "Git",
            Category::Lsp => "LSP",
            Category::Diagnostics => "Diagnostics",
            Category::Completion => "Completion",
            Category::Windows => "Windows",
            Category::Buffers => "Buffers",
            Category::Terminal => "Terminal",
            Category::Editing => "Editing",
            Category::Navigation => "Navigation",
            Category::Ui => "UI",
            Category::General => "General",
        };
        write!(f, "{}", s)
    }
}

/// Output of the classification step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Plugin slug, e.g. `telescope.nvim`
    pub plugin: Option<String>,
    pub category: Category,
    pub binding_type: BindingType,
    pub prefix: String,
}

impl ClassificationResult {
    /// Classification with no plugin and the default category
    pub fn from_lhs(lhs_normalized: &str) -> Self {
        ClassificationResult {
            plugin: None,
            category: Category::General,
            binding_type: BindingType::of(lhs_normalized),
            prefix: prefix_of(lhs_normalized),
        }
    }
}

/// Pure record classifier
pub trait Classifier: Send + Sync {
    fn classify(&self, record: &RawRecord, lhs_normalized: &str) -> ClassificationResult;
}

/// Leading keys that open a family of bindings
const PREFIX_KEYS: &[&str] = &["g", "z", "[", "]", "<C-w>"];

/// Group key for sequences like `gd` or `]d`; empty for everything else
pub fn prefix_of(lhs_normalized: &str) -> String {
    let tokens = tokenize(lhs_normalized);
    match tokens.first() {
        Some(first) if tokens.len() > 1 && PREFIX_KEYS.contains(&first.as_str()) => first.clone(),
        _ => String::new(),
    }
}

/// Known plugins: (needle, slug, category)
const PLUGIN_TABLE: &[(&str, &str, Category)] = &[
    ("telescope", "telescope.nvim", Category::Search),
    ("fzf-lua", "fzf-lua", Category::Search),
    ("neo-tree", "neo-tree.nvim", Category::Files),
    ("nvim-tree", "nvim-tree.lua", Category::Files),
    ("oil", "oil.nvim", Category::Files),
    ("harpoon", "harpoon", Category::Navigation),
    ("flash", "flash.nvim", Category::Navigation),
    ("leap", "leap.nvim", Category::Navigation),
    ("gitsigns", "gitsigns.nvim", Category::Git),
    ("fugitive", "vim-fugitive", Category::Git),
    ("lazygit", "lazygit.nvim", Category::Git),
    ("lspconfig", "nvim-lspconfig", Category::Lsp),
    ("trouble", "trouble.nvim", Category::Diagnostics),
    ("cmp", "nvim-cmp", Category::Completion),
    ("luasnip", "LuaSnip", Category::Completion),
    ("toggleterm", "toggleterm.nvim", Category::Terminal),
    ("comment", "Comment.nvim", Category::Editing),
    ("surround", "nvim-surround", Category::Editing),
    ("which-key", "which-key.nvim", Category::Ui),
    ("bufferline", "bufferline.nvim", Category::Buffers),
];

/// Description keywords: (needle, category), checked in order
const CATEGORY_RULES: &[(&str, Category)] = &[
    ("diagnostic", Category::Diagnostics),
    ("git", Category::Git),
    ("hunk", Category::Git),
    ("blame", Category::Git),
    ("definition", Category::Lsp),
    ("reference", Category::Lsp),
    ("implementation", Category::Lsp),
    ("code action", Category::Lsp),
    ("rename", Category::Lsp),
    ("hover", Category::Lsp),
    ("lsp", Category::Lsp),
    ("grep", Category::Search),
    ("search", Category::Search),
    ("find", Category::Search),
    ("explorer", Category::Files),
    ("file", Category::Files),
    ("terminal", Category::Terminal),
    ("window", Category::Windows),
    ("split", Category::Windows),
    ("buffer", Category::Buffers),
    ("comment", Category::Editing),
    ("indent", Category::Editing),
    ("jump", Category::Navigation),
    ("next", Category::Navigation),
    ("prev", Category::Navigation),
    ("toggle", Category::Ui),
];

/// Directories whose immediate child is a plugin checkout
const PLUGIN_ROOTS: &[&str] = &["lazy", "plugged", "bundle"];

/// Path fragments of the editor's own runtime files
const RUNTIME_MARKERS: &[&str] = &["/share/nvim/runtime/", "/runtime/lua/vim/", "/runtime/plugin/"];

/// True when the origin is a file shipped with the editor itself
pub fn is_runtime_origin(origin: &str) -> bool {
    let origin = origin.replace('\\', "/");
    RUNTIME_MARKERS.iter().any(|m| origin.contains(m))
}

/// Plugin directory named by a package-manager layout:
/// `lazy/<slug>`, `plugged/<slug>`, `bundle/<slug>` or `pack/<group>/{start,opt}/<slug>`
fn plugin_dir(origin: &str) -> Option<&str> {
    let segments: Vec<&str> = origin.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        let slug_at = match *segment {
            s if PLUGIN_ROOTS.contains(&s) => i + 1,
            "pack" if matches!(segments.get(i + 2), Some(&"start") | Some(&"opt")) => i + 3,
            _ => continue,
        };
        // the slug must be a directory, not the file itself
        if slug_at + 1 < segments.len() {
            return Some(segments[slug_at]);
        }
    }
    None
}

/// Ordered-rule classifier
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    /// Substring -> slug, consulted before the built-in tables
    aliases: BTreeMap<String, String>,
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra substring -> slug rules, matched against origin and description
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        self.aliases
            .extend(aliases.into_iter().map(|(k, v)| (k.to_lowercase(), v)));
        self
    }

    fn infer_plugin(&self, record: &RawRecord) -> Option<String> {
        let origin = record.origin_path.as_deref().unwrap_or("").replace('\\', "/");
        let origin_lower = origin.to_lowercase();
        let desc_lower = record.description.as_deref().unwrap_or("").to_lowercase();

        if is_runtime_origin(&origin) {
            return None;
        }

        for (needle, slug) in &self.aliases {
            if origin_lower.contains(needle.as_str()) || desc_lower.contains(needle.as_str()) {
                return Some(slug.clone());
            }
        }

        if let Some(dir) = plugin_dir(&origin) {
            return Some(dir.to_string());
        }

        // "Telescope: find files" style descriptions
        if let Some((head, _)) = desc_lower.split_once(':') {
            let head = head.trim();
            for (needle, slug, _) in PLUGIN_TABLE {
                if head == *needle {
                    return Some((*slug).to_string());
                }
            }
        }

        None
    }

    fn infer_category(plugin: Option<&str>, description: &str) -> Category {
        if let Some(slug) = plugin {
            let slug = slug.to_lowercase();
            for (needle, _, category) in PLUGIN_TABLE {
                if slug.contains(needle) {
                    return *category;
                }
            }
        }

        let description = description.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|(needle, _)| description.contains(needle))
            .map(|(_, category)| *category)
            .unwrap_or_default()
    }
}

impl Classifier for RuleClassifier {
    fn classify(&self, record: &RawRecord, lhs_normalized: &str) -> ClassificationResult {
        let plugin = self.infer_plugin(record);
        let category = Self::infer_category(
            plugin.as_deref(),
            record.description.as_deref().unwrap_or(""),
        );

        ClassificationResult {
            plugin,
            category,
            binding_type: BindingType::of(lhs_normalized),
            prefix: prefix_of(lhs_normalized),
        }
    }
}

/// Short tag shown in display names: `telescope.nvim` -> `telescope`
pub fn plugin_tag(slug: &str) -> String {
    let tag = slug.strip_suffix(".nvim").unwrap_or(slug);
    let tag = tag.strip_suffix(".lua").unwrap_or(tag);
    let tag = tag.strip_prefix("nvim-").unwrap_or(tag);
    let tag = tag.strip_prefix("vim-").unwrap_or(tag);
    tag.to_string()
}
