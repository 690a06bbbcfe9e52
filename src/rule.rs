//! Replacement rules and rule-file loading.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RewordError};

/// A single search & replace rule.
///
/// Rules default to case-sensitive literal matching; regex matching and
/// case-insensitive matching are opt-in. A rule may be restricted to a set
/// of file extensions, in which case it is skipped for all other files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub search_pattern: String,
    pub replacement_text: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    /// Comma-separated extension list (e.g. `".cs,.sql"`); `None` means all files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_extensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_case_sensitive() -> bool {
    true
}

impl Rule {
    /// Create a case-sensitive literal rule.
    pub fn literal(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search_pattern: search.into(),
            replacement_text: replace.into(),
            is_regex: false,
            case_sensitive: true,
            target_extensions: None,
            rule_id: None,
            name: None,
        }
    }

    /// Create a case-sensitive regex rule.
    pub fn regex(pattern: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::literal(pattern, replace)
        }
    }

    /// Switch the rule to case-insensitive matching.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Restrict the rule to a comma-separated list of extensions.
    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.target_extensions = Some(extensions.into());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.rule_id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The normalized extension set this rule targets, or `None` for all files.
    ///
    /// An empty or all-whitespace list is treated the same as `None`.
    pub fn target_extension_set(&self) -> Option<HashSet<String>> {
        let raw = self.target_extensions.as_deref()?;
        let set = normalize_extension_set(raw);
        if set.is_empty() { None } else { Some(set) }
    }

    /// Whether this rule applies to a file with the given normalized extension.
    pub fn applies_to(&self, extension: &str) -> bool {
        match self.target_extension_set() {
            Some(targets) => targets.contains(extension),
            None => true,
        }
    }

    /// Human-readable label: the rule's name, or `search -> replacement`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} -> {}", self.search_pattern, self.replacement_text),
        }
    }
}

/// Envelope produced by rule exports: a timestamp, a count, and the rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub rules: Vec<Rule>,
}

/// Load rules from a JSON file.
///
/// Accepts either a bare array of rules or an export envelope with a
/// top-level `rules` field.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let raw = fs::read_to_string(path).map_err(|source| RewordError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if let Ok(file) = serde_json::from_str::<RuleFile>(&raw) {
        return Ok(file.rules);
    }
    let rules: Vec<Rule> = serde_json::from_str(&raw)?;
    Ok(rules)
}

/// Normalize a file extension: trim, lowercase, and ensure a leading dot.
///
/// `"CS"`, `".cs"`, and `" .Cs "` all normalize to `".cs"`. An empty input
/// stays empty.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{trimmed}")
    }
}

/// Parse a comma-separated extension list into a normalized set.
///
/// Blank entries are dropped, so `""` and `", ,"` both yield an empty set.
pub fn normalize_extension_set(list: &str) -> HashSet<String> {
    list.split(',')
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty())
        .collect()
}
