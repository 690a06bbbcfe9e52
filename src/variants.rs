//! Naming-convention variant generation for deep searches.
//!
//! A single conceptual rename (`CNIC` -> `Aadhar`) rarely covers a legacy
//! codebase: the same identifier shows up lowercased, uppercased, snake_cased,
//! and glued to Hungarian-style prefixes. This module expands one rename pair
//! into the full family of concrete pairs worth scanning for.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::matcher::CompiledRule;
use crate::rule::Rule;
use crate::scanner::PathScanner;

/// Identifier prefixes commonly found in legacy .NET/WinForms/SQL code.
pub const COMMON_PREFIXES: &[&str] = &[
    "column", "col", "fld", "txt", "lbl", "btn", "tbl", "sp", "fn", "vw", "ddl", "chk", "rdb",
    "grd", "pnl", "hdn", "rpt", "frm", "get", "set", "is", "has", "prm", "param", "var", "tmp",
];

/// The subset of prefixes that also appear underscore-joined.
const UNDERSCORE_PREFIXES: &[&str] = &["column", "col", "tbl", "sp", "fn", "vw"];

/// Why a variant pair was generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantCategory {
    Exact,
    Case,
    Snake,
    Underscore,
    /// Prefix glued to the PascalCase form, e.g. `columnCNIC`.
    Prefixed(String),
    /// Prefix joined with an underscore, e.g. `col_cnic`.
    PrefixedUnderscore(String),
}

impl fmt::Display for VariantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantCategory::Exact => write!(f, "Exact"),
            VariantCategory::Case => write!(f, "Case Variant"),
            VariantCategory::Snake => write!(f, "Snake Case"),
            VariantCategory::Underscore => write!(f, "Underscore Prefix"),
            VariantCategory::Prefixed(prefix) => write!(f, "Prefix: {prefix}*"),
            VariantCategory::PrefixedUnderscore(prefix) => write!(f, "Prefix: {prefix}_*"),
        }
    }
}

impl Serialize for VariantCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One concrete search/replace pair derived from a rename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub original: String,
    pub replacement: String,
    pub category: VariantCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_rule_id: Option<i64>,
}

#[derive(Default)]
struct VariantSet {
    variants: Vec<Variant>,
    seen: HashSet<(String, String)>,
}

impl VariantSet {
    // Identity pairs are useless as rules, and the same pair generated by
    // two conventions (e.g. an all-lowercase input) is kept once, under the
    // first category that produced it.
    fn push(&mut self, original: String, replacement: String, category: VariantCategory) {
        if original == replacement {
            return;
        }
        if self.seen.insert((original.clone(), replacement.clone())) {
            self.variants.push(Variant {
                original,
                replacement,
                category,
                source_rule: None,
                source_rule_id: None,
            });
        }
    }
}

/// Expand one rename pair into all naming-convention variants.
///
/// Output order is deterministic: exact first, then case forms, snake
/// forms, underscore forms, and finally the prefix families. Blank input on
/// either side yields nothing.
pub fn generate_variants(search: &str, replace: &str) -> Vec<Variant> {
    let search = search.trim();
    let replace = replace.trim();
    if search.is_empty() || replace.is_empty() {
        return Vec::new();
    }

    let mut set = VariantSet::default();
    set.push(search.to_string(), replace.to_string(), VariantCategory::Exact);

    set.push(
        search.to_lowercase(),
        replace.to_lowercase(),
        VariantCategory::Case,
    );
    set.push(
        search.to_uppercase(),
        replace.to_uppercase(),
        VariantCategory::Case,
    );
    set.push(to_pascal(search), to_pascal(replace), VariantCategory::Case);
    set.push(to_camel(search), to_camel(replace), VariantCategory::Case);

    let (snake_search, snake_replace) = (to_snake(search), to_snake(replace));
    set.push(
        snake_search.clone(),
        snake_replace.clone(),
        VariantCategory::Snake,
    );
    set.push(
        snake_search.to_uppercase(),
        snake_replace.to_uppercase(),
        VariantCategory::Snake,
    );

    set.push(
        format!("_{}", to_camel(search)),
        format!("_{}", to_camel(replace)),
        VariantCategory::Underscore,
    );
    set.push(
        format!("_{}", search.to_lowercase()),
        format!("_{}", replace.to_lowercase()),
        VariantCategory::Underscore,
    );

    for prefix in COMMON_PREFIXES {
        set.push(
            format!("{prefix}{}", to_pascal(search)),
            format!("{prefix}{}", to_pascal(replace)),
            VariantCategory::Prefixed(prefix.to_string()),
        );
    }
    for prefix in UNDERSCORE_PREFIXES {
        set.push(
            format!("{prefix}_{}", search.to_lowercase()),
            format!("{prefix}_{}", replace.to_lowercase()),
            VariantCategory::PrefixedUnderscore(prefix.to_string()),
        );
        set.push(
            format!("{prefix}_{}", search.to_uppercase()),
            format!("{prefix}_{}", replace.to_uppercase()),
            VariantCategory::PrefixedUnderscore(prefix.to_string()),
        );
    }

    set.variants
}

/// Expand every rule in a set, stamping each variant with its source rule.
pub fn generate_from_rules(rules: &[Rule]) -> Vec<Variant> {
    let mut all = Vec::new();
    for rule in rules {
        let mut variants = generate_variants(&rule.search_pattern, &rule.replacement_text);
        for variant in &mut variants {
            variant.source_rule = Some(rule.display_name());
            variant.source_rule_id = rule.rule_id;
        }
        all.extend(variants);
    }
    all
}

/// Occurrence counts for one variant across the scanned roots.
#[derive(Debug, Clone, Serialize)]
pub struct PatternPreview {
    pub original: String,
    pub replacement: String,
    pub file_count: usize,
    pub total_matches: usize,
    pub files: Vec<PreviewFile>,
}

/// One file a previewed variant occurs in.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewFile {
    pub file_path: PathBuf,
    pub relative_path: PathBuf,
    pub match_count: usize,
}

/// Count how often each variant occurs under the given roots, without
/// modifying anything. Counting is case-sensitive literal matching, since
/// every variant already targets one exact casing.
///
/// Each file is read once and checked against every variant. Results come
/// back in variant order; variants that occur nowhere report zero counts.
pub fn preview_variants(
    variants: &[Variant],
    roots: &[PathBuf],
    scanner: &PathScanner,
) -> Vec<PatternPreview> {
    let compiled: Vec<CompiledRule> = variants
        .iter()
        .map(|v| CompiledRule::compile(&Rule::literal(v.original.as_str(), v.replacement.as_str())))
        .collect();
    let mut previews: Vec<PatternPreview> = variants
        .iter()
        .map(|v| PatternPreview {
            original: v.original.clone(),
            replacement: v.replacement.clone(),
            file_count: 0,
            total_matches: 0,
            files: Vec::new(),
        })
        .collect();

    let mut seen = HashSet::new();
    for root in roots {
        for path in scanner.scan(root) {
            if !seen.insert(path.clone()) {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!("skipping unreadable file {}: {err}", path.display());
                    continue;
                }
            };
            let content = String::from_utf8_lossy(&bytes);
            for (rule, preview) in compiled.iter().zip(previews.iter_mut()) {
                let count = rule.match_count(&content);
                if count > 0 {
                    preview.file_count += 1;
                    preview.total_matches += count;
                    preview.files.push(PreviewFile {
                        file_path: path.clone(),
                        relative_path: path.strip_prefix(root).unwrap_or(&path).to_path_buf(),
                        match_count: count,
                    });
                }
            }
        }
    }
    previews
}

// First letter uppercased, the rest untouched.
fn to_pascal(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// First letter lowercased, the rest untouched.
fn to_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// Underscore before each uppercase letter that follows a non-uppercase
// character, then lowercase everything. Acronym runs stay glued:
// "CnicNumber" -> "cnic_number", but "CNICNumber" -> "cnicnumber".
fn to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_upper = true;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if !prev_upper {
                out.push('_');
            }
            prev_upper = true;
        } else {
            prev_upper = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScanConfig;
    use tempfile::TempDir;

    fn pairs(variants: &[Variant]) -> Vec<(&str, &str)> {
        variants
            .iter()
            .map(|v| (v.original.as_str(), v.replacement.as_str()))
            .collect()
    }

    #[test]
    fn test_core_variant_family() {
        let variants = generate_variants("CNIC", "Aadhar");
        let pairs = pairs(&variants);

        assert!(pairs.contains(&("CNIC", "Aadhar")));
        assert!(pairs.contains(&("cnic", "aadhar")));
        assert!(pairs.contains(&("CNIC", "AADHAR")));
        assert!(pairs.contains(&("columnCNIC", "columnAadhar")));
        assert!(pairs.contains(&("_cnic", "_aadhar")));
        assert!(pairs.contains(&("col_cnic", "col_aadhar")));
        assert!(pairs.contains(&("col_CNIC", "col_AADHAR")));
    }

    #[test]
    fn test_first_variant_is_exact() {
        let variants = generate_variants("  CNIC  ", "Aadhar");
        assert_eq!(variants[0].category, VariantCategory::Exact);
        assert_eq!(variants[0].original, "CNIC");
        assert_eq!(variants[0].replacement, "Aadhar");
    }

    #[test]
    fn test_no_identity_pairs_and_no_duplicates() {
        // all-lowercase input collapses exact/lower/camel into one pair
        let variants = generate_variants("test", "best");
        let mut unique = HashSet::new();
        for v in &variants {
            assert_ne!(v.original, v.replacement);
            assert!(unique.insert((v.original.clone(), v.replacement.clone())));
        }
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(generate_variants("", "x").is_empty());
        assert!(generate_variants("x", "   ").is_empty());
    }

    #[test]
    fn test_snake_case_insertion() {
        let variants = generate_variants("CnicNumber", "NationalId");
        let pairs = pairs(&variants);
        assert!(pairs.contains(&("cnic_number", "national_id")));
        assert!(pairs.contains(&("CNIC_NUMBER", "NATIONAL_ID")));
    }

    #[test]
    fn test_acronym_runs_stay_glued_in_snake() {
        assert_eq!(to_snake("CNICNumber"), "cnicnumber");
        assert_eq!(to_snake("CnicNumber"), "cnic_number");
        assert_eq!(to_snake("CNIC"), "cnic");
        assert_eq!(to_snake("a1B"), "a1_b");
    }

    #[test]
    fn test_pascal_and_camel_touch_only_the_first_letter() {
        assert_eq!(to_pascal("cnicNumber"), "CnicNumber");
        assert_eq!(to_pascal("CNIC"), "CNIC");
        assert_eq!(to_camel("CNIC"), "cNIC");
        assert_eq!(to_camel(""), "");
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(VariantCategory::Exact.to_string(), "Exact");
        assert_eq!(VariantCategory::Case.to_string(), "Case Variant");
        assert_eq!(VariantCategory::Snake.to_string(), "Snake Case");
        assert_eq!(VariantCategory::Underscore.to_string(), "Underscore Prefix");
        assert_eq!(
            VariantCategory::Prefixed("col".into()).to_string(),
            "Prefix: col*"
        );
        assert_eq!(
            VariantCategory::PrefixedUnderscore("col".into()).to_string(),
            "Prefix: col_*"
        );
    }

    #[test]
    fn test_category_serializes_as_label() {
        let variants = generate_variants("CNIC", "Aadhar");
        let json = serde_json::to_value(&variants[0]).unwrap();
        assert_eq!(json["category"], "Exact");
    }

    #[test]
    fn test_generate_from_rules_stamps_source() {
        let rules = vec![
            Rule::literal("CNIC", "Aadhar").with_id(7).with_name("cnic rename"),
            Rule::literal("Ledger", "Journal"),
        ];
        let variants = generate_from_rules(&rules);

        let from_first: Vec<_> = variants
            .iter()
            .filter(|v| v.source_rule_id == Some(7))
            .collect();
        assert!(!from_first.is_empty());
        assert!(from_first.iter().all(|v| v.source_rule.as_deref() == Some("cnic rename")));

        let from_second: Vec<_> = variants
            .iter()
            .filter(|v| v.source_rule_id.is_none())
            .collect();
        assert!(
            from_second
                .iter()
                .all(|v| v.source_rule.as_deref() == Some("Ledger -> Journal"))
        );
    }

    #[test]
    fn test_preview_counts_occurrences() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.cs"), "CNIC cnic CNIC").unwrap();
        std::fs::write(dir.path().join("b.cs"), "cnic only").unwrap();

        let variants = generate_variants("CNIC", "Aadhar");
        let scanner = PathScanner::new(ScanConfig::include_all());
        let previews = preview_variants(&variants, &[dir.path().to_path_buf()], &scanner);

        assert_eq!(previews.len(), variants.len());

        let exact = &previews[0];
        assert_eq!(exact.original, "CNIC");
        assert_eq!(exact.file_count, 1);
        assert_eq!(exact.total_matches, 2);
        assert_eq!(exact.files[0].relative_path, PathBuf::from("a.cs"));

        let lower = previews
            .iter()
            .find(|p| p.original == "cnic")
            .expect("lowercase variant previewed");
        assert_eq!(lower.file_count, 2);
        assert_eq!(lower.total_matches, 2);

        let absent = previews
            .iter()
            .find(|p| p.original == "columnCNIC")
            .expect("prefixed variant previewed");
        assert_eq!(absent.file_count, 0);
        assert!(absent.files.is_empty());
    }
}
