//! ALTER-script generation for keyword renames in DDL files.
//!
//! Tables and table types go through `sp_rename` so data survives; views,
//! procedures and functions are re-emitted as `ALTER` statements so
//! permissions survive. The output is a reviewable script, not something
//! to run blind, so every generator also returns warnings.

use std::path::Path;

use serde::Serialize;

use crate::matcher::CompiledRule;
use crate::rule::Rule;

use super::{
    SqlObjectKind, detect_object_kind, extract_column_names, extract_constraint_names,
    extract_object_name, short_name, strip_brackets,
};

const SEPARATOR: &str = "-- ==============================================";

/// A generated rename script plus the warnings a reviewer should read first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterScript {
    pub kind: SqlObjectKind,
    pub script: String,
    pub warnings: Vec<String>,
}

/// Generate a rename script for one DDL file.
///
/// `kind` overrides detection when given; `None` (or an explicit
/// [`SqlObjectKind::Unknown`]) re-detects from the content and filename.
/// The keyword is matched as a case-insensitive literal everywhere, so
/// `CNIC` also rewrites `cnic_number`.
pub fn generate_alter_script(
    content: &str,
    kind: Option<SqlObjectKind>,
    search: &str,
    replace: &str,
    path: &Path,
) -> AlterScript {
    let kind = match kind {
        Some(kind) if kind != SqlObjectKind::Unknown => kind,
        _ => detect_object_kind(content, path),
    };

    let mut warnings = Vec::new();
    let object_name = match extract_object_name(content, kind) {
        Some(name) => name,
        None => {
            warnings.push(
                "Could not auto-detect object name from DDL. Please replace <object_name> manually."
                    .to_string(),
            );
            "<object_name>".to_string()
        }
    };
    let clean_name = strip_brackets(&object_name);
    let object_short = short_name(&object_name);
    let rule = CompiledRule::compile(&Rule::literal(search, replace).case_insensitive());

    let mut lines = Vec::new();
    match kind {
        SqlObjectKind::Table => {
            table_script(
                &mut lines,
                &mut warnings,
                content,
                &clean_name,
                &object_short,
                search,
                replace,
                &rule,
            );
        }
        SqlObjectKind::TableType => {
            table_type_script(
                &mut lines,
                &mut warnings,
                content,
                &clean_name,
                &object_short,
                search,
                replace,
                &rule,
            );
        }
        SqlObjectKind::View => {
            routine_script(
                &mut lines,
                content,
                &clean_name,
                search,
                replace,
                &rule,
                "VIEW",
                "ALTER VIEW (preserves permissions)",
                &["VIEW"],
            );
            warnings.push(
                "Review the ALTER VIEW output to ensure column aliases and references are correct."
                    .to_string(),
            );
        }
        SqlObjectKind::StoredProcedure => {
            routine_script(
                &mut lines,
                content,
                &clean_name,
                search,
                replace,
                &rule,
                "STORED PROCEDURE",
                "ALTER PROCEDURE (preserves permissions)",
                &["PROCEDURE", "PROC"],
            );
            warnings
                .push("Review parameter names and internal references after replacement.".to_string());
        }
        SqlObjectKind::Function => {
            routine_script(
                &mut lines,
                content,
                &clean_name,
                search,
                replace,
                &rule,
                "FUNCTION",
                "ALTER FUNCTION (preserves permissions)",
                &["FUNCTION"],
            );
            warnings.push(
                "Review return types and internal table references after replacement.".to_string(),
            );
        }
        SqlObjectKind::Unknown => {
            lines.push("-- Could not determine SQL object type for this file.".to_string());
            lines.push("-- Please review manually.".to_string());
            warnings.push("Unknown SQL object type. Manual review recommended.".to_string());
        }
    }

    AlterScript {
        kind,
        script: lines.join("\n").trim().to_string(),
        warnings,
    }
}

fn header(lines: &mut Vec<String>, label: &str, clean_name: &str, search: &str, replace: &str, strategy: &str) {
    lines.push(SEPARATOR.to_string());
    lines.push(format!("-- ALTER Script for {label}: {clean_name}"));
    lines.push(format!("-- Keyword: '{search}' -> '{replace}'"));
    lines.push(format!("-- Strategy: {strategy}"));
    lines.push(SEPARATOR.to_string());
    lines.push(String::new());
}

#[allow(clippy::too_many_arguments)]
fn table_script(
    lines: &mut Vec<String>,
    warnings: &mut Vec<String>,
    content: &str,
    clean_name: &str,
    object_short: &str,
    search: &str,
    replace: &str,
    rule: &CompiledRule,
) {
    header(lines, "TABLE", clean_name, search, replace, "sp_rename (preserves data)");

    let table_renamed = rule.match_count(object_short) > 0;
    if table_renamed {
        let new_table = rule.apply(object_short).0;
        lines.push("-- Rename the table itself".to_string());
        lines.push(format!("EXEC sp_rename '{clean_name}', '{new_table}';"));
        lines.push("GO".to_string());
        lines.push(String::new());
        warnings.push(format!(
            "Table rename: {clean_name} -> {new_table}. Update all references (views, SPs, code) accordingly."
        ));
    }

    let columns = extract_column_names(content);
    let matching_columns: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|column| rule.match_count(column) > 0)
        .collect();

    if !matching_columns.is_empty() {
        // Column renames must target the post-rename table name
        let effective_table = if table_renamed {
            match clean_name.rsplit_once('.') {
                Some((schema, _)) => format!("{schema}.{}", rule.apply(object_short).0),
                None => rule.apply(clean_name).0.into_owned(),
            }
        } else {
            clean_name.to_string()
        };

        lines.push(format!("-- Rename columns containing '{search}'"));
        for column in &matching_columns {
            let new_column = rule.apply(column).0;
            lines.push(format!(
                "EXEC sp_rename '{effective_table}.{column}', '{new_column}', 'COLUMN';"
            ));
            lines.push("GO".to_string());
        }
        lines.push(String::new());
    }

    let constraints = extract_constraint_names(content);
    let matching_constraints: Vec<&str> = constraints
        .iter()
        .map(String::as_str)
        .filter(|name| rule.match_count(name) > 0)
        .collect();

    if !matching_constraints.is_empty() {
        lines.push(format!("-- Rename constraints/indexes containing '{search}'"));
        for name in &matching_constraints {
            let new_name = rule.apply(name).0;
            lines.push(format!("EXEC sp_rename '{name}', '{new_name}', 'OBJECT';"));
            lines.push("GO".to_string());
        }
        lines.push(String::new());
        warnings.push(format!(
            "Found {} constraint(s)/index(es) referencing the keyword.",
            matching_constraints.len()
        ));
    }

    if !table_renamed && matching_columns.is_empty() && matching_constraints.is_empty() {
        lines.push(format!(
            "-- No table/column/constraint names found matching '{search}'."
        ));
        lines.push("-- The keyword may appear in comments or default values only.".to_string());
        lines.push("-- Review the file manually if needed.".to_string());
    }
}

#[allow(clippy::too_many_arguments)]
fn table_type_script(
    lines: &mut Vec<String>,
    warnings: &mut Vec<String>,
    content: &str,
    clean_name: &str,
    object_short: &str,
    search: &str,
    replace: &str,
    rule: &CompiledRule,
) {
    header(lines, "TABLE TYPE", clean_name, search, replace, "sp_rename (preserves type)");

    let type_renamed = rule.match_count(object_short) > 0;
    if type_renamed {
        let new_type = rule.apply(object_short).0;
        lines.push("-- Rename the table type".to_string());
        lines.push(format!("EXEC sp_rename '{clean_name}', '{new_type}', 'USERDATATYPE';"));
        lines.push("GO".to_string());
        lines.push(String::new());
        warnings.push(format!(
            "Table type rename: {clean_name} -> {new_type}. Update all SP parameters referencing this type."
        ));
    }

    let columns = extract_column_names(content);
    let has_matching_columns = columns.iter().any(|column| rule.match_count(column) > 0);

    if has_matching_columns {
        lines.push("-- Table Types do NOT support column rename via sp_rename.".to_string());
        lines.push("-- You must DROP and re-CREATE the type to rename columns.".to_string());
        lines.push("-- Below is the re-created type with replacements applied:".to_string());
        lines.push(String::new());
        lines.push("-- First, check dependencies:".to_string());
        lines.push(format!(
            "-- SELECT * FROM sys.dm_sql_referencing_entities('{clean_name}', 'TYPE');"
        ));
        lines.push(String::new());
        lines.push(format!("-- DROP TYPE {clean_name};"));
        lines.push("-- GO".to_string());
        lines.push(String::new());
        let recreated = rule.apply(content).0;
        lines.push(recreated.trim().to_string());
        lines.push("GO".to_string());
        warnings.push(
            "Table type column rename requires DROP/CREATE. Check dependencies first!".to_string(),
        );
    }

    if !type_renamed && !has_matching_columns {
        lines.push(format!("-- No type/column names found matching '{search}'."));
        lines.push("-- Review the file manually if needed.".to_string());
    }
}

#[allow(clippy::too_many_arguments)]
fn routine_script(
    lines: &mut Vec<String>,
    content: &str,
    clean_name: &str,
    search: &str,
    replace: &str,
    rule: &CompiledRule,
    label: &str,
    strategy: &str,
    keywords: &[&str],
) {
    header(lines, label, clean_name, search, replace, strategy);

    let mut body = content.to_string();
    for keyword in keywords {
        body = replace_create_with_alter(&body, keyword);
    }
    let renamed = rule.apply(&body).0;
    lines.push(renamed.trim().to_string());
    lines.push("GO".to_string());
}

// Both substitutions run: "CREATE OR ALTER X" collapses first, then the
// first remaining plain "CREATE X" is rewritten. Keyword order matters for
// procedures (PROCEDURE before PROC, or the prefix would match first).
fn replace_create_with_alter(content: &str, keyword: &str) -> String {
    let replacement = format!("ALTER {keyword}");
    let or_alter = super::ddl_regex(&format!(r"CREATE\s+OR\s+ALTER\s+{keyword}"));
    let collapsed = or_alter.replacen(content, 1, replacement.as_str());
    let create = super::ddl_regex(&format!(r"CREATE\s+{keyword}"));
    create
        .replacen(&collapsed, 1, replacement.as_str())
        .into_owned()
}
