//! SQL DDL analysis: object-kind detection and name extraction.
//!
//! Plain-text replacement is not enough for SQL rename work: renaming a
//! table column safely needs `sp_rename`, and editing a view or procedure
//! in place would lose permissions that `ALTER` preserves. This module
//! classifies a DDL file and pulls out the identifiers the script
//! generator in [`alter`] needs.

mod alter;

pub use alter::{AlterScript, generate_alter_script};

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

fn ddl_regex(pattern: &str) -> Regex {
    match RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
    {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

/// The kind of SQL object a DDL file defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlObjectKind {
    Table,
    TableType,
    View,
    StoredProcedure,
    Function,
    Unknown,
}

impl SqlObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlObjectKind::Table => "TABLE",
            SqlObjectKind::TableType => "TABLE_TYPE",
            SqlObjectKind::View => "VIEW",
            SqlObjectKind::StoredProcedure => "STORED_PROCEDURE",
            SqlObjectKind::Function => "FUNCTION",
            SqlObjectKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SqlObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlObjectKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_uppercase().replace('-', "_").as_str() {
            "TABLE" => Ok(SqlObjectKind::Table),
            "TABLE_TYPE" | "TYPE" => Ok(SqlObjectKind::TableType),
            "VIEW" => Ok(SqlObjectKind::View),
            "STORED_PROCEDURE" | "PROCEDURE" | "PROC" => Ok(SqlObjectKind::StoredProcedure),
            "FUNCTION" => Ok(SqlObjectKind::Function),
            "UNKNOWN" => Ok(SqlObjectKind::Unknown),
            other => Err(format!("unrecognized SQL object kind: {other}")),
        }
    }
}

// Ordered by specificity. TABLE must come last: "CREATE TYPE ... AS TABLE"
// and procedure bodies both contain the TABLE keyword.
static DETECTION_PATTERNS: LazyLock<Vec<(Regex, SqlObjectKind)>> = LazyLock::new(|| {
    vec![
        (ddl_regex(r"CREATE\s+TYPE\s+"), SqlObjectKind::TableType),
        (ddl_regex(r"(?:CREATE|ALTER)\s+VIEW\s+"), SqlObjectKind::View),
        (
            ddl_regex(r"(?:CREATE|ALTER)\s+(?:PROCEDURE|PROC)\s+"),
            SqlObjectKind::StoredProcedure,
        ),
        (
            ddl_regex(r"(?:CREATE|ALTER)\s+FUNCTION\s+"),
            SqlObjectKind::Function,
        ),
        (ddl_regex(r"CREATE\s+TABLE\s+"), SqlObjectKind::Table),
    ]
});

static NAME_PATTERNS: LazyLock<Vec<(SqlObjectKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            SqlObjectKind::Table,
            ddl_regex(r"CREATE\s+TABLE\s+([\[\].\w]+)"),
        ),
        (
            SqlObjectKind::TableType,
            ddl_regex(r"CREATE\s+TYPE\s+([\[\].\w]+)"),
        ),
        (
            SqlObjectKind::View,
            ddl_regex(r"(?:CREATE|ALTER)\s+VIEW\s+([\[\].\w]+)"),
        ),
        (
            SqlObjectKind::StoredProcedure,
            ddl_regex(r"(?:CREATE|ALTER)\s+(?:PROCEDURE|PROC)\s+([\[\].\w]+)"),
        ),
        (
            SqlObjectKind::Function,
            ddl_regex(r"(?:CREATE|ALTER)\s+FUNCTION\s+([\[\].\w]+)"),
        ),
    ]
});

static PAREN_NEWLINE: LazyLock<Regex> = LazyLock::new(|| ddl_regex(r"\(\s*\n"));

static COLUMN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    ddl_regex(
        r"^\s*[\[@]?(\w+)\]?\s+(?:INT|BIGINT|SMALLINT|TINYINT|BIT|DECIMAL|NUMERIC|FLOAT|REAL|MONEY|SMALLMONEY|DATE|DATETIME|DATETIME2|DATETIMEOFFSET|SMALLDATETIME|TIME|CHAR|VARCHAR|NCHAR|NVARCHAR|TEXT|NTEXT|BINARY|VARBINARY|IMAGE|UNIQUEIDENTIFIER|XML|SQL_VARIANT|HIERARCHYID|GEOGRAPHY|GEOMETRY|TABLE)",
    )
});

static CONSTRAINT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| ddl_regex(r"CONSTRAINT\s+([\[\].\w]+)"));
static INDEX_PATTERN: LazyLock<Regex> = LazyLock::new(|| ddl_regex(r"INDEX\s+([\[\].\w]+)"));

// Keywords that the column pattern can false-match on structural lines.
const COLUMN_STOPLIST: [&str; 28] = [
    "CONSTRAINT",
    "PRIMARY",
    "FOREIGN",
    "UNIQUE",
    "INDEX",
    "CHECK",
    "DEFAULT",
    "KEY",
    "REFERENCES",
    "CLUSTERED",
    "NONCLUSTERED",
    "ASC",
    "DESC",
    "WITH",
    "ON",
    "NOT",
    "NULL",
    "IDENTITY",
    "AS",
    "BEGIN",
    "END",
    "RETURN",
    "DECLARE",
    "SET",
    "IF",
    "ELSE",
    "WHILE",
    "GO",
];

/// Classify DDL content, falling back to filename heuristics when no DDL
/// statement matches.
pub fn detect_object_kind(content: &str, path: &Path) -> SqlObjectKind {
    for (pattern, kind) in DETECTION_PATTERNS.iter() {
        if pattern.is_match(content) {
            return *kind;
        }
    }

    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if basename.starts_with("sp") || basename.starts_with("usp") {
        return SqlObjectKind::StoredProcedure;
    }
    if basename.starts_with("vw") || basename.starts_with("view") {
        return SqlObjectKind::View;
    }
    if basename.starts_with("fn") || basename.starts_with("ufn") {
        return SqlObjectKind::Function;
    }
    if basename.starts_with("tbl") || basename.starts_with("table") {
        return SqlObjectKind::Table;
    }
    SqlObjectKind::Unknown
}

/// Extract the object name as written in the DDL, brackets included
/// (e.g. `[dbo].[Employee]`).
pub fn extract_object_name(content: &str, kind: SqlObjectKind) -> Option<String> {
    let pattern = NAME_PATTERNS
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, pattern)| pattern)?;
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
}

/// Remove SQL bracket quoting: `[dbo].[MyTable]` -> `dbo.MyTable`.
pub fn strip_brackets(name: &str) -> String {
    name.replace(['[', ']'], "")
}

/// The unqualified object name: `dbo.MyTable` -> `MyTable`.
pub fn short_name(name: &str) -> String {
    let stripped = strip_brackets(name);
    stripped
        .rsplit('.')
        .next()
        .map(str::to_string)
        .unwrap_or(stripped)
}

/// A classified DDL object with its normalized names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdlObject {
    pub kind: SqlObjectKind,
    /// Schema-qualified name with brackets stripped, or `""` if unresolved.
    pub qualified_name: String,
    pub short_name: String,
}

impl DdlObject {
    pub fn detect(content: &str, path: &Path) -> Self {
        let kind = detect_object_kind(content, path);
        match extract_object_name(content, kind) {
            Some(raw) => Self {
                kind,
                qualified_name: strip_brackets(&raw),
                short_name: short_name(&raw),
            },
            None => Self {
                kind,
                qualified_name: String::new(),
                short_name: String::new(),
            },
        }
    }
}

/// Column names from the first balanced parenthesis block of a CREATE
/// TABLE / CREATE TYPE definition.
///
/// A name counts as a column when the line starts with an identifier
/// (optionally bracketed or `@`-prefixed) followed by a known data type.
/// Structural keywords like `CONSTRAINT` or `PRIMARY` are filtered out.
pub fn extract_column_names(content: &str) -> Vec<String> {
    let Some(block) = first_paren_block(content) else {
        return Vec::new();
    };
    COLUMN_PATTERN
        .captures_iter(block)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
        .filter(|name| !COLUMN_STOPLIST.contains(&name.to_uppercase().as_str()))
        .collect()
}

/// Named constraints and indexes, brackets stripped.
pub fn extract_constraint_names(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    for pattern in [&*CONSTRAINT_PATTERN, &*INDEX_PATTERN] {
        for caps in pattern.captures_iter(content) {
            if let Some(name) = caps.get(1) {
                names.push(strip_brackets(name.as_str()));
            }
        }
    }
    names
}

// Prefers an opening paren followed by a newline (the usual DDL layout) so
// that e.g. a parenthesized default earlier on the header line does not win.
// Depth tracking keeps nested parens like DECIMAL(18,2) inside the block.
fn first_paren_block(content: &str) -> Option<&str> {
    let start = PAREN_NEWLINE
        .find(content)
        .map(|found| found.end())
        .or_else(|| content.find('(').map(|index| index + 1))?;

    let mut depth = 1usize;
    for (index, ch) in content[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + index]);
                }
            }
            _ => {}
        }
    }
    // unbalanced parens: treat the block as empty rather than guessing
    Some("")
}
