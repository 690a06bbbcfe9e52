//! # Reword
//!
//! Bulk, rule-driven find/replace for legacy source trees, built for
//! compliance-style renames that touch hundreds of files at once.
//!
//! This crate provides:
//! - Filtered directory scanning with extension and folder excludes
//! - Literal, case-insensitive, and regex replacement rules
//! - A streaming scanner that emits progress, per-file diffs, and errors
//! - Batch execution with `.bak` backups, tracking entries, and restore
//! - Deep search: naming-convention variant expansion with previews
//! - SQL DDL analysis and ALTER/sp_rename script generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reword::prelude::*;
//!
//! // Rename CNIC to Aadhaar across a legacy tree
//! let scanner = PathScanner::default();
//! let files: Vec<_> = scanner.scan(std::path::Path::new("./legacy-app")).collect();
//!
//! let rule = Rule::literal("CNIC", "Aadhaar");
//! let batch = RefactorExecutor::default().execute_batch(&files, &[rule])?;
//!
//! println!(
//!     "{} replacements in {} files",
//!     batch.total_replacements, batch.files_modified
//! );
//! # Ok::<(), reword::error::RewordError>(())
//! ```
//!
//! ## Streaming Scan
//!
//! ```rust,no_run
//! use reword::prelude::*;
//! use std::path::PathBuf;
//!
//! // Emit one JSON line per event, diffs included
//! let rules = vec![Rule::regex(r"\bCNIC\b", "Aadhaar")];
//! let roots = vec![PathBuf::from("./src"), PathBuf::from("./db")];
//!
//! for event in scan_with_rules(&roots, &rules, &PathScanner::default()) {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! # Ok::<(), reword::error::RewordError>(())
//! ```
//!
//! ## Deep Search
//!
//! ```rust,no_run
//! use reword::prelude::*;
//!
//! // Expand one rename into its naming-convention variants
//! for variant in generate_variants("CNICNumber", "AadhaarNumber") {
//!     println!("{} -> {} ({})", variant.original, variant.replacement, variant.category);
//! }
//! ```
//!
//! ## SQL Rename Scripts
//!
//! ```rust,no_run
//! use reword::prelude::*;
//! use std::path::Path;
//!
//! let path = Path::new("db/Employee.sql");
//! let ddl = std::fs::read_to_string(path)?;
//!
//! let script = generate_alter_script(&ddl, None, "CNIC", "Aadhaar", path);
//! println!("{}", script.script);
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod diff;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod rule;
pub mod scanner;
pub mod sql;
pub mod stream;
pub mod variants;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diff::{DiffLine, DiffLineKind, FileDiff, generate_diff};
    pub use crate::error::{Result, RewordError};
    pub use crate::executor::{
        BackupPolicy, BatchResult, FileExecutionResult, RefactorExecutor, TrackingEntry,
        backup_path, cleanup_backups, content_fingerprint, restore_from_backup,
    };
    pub use crate::matcher::{
        CompiledRule, ContextMatch, Match, apply_replacement, find_matches,
        find_matches_with_context,
    };
    pub use crate::rule::{Rule, RuleFile, load_rules, normalize_extension};
    pub use crate::scanner::{
        ALWAYS_EXCLUDED_FOLDERS, DEFAULT_EXCLUDE_EXTENSIONS, DEFAULT_EXCLUDE_FOLDERS,
        DEFAULT_INCLUDE_EXTENSIONS, PathScanner, ScanConfig, file_extension,
    };
    pub use crate::sql::{
        AlterScript, DdlObject, SqlObjectKind, detect_object_kind, generate_alter_script,
    };
    pub use crate::stream::{ScanEvent, ScanMatch, ScanStream, scan_with_rules};
    pub use crate::variants::{
        COMMON_PREFIXES, PatternPreview, PreviewFile, Variant, VariantCategory,
        generate_from_rules, generate_variants, preview_variants,
    };
}

pub use prelude::*;
