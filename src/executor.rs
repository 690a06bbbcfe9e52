//! Rule execution against selected files, with backups and tracking.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{Result, RewordError};
use crate::matcher::{self, ContextMatch};
use crate::rule::Rule;
use crate::scanner::file_extension;

/// What to do when a backup cannot be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Log a warning and write anyway.
    #[default]
    BestEffort,
    /// Fail the file before anything is written.
    Required,
}

/// One recorded occurrence that a rule replaced, for audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEntry {
    pub file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
    pub line_number: usize,
    pub original_text: String,
    pub replacement_text: String,
    pub context_snippet: String,
}

impl TrackingEntry {
    fn from_context(context: ContextMatch, rule_id: Option<i64>, path: &Path) -> Self {
        Self {
            file_path: path.to_path_buf(),
            rule_id,
            line_number: context.line_number,
            original_text: context.original_text,
            replacement_text: context.replacement_text,
            context_snippet: context.context_snippet,
        }
    }
}

/// The outcome of executing a rule set against one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileExecutionResult {
    pub file_path: PathBuf,
    pub success: bool,
    pub replacements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    /// Hex SHA-256 of the file's bytes before modification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tracking: Vec<TrackingEntry>,
}

impl FileExecutionResult {
    fn new(path: &Path) -> Self {
        Self {
            file_path: path.to_path_buf(),
            success: false,
            replacements: 0,
            backup_path: None,
            original_hash: None,
            error: None,
            tracking: Vec::new(),
        }
    }
}

/// Aggregate outcome of a batch execution.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub total_files: usize,
    pub files_modified: usize,
    pub total_replacements: usize,
    pub files: Vec<FileExecutionResult>,
    pub errors: Vec<String>,
}

impl BatchResult {
    fn new(total_files: usize) -> Self {
        Self {
            total_files,
            files_modified: 0,
            total_replacements: 0,
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// All tracking entries across the batch, in execution order.
    pub fn tracking(&self) -> impl Iterator<Item = &TrackingEntry> {
        self.files.iter().flat_map(|file| file.tracking.iter())
    }
}

/// Applies rule sets to files: backup, replace, write, track.
///
/// Rules are applied in order, each seeing the previous rule's output.
/// Files that match nothing are left untouched (no write, no backup).
#[derive(Debug, Clone)]
pub struct RefactorExecutor {
    create_backups: bool,
    backup_policy: BackupPolicy,
    context_lines: usize,
}

impl Default for RefactorExecutor {
    fn default() -> Self {
        Self {
            create_backups: true,
            backup_policy: BackupPolicy::BestEffort,
            context_lines: 1,
        }
    }
}

impl RefactorExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable `.bak` creation before writes.
    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.create_backups = enabled;
        self
    }

    pub fn with_backup_policy(mut self, policy: BackupPolicy) -> Self {
        self.backup_policy = policy;
        self
    }

    /// Lines of context recorded around each tracked occurrence.
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Apply every applicable rule to one file.
    ///
    /// Never panics and never returns an error: failures are recorded in
    /// the result so a batch can keep going. Tracking entries collected
    /// before a failure are kept; the replacement count stays zero unless
    /// the modified content was actually written.
    pub fn execute_file(&self, path: &Path, rules: &[Rule]) -> FileExecutionResult {
        let mut result = FileExecutionResult::new(path);

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                result.error = Some(
                    RewordError::FileRead {
                        path: path.to_path_buf(),
                        source,
                    }
                    .to_string(),
                );
                return result;
            }
        };
        result.original_hash = Some(content_fingerprint(&bytes));

        let extension = file_extension(path);
        let mut content = String::from_utf8_lossy(&bytes).into_owned();
        let mut total = 0;

        for rule in rules {
            if !rule.applies_to(&extension) {
                continue;
            }
            // Tracking is collected against the content this rule actually
            // sees, i.e. after earlier rules have been applied.
            match matcher::find_matches_with_context(&content, rule, self.context_lines) {
                Ok(contexts) => {
                    result.tracking.extend(
                        contexts
                            .into_iter()
                            .map(|ctx| TrackingEntry::from_context(ctx, rule.rule_id, path)),
                    );
                }
                Err(err) => {
                    result.error = Some(err.to_string());
                    return result;
                }
            }
            match matcher::apply_replacement(&content, rule) {
                Ok((next, count)) => {
                    if count > 0 {
                        content = next;
                        total += count;
                    }
                }
                Err(err) => {
                    result.error = Some(err.to_string());
                    return result;
                }
            }
        }

        if total == 0 {
            result.success = true;
            return result;
        }

        if self.create_backups {
            match create_backup(path) {
                Ok(backup) => result.backup_path = Some(backup),
                Err(source) => {
                    let err = RewordError::BackupFailed {
                        path: path.to_path_buf(),
                        source,
                    };
                    match self.backup_policy {
                        BackupPolicy::Required => {
                            result.error = Some(err.to_string());
                            return result;
                        }
                        BackupPolicy::BestEffort => {
                            warn!("{err}, writing without a backup");
                        }
                    }
                }
            }
        }

        if let Err(source) = fs::write(path, content.as_bytes()) {
            result.error = Some(
                RewordError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                }
                .to_string(),
            );
            return result;
        }

        result.replacements = total;
        result.success = true;
        result
    }

    /// Apply rules to every file in the list, isolating per-file failures.
    ///
    /// Rejects empty input up front: an empty file list or rule set returns
    /// an error before any file is touched.
    pub fn execute_batch(&self, paths: &[PathBuf], rules: &[Rule]) -> Result<BatchResult> {
        if paths.is_empty() {
            return Err(RewordError::NoFilesSelected);
        }
        if rules.is_empty() {
            return Err(RewordError::NoRules);
        }

        let mut batch = BatchResult::new(paths.len());
        for path in paths {
            let result = self.execute_file(path, rules);
            if result.success && result.replacements > 0 {
                batch.files_modified += 1;
                batch.total_replacements += result.replacements;
            }
            if let Some(err) = &result.error {
                batch.errors.push(format!("{}: {err}", path.display()));
            }
            batch.files.push(result);
        }
        Ok(batch)
    }
}

/// The fixed backup location for a file: `<path>.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

fn create_backup(path: &Path) -> io::Result<PathBuf> {
    let backup = backup_path(path);
    fs::copy(path, &backup)?;
    Ok(backup)
}

/// Copy `<path>.bak` back over `<path>`. Returns `false` when no backup
/// exists or the copy fails.
pub fn restore_from_backup(path: &Path) -> bool {
    let backup = backup_path(path);
    if !backup.exists() {
        return false;
    }
    fs::copy(&backup, path).is_ok()
}

/// Delete `.bak` files under `dir`, returning how many were removed.
///
/// Non-recursive cleanup only touches the directory's immediate children.
pub fn cleanup_backups(dir: &Path, recursive: bool) -> usize {
    let mut removed = 0;
    if recursive {
        for entry in WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(".bak")
                && fs::remove_file(entry.path()).is_ok()
            {
                removed += 1;
            }
        }
    } else {
        let Ok(entries) = fs::read_dir(dir) else {
            return 0;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file()
                && entry.file_name().to_string_lossy().ends_with(".bak")
                && fs::remove_file(&path).is_ok()
            {
                removed += 1;
            }
        }
    }
    removed
}

/// Hex-encoded SHA-256 of raw content bytes.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_fingerprint_known_vector() {
        assert_eq!(
            content_fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_execute_file_replaces_backs_up_and_tracks() {
        let dir = TempDir::new().unwrap();
        let original = "public int CNIC_Number;\nCNIC_Number = 5;";
        let path = write_file(&dir, "Person.cs", original);

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.replacements, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "public int NationalID_Number;\nNationalID_Number = 5;"
        );
        assert_eq!(
            result.original_hash.as_deref(),
            Some(content_fingerprint(original.as_bytes()).as_str())
        );

        let backup = result.backup_path.unwrap();
        assert_eq!(backup, backup_path(&path));
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);

        assert_eq!(result.tracking.len(), 2);
        assert_eq!(result.tracking[0].line_number, 1);
        assert_eq!(result.tracking[1].line_number, 2);
        assert_eq!(result.tracking[0].file_path, path);
    }

    #[test]
    fn test_untouched_file_gets_no_backup_or_write() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "clean.cs", "nothing to see");

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert!(result.success);
        assert_eq!(result.replacements, 0);
        assert!(result.backup_path.is_none());
        assert!(!backup_path(&path).exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "nothing to see");
    }

    #[test]
    fn test_rules_chain_in_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "chain.cs", "alpha");

        let rules = vec![Rule::literal("alpha", "beta"), Rule::literal("beta", "gamma")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert_eq!(result.replacements, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "gamma");
        // the second rule tracked the first rule's output
        assert_eq!(result.tracking[0].original_text, "alpha");
        assert_eq!(result.tracking[1].original_text, "beta");
    }

    #[test]
    fn test_rule_skipped_for_untargeted_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "query.sql", "SELECT CNIC FROM people");

        let rules = vec![Rule::literal("CNIC", "NationalID").with_extensions(".cs")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert!(result.success);
        assert_eq!(result.replacements, 0);
        assert!(result.tracking.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "SELECT CNIC FROM people");
    }

    #[test]
    fn test_invalid_regex_fails_the_file_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "code.cs", "content");

        let rules = vec![Rule::regex("[unclosed", "x")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Invalid pattern"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_batch_isolates_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let first = write_file(&dir, "one.cs", "CNIC here");
        let missing = dir.path().join("two.cs");
        let third = write_file(&dir, "three.cs", "CNIC there");

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let paths = vec![first.clone(), missing, third.clone()];
        let batch = RefactorExecutor::new().execute_batch(&paths, &rules).unwrap();

        assert_eq!(batch.total_files, 3);
        assert_eq!(batch.files.len(), 3);
        assert_eq!(batch.files_modified, 2);
        assert_eq!(batch.total_replacements, 2);
        assert_eq!(batch.errors.len(), 1);
        assert!(batch.errors[0].contains("two.cs"));
        assert!(fs::read_to_string(&first).unwrap().contains("NationalID"));
        assert!(fs::read_to_string(&third).unwrap().contains("NationalID"));
        assert_eq!(batch.tracking().count(), 2);
    }

    #[test]
    fn test_batch_rejects_empty_input() {
        let executor = RefactorExecutor::new();
        let rules = vec![Rule::literal("a", "b")];

        let err = executor.execute_batch(&[], &rules).unwrap_err();
        assert!(matches!(err, RewordError::NoFilesSelected));

        let err = executor
            .execute_batch(&[PathBuf::from("whatever.cs")], &[])
            .unwrap_err();
        assert!(matches!(err, RewordError::NoRules));
    }

    #[test]
    fn test_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let original = "id = CNIC;";
        let path = write_file(&dir, "restore.cs", original);

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);
        assert_eq!(result.replacements, 1);
        assert_ne!(fs::read_to_string(&path).unwrap(), original);

        assert!(restore_from_backup(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_restore_without_backup_returns_false() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "never_executed.cs", "content");
        assert!(!restore_from_backup(&path));
    }

    #[test]
    fn test_backup_is_overwritten_per_execution() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "gen.cs", "aa");

        let executor = RefactorExecutor::new();
        executor.execute_file(&path, &[Rule::literal("aa", "bb")]);
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "aa");

        executor.execute_file(&path, &[Rule::literal("bb", "cc")]);
        // only one generation: the first pre-image is gone
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "bb");
        assert_eq!(fs::read_to_string(&path).unwrap(), "cc");
    }

    #[test]
    fn test_best_effort_backup_failure_still_writes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "file.cs", "CNIC");
        // occupy the backup location so fs::copy fails
        fs::create_dir(backup_path(&path)).unwrap();

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new().execute_file(&path, &rules);

        assert!(result.success);
        assert!(result.backup_path.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "NationalID");
    }

    #[test]
    fn test_required_backup_failure_fails_closed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "file.cs", "CNIC");
        fs::create_dir(backup_path(&path)).unwrap();

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new()
            .with_backup_policy(BackupPolicy::Required)
            .execute_file(&path, &rules);

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("back up"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "CNIC");
    }

    #[test]
    fn test_backups_disabled() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "file.cs", "CNIC");

        let rules = vec![Rule::literal("CNIC", "NationalID")];
        let result = RefactorExecutor::new()
            .with_backups(false)
            .execute_file(&path, &rules);

        assert!(result.success);
        assert!(result.backup_path.is_none());
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_cleanup_backups_flat_and_recursive() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.cs.bak", "x");
        write_file(&dir, "keep.cs", "x");
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.sql.bak"), "x").unwrap();

        assert_eq!(cleanup_backups(dir.path(), false), 1);
        assert!(dir.path().join("nested/b.sql.bak").exists());
        assert!(dir.path().join("keep.cs").exists());

        assert_eq!(cleanup_backups(dir.path(), true), 1);
        assert!(!dir.path().join("nested/b.sql.bak").exists());
    }

    #[test]
    fn test_cleanup_on_missing_dir_removes_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_backups(&dir.path().join("absent"), false), 0);
    }
}
