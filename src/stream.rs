//! Streamed scanning: progress, match, and error events.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::{FileDiff, generate_diff};
use crate::matcher::CompiledRule;
use crate::rule::Rule;
use crate::scanner::{PathScanner, file_extension};

const DIFF_CONTEXT_LINES: usize = 3;

/// One event in the scan protocol.
///
/// Serialized with a `type` tag (`progress` / `match` / `error`) so the
/// stream can be consumed as newline-delimited JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Emitted before a file is read, so consumers can show progress even
    /// when the file turns out to have no matches.
    Progress {
        scanned: usize,
        total: usize,
        current_file: String,
        full_path: PathBuf,
    },
    Match(ScanMatch),
    Error { message: String },
}

/// A file in which at least one rule matched, with a diff preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMatch {
    pub file_path: PathBuf,
    pub relative_path: PathBuf,
    pub project_root: PathBuf,
    pub match_count: usize,
    pub diff: FileDiff,
    /// Pre-selected for execution; consumers may toggle this off.
    pub selected: bool,
    pub extension: String,
}

/// Scan one or more roots with a rule set, yielding events lazily.
///
/// The file list is materialized up front so progress events carry a stable
/// total. Roots that are not directories are skipped. A file reachable from
/// more than one root is scanned once; duplicates still count toward the
/// total but produce no events.
pub fn scan_with_rules(roots: &[PathBuf], rules: &[Rule], scanner: &PathScanner) -> ScanStream {
    let mut files = Vec::new();
    for root in roots {
        for path in scanner.scan(root) {
            files.push((path, root.clone()));
        }
    }
    ScanStream {
        total: files.len(),
        files: files.into_iter(),
        scanned: 0,
        seen: HashSet::new(),
        rules: rules.iter().map(CompiledRule::compile).collect(),
        pending: None,
        failed: None,
        done: false,
    }
}

/// Pull-based scan iterator. Dropping it cancels the scan: files not yet
/// pulled are never read.
pub struct ScanStream {
    files: std::vec::IntoIter<(PathBuf, PathBuf)>,
    total: usize,
    scanned: usize,
    seen: HashSet<PathBuf>,
    rules: Vec<CompiledRule>,
    /// File announced by the last progress event, not yet inspected.
    pending: Option<(PathBuf, PathBuf)>,
    failed: Option<String>,
    done: bool,
}

impl ScanStream {
    /// A stream that yields a single error event, for callers whose
    /// pre-flight setup failed but who still speak the event protocol.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            files: Vec::new().into_iter(),
            total: 0,
            scanned: 0,
            seen: HashSet::new(),
            rules: Vec::new(),
            pending: None,
            failed: Some(message.into()),
            done: false,
        }
    }

    /// Total number of files the scan will announce, duplicates included.
    pub fn total(&self) -> usize {
        self.total
    }

    fn inspect(&self, path: &Path, root: &Path) -> Option<ScanEvent> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!("skipping unreadable file {}: {err}", path.display());
                return None;
            }
        };
        let original = String::from_utf8_lossy(&bytes).into_owned();
        let extension = file_extension(path);

        let mut content = original.clone();
        let mut match_count = 0;
        for rule in &self.rules {
            if !rule.applies_to(&extension) {
                continue;
            }
            let (next, count) = rule.apply(&content);
            if count > 0 {
                content = next.into_owned();
                match_count += count;
            }
        }
        if match_count == 0 {
            return None;
        }

        let diff = generate_diff(&original, &content, path, DIFF_CONTEXT_LINES);
        Some(ScanEvent::Match(ScanMatch {
            file_path: path.to_path_buf(),
            relative_path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
            project_root: root.to_path_buf(),
            match_count,
            diff,
            selected: true,
            extension,
        }))
    }
}

impl Iterator for ScanStream {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        if self.done {
            return None;
        }
        if let Some(message) = self.failed.take() {
            self.done = true;
            return Some(ScanEvent::Error { message });
        }
        loop {
            if let Some((path, root)) = self.pending.take()
                && let Some(event) = Self::inspect(self, &path, &root)
            {
                return Some(event);
            }
            let Some((path, root)) = self.files.next() else {
                self.done = true;
                return None;
            };
            self.scanned += 1;
            if !self.seen.insert(path.clone()) {
                continue;
            }
            let current_file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let event = ScanEvent::Progress {
                scanned: self.scanned,
                total: self.total,
                current_file,
                full_path: path.clone(),
            };
            self.pending = Some((path, root));
            return Some(event);
        }
    }
}
