//! Classified diff generation for previewing replacements.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::Path;

/// How a diff line should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// `--- a/...` / `+++ b/...` file header lines.
    Header,
    /// `@@ -l,n +l,n @@` hunk markers.
    HunkMarker,
    Addition,
    Removal,
    Context,
}

/// One rendered diff line: its kind plus the text including the sign prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub text: String,
}

/// A unified diff broken into classified lines, so consumers can render
/// each kind differently without re-parsing diff syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDiff {
    pub lines: Vec<DiffLine>,
}

impl FileDiff {
    /// Whether the diff contains any added or removed line.
    pub fn has_changes(&self) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line.kind, DiffLineKind::Addition | DiffLineKind::Removal))
    }

    pub fn additions(&self) -> usize {
        self.count(DiffLineKind::Addition)
    }

    pub fn removals(&self) -> usize {
        self.count(DiffLineKind::Removal)
    }

    fn count(&self, kind: DiffLineKind) -> usize {
        self.lines.iter().filter(|line| line.kind == kind).count()
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Generate a classified unified diff between two versions of a file.
///
/// Headers use the file's basename. Unchanged files produce header lines
/// and no hunks.
pub fn generate_diff(
    original: &str,
    modified: &str,
    path: &Path,
    context_lines: usize,
) -> FileDiff {
    let diff = TextDiff::from_lines(original, modified);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut lines = vec![
        DiffLine {
            kind: DiffLineKind::Header,
            text: format!("--- a/{name}"),
        },
        DiffLine {
            kind: DiffLineKind::Header,
            text: format!("+++ b/{name}"),
        },
    ];

    for group in diff.grouped_ops(context_lines) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let old_len = last.old_range().end - old_start;
        let new_start = first.new_range().start;
        let new_len = last.new_range().end - new_start;
        lines.push(DiffLine {
            kind: DiffLineKind::HunkMarker,
            text: format!(
                "@@ -{},{} +{},{} @@",
                old_start + 1,
                old_len,
                new_start + 1,
                new_len
            ),
        });

        for op in &group {
            for change in diff.iter_changes(op) {
                let (kind, sign) = match change.tag() {
                    ChangeTag::Delete => (DiffLineKind::Removal, '-'),
                    ChangeTag::Insert => (DiffLineKind::Addition, '+'),
                    ChangeTag::Equal => (DiffLineKind::Context, ' '),
                };
                let value = change.value();
                let value = value.strip_suffix('\n').unwrap_or(value);
                let value = value.strip_suffix('\r').unwrap_or(value);
                lines.push(DiffLine {
                    kind,
                    text: format!("{sign}{value}"),
                });
            }
        }
    }

    FileDiff { lines }
}
