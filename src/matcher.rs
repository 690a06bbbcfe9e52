//! Pattern matching and replacement over file content.

use std::borrow::Cow;
use std::collections::HashSet;

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::debug;

use crate::error::{Result, RewordError};
use crate::rule::Rule;

/// A single occurrence of a pattern: byte offsets plus the matched text as
/// it appears in the content (original casing preserved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A located match with its 1-indexed line number and surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMatch {
    pub line_number: usize,
    pub original_text: String,
    pub replacement_text: String,
    pub context_snippet: String,
}

/// Find all non-overlapping occurrences of `pattern` in `content`.
///
/// Literal matches are greedy left-to-right: each hit advances the cursor
/// past the full pattern, so `"aa"` occurs twice in `"aaaa"`, never three
/// times. An empty or all-whitespace pattern never matches anything.
pub fn find_matches(
    content: &str,
    pattern: &str,
    is_regex: bool,
    case_sensitive: bool,
) -> Result<Vec<Match>> {
    if pattern.trim().is_empty() {
        return Ok(Vec::new());
    }
    if is_regex {
        let re = build_regex(pattern, case_sensitive)?;
        return Ok(collect_matches(&re, content));
    }
    if case_sensitive {
        let mut matches = Vec::new();
        let mut from = 0;
        while let Some(found) = content[from..].find(pattern) {
            let start = from + found;
            let end = start + pattern.len();
            matches.push(Match {
                start,
                end,
                text: content[start..end].to_string(),
            });
            from = end;
        }
        return Ok(matches);
    }
    let re = insensitive_literal(pattern)?;
    Ok(collect_matches(&re, content))
}

/// Apply a rule to `content`, returning the new content and the number of
/// replacements made. The count always equals `find_matches(..).len()` for
/// the same inputs.
///
/// Regex replacements support `$n` capture references; literal replacements
/// are inserted verbatim.
pub fn apply_replacement(content: &str, rule: &Rule) -> Result<(String, usize)> {
    if rule.search_pattern.trim().is_empty() {
        return Ok((content.to_string(), 0));
    }
    if rule.is_regex {
        let re = build_regex(&rule.search_pattern, rule.case_sensitive)?;
        let count = re.find_iter(content).count();
        if count == 0 {
            return Ok((content.to_string(), 0));
        }
        let replaced = re
            .replace_all(content, rule.replacement_text.as_str())
            .into_owned();
        return Ok((replaced, count));
    }
    if rule.case_sensitive {
        let count = content.matches(rule.search_pattern.as_str()).count();
        if count == 0 {
            return Ok((content.to_string(), 0));
        }
        return Ok((
            content.replace(&rule.search_pattern, &rule.replacement_text),
            count,
        ));
    }
    let re = insensitive_literal(&rule.search_pattern)?;
    let count = re.find_iter(content).count();
    if count == 0 {
        return Ok((content.to_string(), 0));
    }
    let replaced = re
        .replace_all(content, NoExpand(&rule.replacement_text))
        .into_owned();
    Ok((replaced, count))
}

/// Locate every occurrence of a rule's pattern together with its line
/// number and a snippet of `context_lines` lines either side.
///
/// Line numbers are 1-indexed. Context windows clip at the first and last
/// line instead of wrapping or erroring.
pub fn find_matches_with_context(
    content: &str,
    rule: &Rule,
    context_lines: usize,
) -> Result<Vec<ContextMatch>> {
    let matches = find_matches(
        content,
        &rule.search_pattern,
        rule.is_regex,
        rule.case_sensitive,
    )?;
    if matches.is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let mut line_starts = Vec::with_capacity(lines.len());
    let mut offset = 0;
    for line in &lines {
        line_starts.push(offset);
        offset += line.len() + 1;
    }

    let located = matches
        .into_iter()
        .map(|m| {
            // line_starts[0] == 0, so partition_point is always >= 1
            let line = line_starts.partition_point(|&start| start <= m.start) - 1;
            let from = line.saturating_sub(context_lines);
            let to = (line + context_lines + 1).min(lines.len());
            ContextMatch {
                line_number: line + 1,
                original_text: m.text,
                replacement_text: rule.replacement_text.clone(),
                context_snippet: lines[from..to].join("\n"),
            }
        })
        .collect();
    Ok(located)
}

/// A rule compiled once for repeated application across many files.
///
/// Compilation never fails: a malformed or blank pattern produces a rule
/// that matches nothing, so scan paths degrade instead of aborting.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    search: String,
    replacement: String,
    pattern: CompiledPattern,
    targets: Option<HashSet<String>>,
    rule_id: Option<i64>,
}

#[derive(Debug, Clone)]
enum CompiledPattern {
    /// Case-sensitive literal, matched with `str::find`.
    Literal,
    /// Case-insensitive literal, compiled from the escaped pattern.
    Insensitive(Regex),
    /// User-supplied regex.
    Pattern(Regex),
    /// Blank or malformed pattern; matches nothing.
    Inert,
}

impl CompiledRule {
    pub fn compile(rule: &Rule) -> Self {
        let pattern = if rule.search_pattern.trim().is_empty() {
            CompiledPattern::Inert
        } else if rule.is_regex {
            match build_regex(&rule.search_pattern, rule.case_sensitive) {
                Ok(re) => CompiledPattern::Pattern(re),
                Err(err) => {
                    debug!("rule pattern failed to compile, skipping: {err}");
                    CompiledPattern::Inert
                }
            }
        } else if rule.case_sensitive {
            CompiledPattern::Literal
        } else {
            match insensitive_literal(&rule.search_pattern) {
                Ok(re) => CompiledPattern::Insensitive(re),
                Err(err) => {
                    debug!("rule pattern failed to compile, skipping: {err}");
                    CompiledPattern::Inert
                }
            }
        };
        Self {
            search: rule.search_pattern.clone(),
            replacement: rule.replacement_text.clone(),
            pattern,
            targets: rule.target_extension_set(),
            rule_id: rule.rule_id,
        }
    }

    /// Whether this rule applies to a file with the given normalized extension.
    pub fn applies_to(&self, extension: &str) -> bool {
        match &self.targets {
            Some(targets) => targets.contains(extension),
            None => true,
        }
    }

    /// Apply the rule, borrowing the input when nothing matched.
    pub fn apply<'a>(&self, content: &'a str) -> (Cow<'a, str>, usize) {
        match &self.pattern {
            CompiledPattern::Literal => {
                let count = content.matches(self.search.as_str()).count();
                if count == 0 {
                    (Cow::Borrowed(content), 0)
                } else {
                    (
                        Cow::Owned(content.replace(&self.search, &self.replacement)),
                        count,
                    )
                }
            }
            CompiledPattern::Insensitive(re) => {
                let count = re.find_iter(content).count();
                if count == 0 {
                    (Cow::Borrowed(content), 0)
                } else {
                    (re.replace_all(content, NoExpand(&self.replacement)), count)
                }
            }
            CompiledPattern::Pattern(re) => {
                let count = re.find_iter(content).count();
                if count == 0 {
                    (Cow::Borrowed(content), 0)
                } else {
                    (re.replace_all(content, self.replacement.as_str()), count)
                }
            }
            CompiledPattern::Inert => (Cow::Borrowed(content), 0),
        }
    }

    /// Count occurrences without building the replacement.
    pub fn match_count(&self, content: &str) -> usize {
        match &self.pattern {
            CompiledPattern::Literal => content.matches(self.search.as_str()).count(),
            CompiledPattern::Insensitive(re) | CompiledPattern::Pattern(re) => {
                re.find_iter(content).count()
            }
            CompiledPattern::Inert => 0,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn rule_id(&self) -> Option<i64> {
        self.rule_id
    }
}

fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| RewordError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}

fn insensitive_literal(pattern: &str) -> Result<Regex> {
    build_regex(&regex::escape(pattern), false)
}

fn collect_matches(re: &Regex, content: &str) -> Vec<Match> {
    re.find_iter(content)
        .map(|m| Match {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        })
        .collect()
}
