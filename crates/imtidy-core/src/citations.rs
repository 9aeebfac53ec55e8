//! Citation key extraction from LaTeX sources
//!
//! Recognizes `\cite{...}`, `\citep{...}`, `\nocite{...}` and `\nocitep{...}`.
//! An unescaped `%` starts a line comment; citations inside comments are
//! not extracted. Arguments starting with `*` (as in `\nocite{*}`) are not
//! citation lists.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use crate::error::{Result, TidyError};

/// The set of keys cited by a group of documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationSet {
    keys: BTreeSet<String>,
}

impl CitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key as written in the source
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Exact membership
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Membership ignoring case
    pub fn contains_ignore_case(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.keys.iter().any(|k| k.to_lowercase() == key)
    }

    /// All keys, lower-cased
    pub fn lowercased(&self) -> HashSet<String> {
        self.keys.iter().map(|k| k.to_lowercase()).collect()
    }

    /// Keys in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CitationSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for CitationSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.keys.extend(iter.into_iter().map(Into::into));
    }
}

/// Read every file and collect the keys they cite.
///
/// A file that cannot be read (missing, permission, not UTF-8) aborts the
/// scan.
pub fn find_citations<P: AsRef<Path>>(paths: &[P]) -> Result<CitationSet> {
    let mut citations = CitationSet::new();

    for path in paths {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| TidyError::io(path, e))?;
        let keys = extract_citations(&content);
        tracing::debug!("{} citation keys in {:?}", keys.len(), path);
        citations.extend(keys);
    }

    Ok(citations)
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InComment,
}

/// Extract cited keys from document text, in order of appearance.
///
/// Whitespace inside an argument is removed before splitting on commas, so
/// `\cite{a, b ,c}` yields `a`, `b`, `c`. Empty keys are dropped.
pub fn extract_citations(text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut state = ScanState::Normal;
    let mut pos = 0;
    let bytes = text.as_bytes();

    while pos < bytes.len() {
        match state {
            ScanState::InComment => {
                if bytes[pos] == b'\n' {
                    state = ScanState::Normal;
                } else {
                    pos += 1;
                }
            }
            ScanState::Normal => {
                if starts_comment(text, pos) {
                    state = ScanState::InComment;
                    pos += 1;
                    continue;
                }

                if let Some((argument, end)) = match_citation(text, pos) {
                    keys.extend(split_keys(argument));
                    pos = end;
                    continue;
                }

                pos += 1;
            }
        }
    }

    keys
}

/// An unescaped `%` with at least one more character on its line.
///
/// A bare `%` at the end of a line comments out nothing.
fn starts_comment(text: &str, pos: usize) -> bool {
    let bytes = text.as_bytes();
    if bytes[pos] != b'%' {
        return false;
    }
    if pos > 0 && bytes[pos - 1] == b'\\' {
        return false;
    }
    matches!(bytes.get(pos + 1), Some(&next) if next != b'\n')
}

/// Match a citation macro starting at `pos`.
///
/// Returns the raw argument and the position just after the closing brace.
/// The argument is everything up to the first brace, which must be a
/// closing one; it may span lines.
fn match_citation(text: &str, pos: usize) -> Option<(&str, usize)> {
    if text.as_bytes()[pos] != b'\\' {
        return None;
    }
    let rest = &text[pos + 1..];
    let rest = rest.strip_prefix("no").unwrap_or(rest);
    let rest = rest.strip_prefix("cite")?;
    let rest = rest.strip_prefix('p').unwrap_or(rest);
    let rest = rest.strip_prefix('{')?;

    let arg_len = rest.find(|c: char| c == '{' || c == '}')?;
    if arg_len == 0 || rest[arg_len..].starts_with('{') || rest.starts_with('*') {
        return None;
    }

    let argument = &rest[..arg_len];
    let end = text.len() - rest.len() + arg_len + 1;
    Some((argument, end))
}

fn split_keys(argument: &str) -> Vec<String> {
    let compact: String = argument.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
