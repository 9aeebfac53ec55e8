//! Cleanup orchestration
//!
//! Applies the unused-entry filter and then duplicate resolution to a parsed
//! bibliography, and writes the result next to the input file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use imtidy_bibtex::{format_database, BibDatabase};
use serde::{Deserialize, Serialize};

use crate::citations::CitationSet;
use crate::config::TidyConfig;
use crate::error::{Result, TidyError};
use crate::resolution::resolve_duplicates;
use crate::review::Reviewer;

/// Which cleanup steps to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOptions {
    /// Drop entries whose key is never cited
    pub remove_unused: bool,
    /// Review groups of near-identical entries
    pub remove_duplicates: bool,
}

impl CleanupOptions {
    /// True when no step is enabled
    pub fn is_noop(&self) -> bool {
        !self.remove_unused && !self.remove_duplicates
    }
}

/// Summary of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub entries_before: usize,
    pub entries_after: usize,
    /// Entries dropped because no source cites them
    pub unused_removed: usize,
    /// Entries dropped during duplicate review
    pub duplicates_removed: usize,
    pub clusters_reviewed: usize,
    /// Cited keys with no entry in the bibliography, sorted
    pub missing_citations: Vec<String>,
}

/// Clean a parsed bibliography.
///
/// The unused filter runs first and compares keys case-insensitively.
/// Preambles, string definitions and comments pass through unchanged.
pub fn clean(
    db: &BibDatabase,
    citations: &CitationSet,
    options: &CleanupOptions,
    config: &TidyConfig,
    reviewer: &mut dyn Reviewer,
) -> Result<(BibDatabase, CleanupReport)> {
    let mut report = CleanupReport {
        entries_before: db.entries.len(),
        missing_citations: missing_citations(db, citations),
        ..CleanupReport::default()
    };

    if !report.missing_citations.is_empty() {
        tracing::warn!(
            "Cited keys with no bibliography entry: {}",
            report.missing_citations.join(", ")
        );
    }

    let mut entries = db.entries.clone();

    if options.remove_unused {
        let cited = citations.lowercased();
        entries.retain(|entry| {
            let keep = cited.contains(&entry.cite_key.to_lowercase());
            if !keep {
                tracing::debug!("Dropping uncited entry {}", entry.cite_key);
            }
            keep
        });
        report.unused_removed = report.entries_before - entries.len();
        tracing::info!("Removed {} unused entries", report.unused_removed);
    }

    if options.remove_duplicates {
        let resolution =
            resolve_duplicates(entries, &config.matching, &config.review, reviewer)?;
        report.duplicates_removed = resolution.removed;
        report.clusters_reviewed = resolution.clusters_reviewed;
        entries = resolution.entries;
        tracing::info!(
            "Reviewed {} duplicate groups, removed {} entries",
            report.clusters_reviewed,
            report.duplicates_removed
        );
    }

    report.entries_after = entries.len();
    Ok((db.with_entries(entries), report))
}

/// Read, clean and write one bibliography file.
///
/// The result goes to [`output_path`] with the configured suffix; the input
/// file is left untouched. Returns the path written.
pub fn process_bib_file(
    bib_path: &Path,
    citations: &CitationSet,
    options: &CleanupOptions,
    config: &TidyConfig,
    reviewer: &mut dyn Reviewer,
) -> Result<(PathBuf, CleanupReport)> {
    let text = std::fs::read_to_string(bib_path).map_err(|e| TidyError::io(bib_path, e))?;
    let db = imtidy_bibtex::parse(&text).map_err(|source| TidyError::Parse {
        path: bib_path.to_path_buf(),
        source,
    })?;
    tracing::info!("Parsed {} entries from {:?}", db.entries.len(), bib_path);

    let (cleaned, report) = clean(&db, citations, options, config, reviewer)?;

    let out_path = output_path(bib_path, &config.output.suffix);
    std::fs::write(&out_path, format_database(&cleaned))
        .map_err(|e| TidyError::io(&out_path, e))?;
    tracing::info!("Wrote {} entries to {:?}", report.entries_after, out_path);

    Ok((out_path, report))
}

/// `bib_path` with `suffix` appended to its full file name
/// (`refs.bib` -> `refs.bib.new`).
pub fn output_path(bib_path: &Path, suffix: &str) -> PathBuf {
    let mut name = bib_path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn missing_citations(db: &BibDatabase, citations: &CitationSet) -> Vec<String> {
    let known: HashSet<String> = db
        .entries
        .iter()
        .map(|e| e.cite_key.to_lowercase())
        .collect();

    citations
        .iter()
        .filter(|key| !known.contains(&key.to_lowercase()))
        .map(str::to_string)
        .collect()
}
