//! Imtidy Core - Bibliography cleanup for LaTeX projects
//!
//! This crate provides the core functionality behind the imtidy tool:
//!
//! - **Sources**: Recursive discovery of source documents under a directory
//! - **Citations**: Extraction of `\cite`, `\citep`, `\nocite` keys, skipping line comments
//! - **Similarity**: Matching-blocks string similarity ratio
//! - **Matching**: Veto-then-overlap duplicate comparator over entry field maps
//! - **Resolution**: Left-to-right duplicate grouping with a human reviewer in the loop
//! - **Review**: Console and scripted reviewers
//! - **Cleanup**: Unused-entry filter, duplicate resolution and output writing
//! - **Config**: Thresholds, source extension, output suffix and review policy
//!
//! # Pipeline
//!
//! ```text
//! tex dir -> find_source_files -> find_citations -> CitationSet
//!                                                       |
//! refs.bib -> parse -> clean (unused, duplicates) <------+
//!                        |
//!                        +-> format_database -> refs.bib.new
//! ```

pub mod citations;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod matching;
pub mod resolution;
pub mod review;
pub mod similarity;
pub mod sources;

pub use citations::{extract_citations, find_citations, CitationSet};
pub use cleanup::{clean, output_path, process_bib_file, CleanupOptions, CleanupReport};
pub use config::{ConfigError, OutputConfig, SourcesConfig, TidyConfig};
pub use error::{Result, TidyError};
pub use matching::{is_duplicate, overlap_ratio, FieldMap, MatchThresholds};
pub use resolution::{
    parse_selection, resolve_cluster, resolve_duplicates, ClusterMember, DuplicateCluster,
    Resolution, ResolutionPolicy, SelectionError,
};
pub use review::{format_for_review, ConsoleReviewer, Reviewer, ScriptedReviewer};
pub use similarity::{matching_blocks, sequence_ratio, MatchingBlock};
pub use sources::find_source_files;
