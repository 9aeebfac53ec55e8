//! Fuzzy entry comparison
//!
//! Two entries describe the same work when every field they share is
//! nearly identical and they share most of their fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::similarity::sequence_ratio;

/// A flat field mapping, as produced by `BibTeXEntry::record`
pub type FieldMap = HashMap<String, String>;

/// Thresholds used by [`is_duplicate`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchThresholds {
    /// Minimum similarity of every shared field value (0.0 - 1.0)
    pub field_similarity: f64,
    /// Minimum share of the larger entry's fields that both entries have
    pub field_overlap: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            field_similarity: 0.9,
            field_overlap: 0.7,
        }
    }
}

/// Decide whether two entries are the same work.
///
/// `existing` is the entry seen earlier in the bibliography, `incoming` the
/// one being checked against it. Values are compared lower-cased.
///
/// - Any shared field whose similarity is below
///   [`MatchThresholds::field_similarity`] vetoes the match.
/// - Otherwise the entries match when
///   `shared / max(len(existing), len(incoming)) >= field_overlap`.
///
/// Entries with no shared field never match.
pub fn is_duplicate(existing: &FieldMap, incoming: &FieldMap, thresholds: &MatchThresholds) -> bool {
    let mut shared = 0usize;

    for (name, value) in existing {
        let Some(other) = incoming.get(name) else {
            continue;
        };
        shared += 1;

        let ratio = sequence_ratio(&value.to_lowercase(), &other.to_lowercase());
        if ratio < thresholds.field_similarity {
            tracing::trace!(field = %name, ratio, "shared field vetoes match");
            return false;
        }
    }

    if shared == 0 {
        return false;
    }

    let largest = existing.len().max(incoming.len());
    overlap_ratio(shared, largest) >= thresholds.field_overlap
}

/// Share of the larger entry's fields that both entries have
pub fn overlap_ratio(shared: usize, largest: usize) -> f64 {
    if largest == 0 {
        return 0.0;
    }
    shared as f64 / largest as f64
}
