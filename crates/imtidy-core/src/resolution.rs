//! Duplicate resolution
//!
//! A single left-to-right pass over the entries. Each entry is compared with
//! every entry before it; when some of those look like the same work, the
//! group is ranked by fullness and handed to a [`Reviewer`], who picks the
//! entries to keep.
//!
//! Every entry stays a comparison target after its turn, including entries
//! the reviewer did not keep. A later near-copy is therefore still grouped
//! with them.

use imtidy_bibtex::BibTeXEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, TidyError};
use crate::matching::{is_duplicate, FieldMap, MatchThresholds};
use crate::review::Reviewer;

/// How a reviewed group changes the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    /// Remove group members the reviewer did not keep from the output, even
    /// when they were emitted in an earlier round. When false, earlier
    /// entries are never removed and only the kept ones are added.
    pub withdraw_rejected: bool,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            withdraw_rejected: true,
        }
    }
}

/// An entry taking part in a duplicate group
#[derive(Debug, Clone, Copy)]
pub struct ClusterMember<'a> {
    /// Position of the entry in the input sequence
    pub position: usize,
    pub entry: &'a BibTeXEntry,
    /// Number of fields, pseudo-fields included
    pub fullness: usize,
}

/// Entries judged to be the same work, fullest first
#[derive(Debug, Clone)]
pub struct DuplicateCluster<'a> {
    members: Vec<ClusterMember<'a>>,
}

impl<'a> DuplicateCluster<'a> {
    /// Rank members by fullness, descending. Members with equal fullness
    /// keep the order they were given in.
    pub fn new(mut members: Vec<ClusterMember<'a>>) -> Self {
        members.sort_by(|a, b| b.fullness.cmp(&a.fullness));
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ClusterMember<'a>] {
        &self.members
    }

    /// Cite keys in ranked order
    pub fn cite_keys(&self) -> Vec<&'a str> {
        self.members
            .iter()
            .map(|m| m.entry.cite_key.as_str())
            .collect()
    }
}

/// A refused answer to the selection prompt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Invalid input. Please enter valid numbers separated by commas.")]
    NotANumber(String),
    #[error("Invalid input. Please enter at least one valid number.")]
    Empty,
}

/// Parse a comma-separated list of 1-based choices.
///
/// Every token must be an integer. Numbers outside `1..=cluster_len` are
/// dropped; if nothing is left the answer is refused. Returns 0-based
/// indices in the order they were typed.
pub fn parse_selection(
    input: &str,
    cluster_len: usize,
) -> std::result::Result<Vec<usize>, SelectionError> {
    let mut choices = Vec::new();

    for token in input.split(',') {
        let token = token.trim();
        let number = match token.parse::<i64>() {
            Ok(n) => n,
            Err(e) => match e.kind() {
                std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                    continue
                }
                _ => return Err(SelectionError::NotANumber(token.to_string())),
            },
        };

        if number >= 1 && (number as u64) <= cluster_len as u64 {
            choices.push(number as usize - 1);
        }
    }

    if choices.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(choices)
}

/// Show a group to the reviewer and ask until a valid selection is given.
///
/// Returns indices into [`DuplicateCluster::members`]. There is no retry
/// limit; only a reviewer I/O failure ends the loop early.
pub fn resolve_cluster(
    cluster: &DuplicateCluster<'_>,
    reviewer: &mut dyn Reviewer,
) -> Result<Vec<usize>> {
    reviewer.present(cluster).map_err(TidyError::Review)?;

    loop {
        let answer = reviewer.ask(cluster).map_err(TidyError::Review)?;
        match parse_selection(&answer, cluster.len()) {
            Ok(choices) => return Ok(choices),
            Err(e) => {
                tracing::debug!("Refused selection {:?}: {}", answer, e);
                reviewer.reject(cluster, &e).map_err(TidyError::Review)?;
            }
        }
    }
}

/// Outcome of a duplicate resolution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Surviving entries in output order
    pub entries: Vec<BibTeXEntry>,
    /// Number of groups shown to the reviewer
    pub clusters_reviewed: usize,
    /// Number of input entries not in the output
    pub removed: usize,
}

/// Run the duplicate resolution pass over `entries`.
///
/// Entries are tracked by position, so two identical entries are still two
/// distinct candidates. An entry with no earlier look-alike is emitted
/// directly. For a group, the kept entries are emitted in the order chosen,
/// skipping those already in the output.
pub fn resolve_duplicates(
    entries: Vec<BibTeXEntry>,
    thresholds: &MatchThresholds,
    policy: &ResolutionPolicy,
    reviewer: &mut dyn Reviewer,
) -> Result<Resolution> {
    let records: Vec<FieldMap> = entries.iter().map(BibTeXEntry::record).collect();
    let total = entries.len();

    let mut processed: Vec<usize> = Vec::with_capacity(total);
    let mut output: Vec<usize> = Vec::with_capacity(total);
    let mut emitted = vec![false; total];
    let mut clusters_reviewed = 0;

    for (position, record) in records.iter().enumerate() {
        let mut group = vec![position];
        group.extend(
            processed
                .iter()
                .copied()
                .filter(|&earlier| is_duplicate(&records[earlier], record, thresholds)),
        );

        if group.len() == 1 {
            output.push(position);
            emitted[position] = true;
            processed.push(position);
            continue;
        }

        let cluster = DuplicateCluster::new(
            group
                .iter()
                .map(|&p| ClusterMember {
                    position: p,
                    entry: &entries[p],
                    fullness: records[p].len(),
                })
                .collect(),
        );
        tracing::info!(
            "Duplicate group for {}: {}",
            entries[position].cite_key,
            cluster.cite_keys().join(", ")
        );

        let kept: Vec<usize> = resolve_cluster(&cluster, reviewer)?
            .into_iter()
            .map(|i| cluster.members()[i].position)
            .collect();
        clusters_reviewed += 1;

        if policy.withdraw_rejected {
            for member in cluster.members() {
                if emitted[member.position] && !kept.contains(&member.position) {
                    tracing::info!("Withdrawing {}", member.entry.cite_key);
                    emitted[member.position] = false;
                    output.retain(|&p| p != member.position);
                }
            }
        }

        for p in kept {
            if !emitted[p] {
                output.push(p);
                emitted[p] = true;
            }
        }

        processed.push(position);
    }

    let mut slots: Vec<Option<BibTeXEntry>> = entries.into_iter().map(Some).collect();
    let survivors: Vec<BibTeXEntry> = output.iter().filter_map(|&p| slots[p].take()).collect();

    Ok(Resolution {
        removed: total - survivors.len(),
        entries: survivors,
        clusters_reviewed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::ScriptedReviewer;
    use imtidy_bibtex::BibTeXEntryType;
    use rstest::rstest;

    fn article(key: &str, fields: &[(&str, &str)]) -> BibTeXEntry {
        let mut entry = BibTeXEntry::new(key, BibTeXEntryType::Article);
        for (k, v) in fields {
            entry.add_field(*k, *v);
        }
        entry
    }

    fn keys(entries: &[BibTeXEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.cite_key.as_str()).collect()
    }

    fn einstein(key: &str) -> BibTeXEntry {
        article(
            key,
            &[
                ("author", "Albert Einstein"),
                ("title", "On the Electrodynamics of Moving Bodies"),
                ("year", "1905"),
            ],
        )
    }

    #[rstest]
    #[case("1", 2, vec![0])]
    #[case("2,1", 2, vec![1, 0])]
    #[case(" 1 , 3 ", 3, vec![0, 2])]
    #[case("1,5", 2, vec![0])]
    #[case("+2", 2, vec![1])]
    #[case("1,1", 2, vec![0, 0])]
    #[case("0,2", 2, vec![1])]
    #[case("99999999999999999999999,1", 2, vec![0])]
    fn test_parse_selection_valid(
        #[case] input: &str,
        #[case] len: usize,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(parse_selection(input, len), Ok(expected));
    }

    #[rstest]
    #[case("abc", SelectionError::NotANumber("abc".to_string()))]
    #[case("", SelectionError::NotANumber(String::new()))]
    #[case("1,x", SelectionError::NotANumber("x".to_string()))]
    #[case("1,", SelectionError::NotANumber(String::new()))]
    #[case("5", SelectionError::Empty)]
    #[case("0,-1", SelectionError::Empty)]
    fn test_parse_selection_refused(#[case] input: &str, #[case] expected: SelectionError) {
        assert_eq!(parse_selection(input, 2), Err(expected));
    }

    #[test]
    fn test_cluster_ranked_by_fullness_stable() {
        let small = article("small", &[("title", "t")]);
        let big = article("big", &[("title", "t"), ("year", "1"), ("note", "n")]);
        let mid_a = article("mid_a", &[("title", "t"), ("year", "1")]);
        let mid_b = article("mid_b", &[("title", "t"), ("year", "1")]);

        let members = [&small, &mid_a, &big, &mid_b]
            .into_iter()
            .enumerate()
            .map(|(position, entry)| ClusterMember {
                position,
                entry,
                fullness: entry.fullness(),
            })
            .collect();
        let cluster = DuplicateCluster::new(members);
        assert_eq!(cluster.cite_keys(), vec!["big", "mid_a", "mid_b", "small"]);
    }

    #[test]
    fn test_unique_entries_pass_through_without_review() {
        let entries = vec![
            article("a", &[("title", "Alpha"), ("year", "2001")]),
            article("b", &[("title", "Beta"), ("year", "2002")]),
        ];
        let mut reviewer = ScriptedReviewer::new(Vec::<String>::new());

        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        assert_eq!(keys(&resolution.entries), vec!["a", "b"]);
        assert_eq!(resolution.clusters_reviewed, 0);
        assert_eq!(resolution.removed, 0);
        assert!(reviewer.presented().is_empty());
    }

    #[test]
    fn test_keep_earlier_entry_drops_newcomer() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        // Equal fullness: the newcomer is ranked first
        let mut reviewer = ScriptedReviewer::new(["2"]);

        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        assert_eq!(
            reviewer.presented(),
            &[vec!["einstein1905b".to_string(), "einstein1905".to_string()]]
        );
        assert_eq!(keys(&resolution.entries), vec!["einstein1905"]);
        assert_eq!(resolution.removed, 1);
    }

    #[test]
    fn test_keep_newcomer_withdraws_earlier_entry() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        let mut reviewer = ScriptedReviewer::new(["1"]);

        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        assert_eq!(keys(&resolution.entries), vec!["einstein1905b"]);
    }

    #[test]
    fn test_append_only_policy_keeps_earlier_entry() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        let mut reviewer = ScriptedReviewer::new(["1"]);
        let policy = ResolutionPolicy {
            withdraw_rejected: false,
        };

        let resolution =
            resolve_duplicates(entries, &MatchThresholds::default(), &policy, &mut reviewer)
                .unwrap();

        assert_eq!(keys(&resolution.entries), vec!["einstein1905", "einstein1905b"]);
        assert_eq!(resolution.removed, 0);
    }

    #[test]
    fn test_keep_all_members() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        let mut reviewer = ScriptedReviewer::new(["1,2"]);

        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        assert_eq!(keys(&resolution.entries), vec!["einstein1905", "einstein1905b"]);
        assert_eq!(resolution.removed, 0);
    }

    #[test]
    fn test_invalid_answers_are_asked_again() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        let mut reviewer = ScriptedReviewer::new(["abc", "5", "", "2"]);

        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        assert_eq!(
            reviewer.rejections(),
            &[
                SelectionError::NotANumber("abc".to_string()),
                SelectionError::Empty,
                SelectionError::NotANumber(String::new()),
            ]
        );
        assert_eq!(reviewer.presented().len(), 1);
        assert_eq!(keys(&resolution.entries), vec!["einstein1905"]);
    }

    #[test]
    fn test_rejected_entry_stays_comparison_target() {
        // c is close to b but not to a; b was dropped in the first round
        let a = article("ref2020", &[("title", "Graph neural networks"), ("year", "2020")]);
        let b = article("ref2020a", &[("title", "Graph neural networks"), ("year", "2020")]);
        let mut c = b.clone();
        c.cite_key = "ref2020ab".to_string();
        c.set_field("title", "Graph neural networkz");

        let mut reviewer = ScriptedReviewer::new(["2", "1"]);
        let resolution = resolve_duplicates(
            vec![a, b, c],
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        let presented = reviewer.presented();
        assert_eq!(presented.len(), 2);
        assert!(presented[1].contains(&"ref2020a".to_string()));
        assert_eq!(resolution.clusters_reviewed, 2);
        assert!(keys(&resolution.entries).contains(&"ref2020ab"));
        assert!(!keys(&resolution.entries).contains(&"ref2020a"));
    }

    #[test]
    fn test_three_member_cluster_keeps_first_and_third() {
        let a = article("smith2020", &[("title", "Learning to rank")]);
        let b = article(
            "smith2020b",
            &[("title", "Learning to rank"), ("year", "2020"), ("pages", "1--10")],
        );
        let c = article("smith2020c", &[("title", "Learning to rank"), ("year", "2020")]);

        // Rounds: b joins a (keep both), then c joins a and b
        let mut reviewer = ScriptedReviewer::new(["1,2", "1,3"]);
        let thresholds = MatchThresholds {
            field_overlap: 0.5,
            ..MatchThresholds::default()
        };
        let resolution = resolve_duplicates(
            vec![a, b, c],
            &thresholds,
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        // Second group ranked: smith2020b (5), smith2020c (4), smith2020 (3)
        assert_eq!(
            reviewer.presented()[1],
            vec!["smith2020b", "smith2020c", "smith2020"]
        );
        // Both kept entries were already emitted in the first round
        assert_eq!(keys(&resolution.entries), vec!["smith2020", "smith2020b"]);
        assert_eq!(resolution.removed, 1);
    }

    #[test]
    fn test_reviewer_running_dry_is_fatal() {
        let entries = vec![einstein("einstein1905"), einstein("einstein1905b")];
        let mut reviewer = ScriptedReviewer::new(["nope"]);

        let err = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap_err();
        assert!(matches!(err, TidyError::Review(_)));
    }
}
