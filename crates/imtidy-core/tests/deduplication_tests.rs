//! Duplicate detection and resolution integration tests
//!
//! Enhanced with property-based testing

mod common;

use common::fixtures::cite_keys;
use imtidy_bibtex::{parse, BibTeXEntry, BibTeXEntryType};
use imtidy_core::{
    is_duplicate, resolve_duplicates, MatchThresholds, ResolutionPolicy, ScriptedReviewer,
};
use proptest::prelude::*;
use rstest::rstest;

const PAIR: &str = r#"
@article{vaswani2017attention,
  author = {Ashish Vaswani and Noam Shazeer and Niki Parmar},
  title = {Attention Is All You Need},
  booktitle = {Advances in Neural Information Processing Systems},
  year = 2017,
}

@article{vaswani2017attentionb,
  author = {Ashish Vaswani and Noam Shazeer and Niki Parmar},
  title = {Attention is all you need},
  booktitle = {Advances in Neural Information Processing Systems},
  year = 2017,
  pages = {5998--6008},
}
"#;

fn resolve(bib: &str, answers: &[&str]) -> (Vec<String>, ScriptedReviewer) {
    let db = parse(bib).unwrap();
    let mut reviewer = ScriptedReviewer::new(answers.iter().copied());
    let resolution = resolve_duplicates(
        db.entries,
        &MatchThresholds::default(),
        &ResolutionPolicy::default(),
        &mut reviewer,
    )
    .unwrap();
    let keys = cite_keys(&resolution.entries)
        .into_iter()
        .map(str::to_string)
        .collect();
    (keys, reviewer)
}

// === Comparator on parsed entries ===

#[test]
fn test_case_variants_are_duplicates() {
    let db = parse(PAIR).unwrap();
    let a = db.entries[0].record();
    let b = db.entries[1].record();
    // 6 shared of 7 fields
    assert!(is_duplicate(&a, &b, &MatchThresholds::default()));
}

#[test]
fn test_different_year_is_not_a_duplicate() {
    let bib = PAIR.replacen("year = 2017,\n  pages", "year = 2018,\n  pages", 1);
    let db = parse(&bib).unwrap();
    assert!(!is_duplicate(
        &db.entries[0].record(),
        &db.entries[1].record(),
        &MatchThresholds::default()
    ));
}

#[test]
fn test_different_entry_type_is_not_a_duplicate() {
    let bib = PAIR.replacen("@article{vaswani2017attentionb", "@book{vaswani2017attentionb", 1);
    let db = parse(&bib).unwrap();
    assert!(!is_duplicate(
        &db.entries[0].record(),
        &db.entries[1].record(),
        &MatchThresholds::default()
    ));
}

// === Resolution ===

#[rstest]
#[case("1", &["vaswani2017attentionb"])]
#[case("2", &["vaswani2017attention"])]
#[case("1,2", &["vaswani2017attention", "vaswani2017attentionb"])]
#[case("2,1", &["vaswani2017attention", "vaswani2017attentionb"])]
fn test_pair_selection(#[case] answer: &str, #[case] expected: &[&str]) {
    let (keys, reviewer) = resolve(PAIR, &[answer]);

    // The fuller entry is listed first
    assert_eq!(
        reviewer.presented(),
        &[vec!["vaswani2017attentionb", "vaswani2017attention"]]
    );
    assert_eq!(keys, expected);
}

#[test]
fn test_unrelated_entries_between_duplicates_keep_their_place() {
    let bib = format!(
        "{}\n@misc{{other,\n  title = {{Something else}},\n}}\n",
        PAIR.replacen(
            "@article{vaswani2017attentionb",
            "@misc{other0,\n  title = {First}\n}\n\n@article{vaswani2017attentionb",
            1
        )
    );
    let (keys, _) = resolve(&bib, &["1"]);
    assert_eq!(keys, vec!["other0", "vaswani2017attentionb", "other"]);
}

#[test]
fn test_identical_entries_are_distinct_candidates() {
    let entry = r#"
@misc{same,
  title = {Exactly the same},
}
"#;
    let bib = entry.repeat(2);
    let (keys, reviewer) = resolve(&bib, &["2"]);
    assert_eq!(reviewer.presented().len(), 1);
    assert_eq!(keys, vec!["same"]);

    let (keys, _) = resolve(&bib, &["1,2"]);
    assert_eq!(keys, vec!["same", "same"]);
}

// === Property-based tests ===

fn misc(key: &str, year: &str) -> BibTeXEntry {
    let mut entry = BibTeXEntry::new(key, BibTeXEntryType::Misc);
    entry.add_field("title", "A shared title for every entry");
    entry.add_field("year", year);
    entry
}

proptest! {
    #[test]
    fn test_distinct_years_never_reach_the_reviewer(
        years in proptest::collection::btree_set(1000u32..10000, 1..8)
    ) {
        let entries: Vec<BibTeXEntry> = years
            .iter()
            .map(|y| misc(&format!("entry{y}"), &y.to_string()))
            .collect();
        let expected: Vec<String> = entries.iter().map(|e| e.cite_key.clone()).collect();

        let mut reviewer = ScriptedReviewer::default();
        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        prop_assert_eq!(resolution.clusters_reviewed, 0);
        prop_assert_eq!(
            resolution.entries.iter().map(|e| e.cite_key.clone()).collect::<Vec<_>>(),
            expected
        );
    }

    #[test]
    fn test_pair_output_shrinks_by_rejected_count(keep_first in any::<bool>(), keep_second in any::<bool>()) {
        prop_assume!(keep_first || keep_second);
        let entries = vec![misc("sharedkey2020", "2020"), misc("sharedkey2020x", "2020")];

        let mut answer = Vec::new();
        if keep_first {
            answer.push("1");
        }
        if keep_second {
            answer.push("2");
        }
        let rejected = 2 - answer.len();

        let mut reviewer = ScriptedReviewer::new([answer.join(",")]);
        let resolution = resolve_duplicates(
            entries,
            &MatchThresholds::default(),
            &ResolutionPolicy::default(),
            &mut reviewer,
        )
        .unwrap();

        prop_assert_eq!(resolution.entries.len(), 2 - rejected);
        prop_assert_eq!(resolution.removed, rejected);
    }
}
