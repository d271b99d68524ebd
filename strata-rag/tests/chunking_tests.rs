//! Property tests for the parent/child chunk hierarchy.

use proptest::prelude::*;
use strata_rag::chunking::chunk;

/// Paragraphs of 13-150 lowercase words (3-8 letters each), joined by one or
/// more blank lines. Any window of 13 such words is longer than 50 characters.
fn arb_document() -> impl Strategy<Value = String> {
    let paragraph = proptest::collection::vec("[a-z]{3,8}", 13..150).prop_map(|w| w.join(" "));
    let separator = prop_oneof![Just("\n\n"), Just("\n\n\n"), Just("\n  \n")];
    (proptest::collection::vec(paragraph, 1..8), separator)
        .prop_map(|(paragraphs, separator)| paragraphs.join(separator))
}

/// `(parent_size, child_size, child_overlap)` with `child_overlap < child_size`.
fn arb_sizes() -> impl Strategy<Value = (usize, usize, usize)> {
    (13usize..400, 13usize..120)
        .prop_flat_map(|(parent, child)| (Just(parent), Just(child), 0..child))
}

fn contains_run(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// **Property 1: Non-empty documents produce children**
/// *For any* document whose first window exceeds the minimum child length,
/// the hierarchy SHALL contain at least one child chunk.
mod prop_children_exist {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn at_least_one_child(doc in arb_document(), (parent, child, overlap) in arb_sizes()) {
            let parents = chunk(&doc, parent, child, overlap).unwrap();
            let children: usize = parents.iter().map(|p| p.children.len()).sum();
            prop_assert!(children >= 1);
        }
    }
}

/// **Property 2: Children are contiguous word slices of their parent**
/// *For any* document and sizes, every child's words SHALL appear as a
/// contiguous run in its parent's words, and its `parent_id` SHALL name
/// that parent.
mod prop_children_are_slices {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn child_words_are_a_run_of_parent_words(
            doc in arb_document(),
            (parent, child, overlap) in arb_sizes(),
        ) {
            for block in chunk(&doc, parent, child, overlap).unwrap() {
                let parent_words: Vec<&str> = block.text.split(' ').collect();
                for c in &block.children {
                    let child_words: Vec<&str> = c.text.split(' ').collect();
                    prop_assert_eq!(c.parent_id, block.id);
                    prop_assert!(child_words.len() <= child);
                    prop_assert!(contains_run(&parent_words, &child_words));
                }
            }
        }
    }
}

/// **Property 3: Chunking is idempotent and lossless**
/// *For any* document and sizes, chunking twice SHALL yield identical
/// hierarchies, parent ids SHALL be `0..n`, and the parents' words in order
/// SHALL equal the document's words.
mod prop_idempotent_and_lossless {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn same_input_same_hierarchy(
            doc in arb_document(),
            (parent, child, overlap) in arb_sizes(),
        ) {
            let first = chunk(&doc, parent, child, overlap).unwrap();
            let second = chunk(&doc, parent, child, overlap).unwrap();
            prop_assert_eq!(&first, &second);

            for (i, block) in first.iter().enumerate() {
                prop_assert_eq!(block.id, i);
            }

            let rejoined: Vec<&str> = first.iter().flat_map(|p| p.text.split(' ')).collect();
            let original: Vec<&str> = doc.split_whitespace().collect();
            prop_assert_eq!(rejoined, original);
        }
    }
}

/// **Property 4: Parents end on paragraph boundaries**
/// *For any* document, every parent except the last SHALL hold at least
/// `parent_size` words.
mod prop_parent_sizes {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn all_but_last_parent_reach_parent_size(
            doc in arb_document(),
            (parent, child, overlap) in arb_sizes(),
        ) {
            let parents = chunk(&doc, parent, child, overlap).unwrap();
            if let Some((_, init)) = parents.split_last() {
                for block in init {
                    prop_assert!(block.word_count() >= parent);
                }
            }
        }
    }
}

#[test]
fn empty_document_has_no_parents() {
    assert!(chunk("", 1000, 200, 50).unwrap().is_empty());
}

#[test]
fn overlap_not_smaller_than_window_is_invalid_config() {
    let err = chunk("some text", 1000, 200, 200).unwrap_err();
    assert_eq!(err.kind(), strata_rag::ErrorKind::InvalidConfig);
}
