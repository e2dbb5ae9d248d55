//!
//! Label Hierarchy Engine
//!
//! Question and part labels are dot-separated paths of arbitrary depth:
//! `"1"`, `"1.1"`, `"1.1.a"`. This module computes leaf labels, sorts label
//! sets hierarchically, and materializes prefix closures.
//!
//! The sort order compares each dot component numerically when both sides
//! parse as integers and lexically otherwise, so `"1.2" < "1.10"` and
//! `"1.a" < "1.b"` hold at the same time.

use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Hierarchical comparison of two labels, component by component.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(lc), Some(rc)) => {
                let ord = match (lc.parse::<u64>(), rc.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    _ => lc.cmp(rc),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Sorts a label set hierarchically and returns it.
pub fn sort_hierarchical(mut labels: Vec<String>) -> Vec<String> {
    labels.sort_by(|a, b| compare_labels(a, b));
    labels
}

/// True when `label` is a strict descendant of `prefix` (`"1.1"` descends
/// from `"1"`, but `"11"` does not).
fn is_strict_descendant(label: &str, prefix: &str) -> bool {
    label.len() > prefix.len()
        && label.starts_with(prefix)
        && label.as_bytes()[prefix.len()] == b'.'
}

/// Returns every label with no descendant present in the set, preserving
/// input order.
///
/// A label equal to its own numeric prefix with no children is trivially a
/// leaf: `leaves_of(["1"]) == ["1"]`.
pub fn leaves_of(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .filter(|candidate| {
            !labels
                .iter()
                .any(|other| is_strict_descendant(other, candidate))
        })
        .cloned()
        .collect()
}

/// Materializes every ancestor prefix of every label in the set.
///
/// Observing `"1.1.a"` alone yields `{"1", "1.1", "1.1.a"}` — ancestors are
/// inserted even when they never appeared verbatim in the input.
pub fn prefix_closure(labels: &[String]) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    for label in labels {
        let mut prefix = String::new();
        for component in label.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(component);
            closure.insert(prefix.clone());
        }
    }
    closure
}

/// The top-level (first dot component) of a label.
pub fn top_level_of(label: &str) -> &str {
    label.split('.').next().unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn leaves_drop_labels_with_descendants() {
        let input = labels(&["1", "1.1", "1.1.a", "1.2", "2"]);
        let mut leaves = leaves_of(&input);
        leaves.sort();
        assert_eq!(leaves, labels(&["1.1.a", "1.2", "2"]));
    }

    #[test]
    fn single_label_is_its_own_leaf() {
        assert_eq!(leaves_of(&labels(&["1"])), labels(&["1"]));
    }

    #[test]
    fn numeric_lookalike_is_not_a_descendant() {
        // "11" starts with "1" but is a sibling, not a child.
        let input = labels(&["1", "11"]);
        let mut leaves = leaves_of(&input);
        leaves.sort();
        assert_eq!(leaves, labels(&["1", "11"]));
    }

    #[test]
    fn sort_compares_numeric_components_numerically() {
        let sorted = sort_hierarchical(labels(&["1.10", "1.2", "1.1"]));
        assert_eq!(sorted, labels(&["1.1", "1.2", "1.10"]));
    }

    #[test]
    fn sort_compares_alpha_components_lexically() {
        let sorted = sort_hierarchical(labels(&["1.b", "1.a", "1.c"]));
        assert_eq!(sorted, labels(&["1.a", "1.b", "1.c"]));
    }

    #[test]
    fn sort_mixes_both_rules_per_component() {
        let sorted = sort_hierarchical(labels(&["2", "1.10", "1.2", "1.a", "1", "10"]));
        assert_eq!(sorted, labels(&["1", "1.2", "1.10", "1.a", "2", "10"]));
    }

    #[test]
    fn shorter_path_sorts_before_its_children() {
        let sorted = sort_hierarchical(labels(&["1.1.a", "1", "1.1"]));
        assert_eq!(sorted, labels(&["1", "1.1", "1.1.a"]));
    }

    #[test]
    fn closure_materializes_unseen_ancestors() {
        let closure = prefix_closure(&labels(&["1.1.a"]));
        let got: Vec<&str> = closure.iter().map(|s| s.as_str()).collect();
        assert_eq!(got, vec!["1", "1.1", "1.1.a"]);
    }

    #[test]
    fn closure_deduplicates_shared_ancestors() {
        let closure = prefix_closure(&labels(&["1.1", "1.2", "1.1.a"]));
        let got: Vec<&str> = closure.iter().map(|s| s.as_str()).collect();
        assert_eq!(got, vec!["1", "1.1", "1.1.a", "1.2"]);
    }

    #[test]
    fn top_level_is_the_first_component() {
        assert_eq!(top_level_of("3.2.b"), "3");
        assert_eq!(top_level_of("7"), "7");
    }
}
