//! Insertion-ordered label counting.
//!
//! Both the imputer (per coordinate bucket) and the classifier (per interval)
//! need a majority vote whose ties resolve to the label seen first. Keeping
//! counts in insertion order makes that tie-break fall out of a single scan.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Multiset of region labels that remembers first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTally {
    /// (label, count) in first-seen order
    entries: Vec<(String, usize)>,
    /// label -> position in `entries`
    index: HashMap<String, usize>,
    total: usize,
}

impl LabelTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `label`.
    pub fn add(&mut self, label: &str) {
        self.add_n(label, 1);
    }

    fn add_n(&mut self, label: &str, n: usize) {
        if n == 0 {
            return;
        }
        match self.index.get(label) {
            Some(&pos) => self.entries[pos].1 += n,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), n));
            }
        }
        self.total += n;
    }

    /// Total number of votes.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct labels.
    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Votes for `label` (0 if never seen).
    pub fn count(&self, label: &str) -> usize {
        self.index
            .get(label)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    /// Most frequent label and its count. Ties go to the label seen first.
    pub fn dominant(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (label, count) in &self.entries {
            match best {
                Some((_, best_count)) if *count <= best_count => {}
                _ => best = Some((label.as_str(), *count)),
            }
        }
        best
    }

    /// Labels with counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// Fold another tally into this one.
    ///
    /// Labels already present keep their position; labels new to `self` are
    /// appended in `other`'s order. Merging chunk tallies left to right thus
    /// reproduces the order a single sequential scan would have produced.
    pub fn merge(&mut self, other: &LabelTally) {
        for (label, count) in other.iter() {
            self.add_n(label, count);
        }
    }
}

impl<'a> FromIterator<&'a str> for LabelTally {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut tally = LabelTally::new();
        for label in iter {
            tally.add(label);
        }
        tally
    }
}

/// Serializes as a JSON object in first-seen order, e.g. `{"Texas":2,"Oklahoma":1}`.
impl Serialize for LabelTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_dominant() {
        let tally: LabelTally = ["Texas", "Oklahoma", "Texas"].into_iter().collect();
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.distinct(), 2);
        assert_eq!(tally.count("Texas"), 2);
        assert_eq!(tally.count("Kansas"), 0);
        assert_eq!(tally.dominant(), Some(("Texas", 2)));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let tally: LabelTally = ["Oklahoma", "Texas", "Texas", "Oklahoma"]
            .into_iter()
            .collect();
        assert_eq!(tally.dominant(), Some(("Oklahoma", 2)));

        // Lexicographic order would pick "Arkansas"; first-seen picks "Texas"
        let tally: LabelTally = ["Texas", "Arkansas"].into_iter().collect();
        assert_eq!(tally.dominant(), Some(("Texas", 1)));
    }

    #[test]
    fn test_empty() {
        let tally = LabelTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.dominant(), None);
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut left: LabelTally = ["Texas", "Oklahoma"].into_iter().collect();
        let right: LabelTally = ["Kansas", "Oklahoma", "Oklahoma"].into_iter().collect();
        left.merge(&right);

        let order: Vec<_> = left.iter().collect();
        assert_eq!(order, vec![("Texas", 1), ("Oklahoma", 3), ("Kansas", 1)]);
        assert_eq!(left.total(), 5);
    }

    #[test]
    fn test_serialize_in_first_seen_order() {
        let tally: LabelTally = ["Texas", "Oklahoma", "Texas"].into_iter().collect();
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"Texas":2,"Oklahoma":1}"#);
    }
}
