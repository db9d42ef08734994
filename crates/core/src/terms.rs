//! Candidate term extraction from case-report text.

use std::collections::btree_set::{self, BTreeSet};

/// Unique, lower-cased candidate terms from a case report.
///
/// Order carries no meaning. Iteration is sorted so that lookups and logs are reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermSet(BTreeSet<String>);

impl TermSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.0.contains(term)
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a TermSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Split text into unique lower-cased words.
///
/// Any character that is not alphanumeric ends a word, so whitespace and punctuation are both
/// separators. There is no stemming and no stop-word filtering.
pub fn extract_terms(text: &str) -> TermSet {
    TermSet(
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect(),
    )
}
