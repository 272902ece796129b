//! Approximate split of a bilingual description.
//!
//! The vote list puts the English and French wording of a description in one
//! string. The first English word is machine translated and the translation
//! (the pivot) is looked up in the description; everything from the pivot on
//! is taken as French. This is a heuristic: when the pivot is missing the
//! whole string stays English.

use std::collections::BTreeMap;

use crate::schema::VoteRecord;

/// Remaps pivots the translation service gets wrong to the word the
/// House actually uses in the French half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionTable {
    entries: BTreeMap<String, String>,
}

impl Default for CorrectionTable {
    fn default() -> Self {
        let entries = [
            ("Assentiment", "Adoption"),
            ("2ème", "2e"),
            ("Privé", "Affaires"),
            ("Temps", "Attribution"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
        Self { entries }
    }
}

impl CorrectionTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or overrides entries.
    pub fn extended<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.entries.extend(extra);
        self
    }

    pub fn correct<'a>(&'a self, pivot: &'a str) -> &'a str {
        self.entries.get(pivot).map(String::as_str).unwrap_or(pivot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Pivot found at this byte offset.
    Hit(usize),
    /// Pivot empty or absent; the description is all English.
    Miss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<'a> {
    pub english: &'a str,
    pub french: &'a str,
    pub outcome: SplitOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BilingualSplitter {
    corrections: CorrectionTable,
}

impl BilingualSplitter {
    pub fn new(corrections: CorrectionTable) -> Self {
        Self { corrections }
    }

    /// Splits at the first occurrence of the corrected pivot.
    ///
    /// `english` followed by `french` is always exactly `description`.
    pub fn split<'a>(&self, description: &'a str, pivot: &str) -> Split<'a> {
        let pivot = self.corrections.correct(pivot);
        let found = if pivot.is_empty() {
            None
        } else {
            description.find(pivot)
        };

        match found {
            Some(offset) => {
                let (english, french) = description.split_at(offset);
                Split {
                    english,
                    french,
                    outcome: SplitOutcome::Hit(offset),
                }
            }
            None => Split {
                english: description,
                french: "",
                outcome: SplitOutcome::Miss,
            },
        }
    }

    /// Splits `vote.description_english` in place.
    pub fn apply(&self, vote: &mut VoteRecord, pivot: &str) -> SplitOutcome {
        let split = self.split(&vote.description_english, pivot);
        let outcome = split.outcome;
        let english = split.english.to_string();
        let french = split.french.to_string();
        vote.description_english = english;
        vote.description_french = french;
        outcome
    }
}

/// The word sent for translation: everything before the first space.
pub fn first_word(description: &str) -> &str {
    description.split(' ').next().unwrap_or(description)
}
