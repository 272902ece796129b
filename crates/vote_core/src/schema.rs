use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Social posts carry at most this many characters of the description.
const SHORT_DESCRIPTION_LEN: usize = 110;

/// One recorded division of the House.
///
/// Serialized keys are PascalCase because that is what the published
/// `feed.json` consumers read. The surrogate id never leaves the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct VoteRecord {
    #[serde(skip)]
    pub id: Option<i64>,
    pub number: u32,
    pub parliament: u32,
    pub session: u32,
    pub sitting: u32,
    pub date: String, // YYYY-MM-DD
    pub description_english: String,
    pub description_french: String,
    pub decision: String,
    pub related_bill: String, // empty when the vote is not tied to a bill
    pub total_yeas: u32,
    pub total_nays: u32,
    pub total_paired: u32,
}

impl VoteRecord {
    pub fn key(&self) -> Watermark {
        Watermark {
            parliament: self.parliament,
            number: self.number,
        }
    }

    pub fn has_related_bill(&self) -> bool {
        !self.related_bill.is_empty()
    }

    /// English description cut down for a social post.
    pub fn short_description(&self) -> String {
        if self.description_english.chars().count() <= SHORT_DESCRIPTION_LEN {
            return self.description_english.clone();
        }
        let mut short: String = self
            .description_english
            .chars()
            .take(SHORT_DESCRIPTION_LEN)
            .collect();
        short.push_str("...");
        short
    }

    /// Bill detail page for the related bill, or `fallback` when there is none.
    pub fn link(&self, bill_url_prefix: &str, fallback: &str) -> String {
        if self.has_related_bill() {
            format!("{bill_url_prefix}{}", self.related_bill)
        } else {
            fallback.to_string()
        }
    }
}

/// Highest (parliament, number) pair already ingested.
///
/// Field order matters: the derived ordering compares parliament first, so a
/// vote from a later parliament is newer whatever its own number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark {
    pub parliament: u32,
    pub number: u32,
}

impl Watermark {
    pub fn new(parliament: u32, number: u32) -> Self {
        Self { parliament, number }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.parliament, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(description: &str, bill: &str) -> VoteRecord {
        VoteRecord {
            number: 7,
            parliament: 41,
            description_english: description.to_string(),
            related_bill: bill.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn short_description_keeps_short_text() {
        let v = vote("Concurrence at report stage", "");
        assert_eq!(v.short_description(), "Concurrence at report stage");
    }

    #[test]
    fn short_description_truncates_long_text() {
        let long = "a".repeat(150);
        let short = vote(&long, "").short_description();
        assert_eq!(short.chars().count(), SHORT_DESCRIPTION_LEN + 3);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn link_prefers_related_bill() {
        let prefix = "http://example.test/bill=";
        assert_eq!(vote("x", "C-10").link(prefix, "http://site"), "http://example.test/bill=C-10");
        assert_eq!(vote("x", "").link(prefix, "http://site"), "http://site");
    }

    #[test]
    fn watermark_orders_parliament_first() {
        assert!(Watermark::new(43, 1) > Watermark::new(42, 100));
        assert!(Watermark::new(42, 101) > Watermark::new(42, 100));
        assert!(Watermark::new(41, 999) < Watermark::new(42, 100));
        assert_eq!(Watermark::default(), Watermark::new(0, 0));
    }

    #[test]
    fn json_uses_pascal_case_and_hides_id() {
        let mut v = vote("Motion", "C-10");
        v.id = Some(12);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["DescriptionEnglish"], "Motion");
        assert_eq!(json["RelatedBill"], "C-10");
        assert!(json.get("Id").is_none());
        assert!(json.get("id").is_none());
    }
}
