//! Repairs the raw vote list and decodes it into [`VoteRecord`]s.
//!
//! Upstream encodes the related bill as `<RelatedBill number="C-10" />`. The
//! rest of the system treats it as element text, so that shape is rewritten
//! to `<RelatedBill>C-10</RelatedBill>` before the document is decoded.
//!
//! The root element must be `<Votes>`; anything else (an error page served
//! with a 200, say) is a malformed feed. Element text is decoded with leading
//! and trailing whitespace trimmed.

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::schema::VoteRecord;

const RELATED_BILL_ATTR: &str = r#"<RelatedBill number="([a-zA-Z0-9-]+)" />"#;
const ROOT_ELEMENT: &str = "Votes";

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(rename = "Vote", default)]
    votes: Vec<FeedVote>,
}

#[derive(Debug, Deserialize)]
struct FeedVote {
    #[serde(rename = "@number")]
    number: u32,
    #[serde(rename = "@parliament")]
    parliament: u32,
    #[serde(rename = "@session", default)]
    session: u32,
    #[serde(rename = "@sitting", default)]
    sitting: u32,
    #[serde(rename = "@date", default)]
    date: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Decision", default)]
    decision: String,
    #[serde(rename = "RelatedBill", default)]
    related_bill: String,
    #[serde(rename = "TotalYeas", default)]
    total_yeas: u32,
    #[serde(rename = "TotalNays", default)]
    total_nays: u32,
    #[serde(rename = "TotalPaired", default)]
    total_paired: u32,
}

impl From<FeedVote> for VoteRecord {
    fn from(v: FeedVote) -> Self {
        VoteRecord {
            id: None,
            number: v.number,
            parliament: v.parliament,
            session: v.session,
            sitting: v.sitting,
            date: v.date,
            description_english: v.description,
            description_french: String::new(),
            decision: v.decision,
            related_bill: v.related_bill,
            total_yeas: v.total_yeas,
            total_nays: v.total_nays,
            total_paired: v.total_paired,
        }
    }
}

pub struct FeedNormalizer {
    related_bill: Regex,
}

impl FeedNormalizer {
    pub fn new() -> Result<Self> {
        let related_bill = Regex::new(RELATED_BILL_ATTR)
            .map_err(|err| IngestError::Config(format!("related bill pattern: {err}")))?;
        Ok(Self { related_bill })
    }

    /// Rewrites attribute-style related bills into element text.
    ///
    /// Already-rewritten input is returned untouched.
    pub fn rewrite_related_bills<'a>(&self, xml: &'a str) -> Cow<'a, str> {
        self.related_bill
            .replace_all(xml, "<RelatedBill>$1</RelatedBill>")
    }

    /// Decodes the payload into votes in document order (newest first).
    pub fn normalize(&self, raw: &[u8]) -> Result<Vec<VoteRecord>> {
        let xml = std::str::from_utf8(raw)
            .map_err(|err| IngestError::MalformedFeed(format!("payload is not UTF-8: {err}")))?;
        let repaired = self.rewrite_related_bills(xml);
        check_root(&repaired)?;
        let document: FeedDocument = quick_xml::de::from_str(&repaired)?;

        debug!(votes = document.votes.len(), "decoded vote list");
        Ok(document.votes.into_iter().map(VoteRecord::from).collect())
    }
}

/// Fails unless the first element of the document is `<Votes>`.
fn check_root(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    loop {
        let event = reader
            .read_event()
            .map_err(|err| IngestError::MalformedFeed(err.to_string()))?;
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                return if name.as_ref() == ROOT_ELEMENT.as_bytes() {
                    Ok(())
                } else {
                    Err(IngestError::MalformedFeed(format!(
                        "root element is <{}>, expected <{ROOT_ELEMENT}>",
                        String::from_utf8_lossy(name.as_ref())
                    )))
                };
            }
            Event::Eof => {
                return Err(IngestError::MalformedFeed("document has no root element".into()));
            }
            _ => {}
        }
    }
}
