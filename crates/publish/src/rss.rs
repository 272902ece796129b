//! `feed.xml`: an RSS 2.0 channel with one item per vote.

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::PathBuf;
use time::Date;
use time::format_description::well_known::Rfc2822;
use time::macros::format_description;
use tracing::info;

use vote_core::VoteRecord;
use vote_core::config::SiteConfig;
use vote_core::pipeline::Renderer;

use crate::site::{render_error, write_artifact};

const FALLBACK_TITLE: &str = "Vote";

/// Midnight UTC of a `YYYY-MM-DD` vote date, RFC 2822 formatted.
pub fn pub_date(date: &str) -> Option<String> {
    let format = format_description!("[year]-[month]-[day]");
    let day = Date::parse(date, &format).ok()?;
    day.midnight().assume_utc().format(&Rfc2822).ok()
}

fn text_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn render_rss(site: &SiteConfig, votes: &[VoteRecord]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    text_element(&mut writer, "title", &site.title)?;
    text_element(&mut writer, "link", &site.link)?;
    text_element(&mut writer, "description", &site.description)?;

    for vote in votes {
        let title = if vote.has_related_bill() {
            vote.related_bill.as_str()
        } else {
            FALLBACK_TITLE
        };
        let description = format!("{}: {}", vote.decision, vote.description_english);

        writer.write_event(Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", title)?;
        text_element(&mut writer, "link", &site.vote_link(vote))?;
        text_element(&mut writer, "description", &description)?;
        if let Some(date) = pub_date(&vote.date) {
            text_element(&mut writer, "pubDate", &date)?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(writer.into_inner())
}

pub struct RssRenderer {
    path: PathBuf,
    site: SiteConfig,
}

impl RssRenderer {
    pub fn new(path: PathBuf, site: SiteConfig) -> Self {
        Self { path, site }
    }
}

impl Renderer for RssRenderer {
    fn name(&self) -> &str {
        "rss"
    }

    fn render(&self, latest: &[VoteRecord]) -> vote_core::Result<()> {
        let body = render_rss(&self.site, latest).map_err(render_error)?;
        write_artifact(&self.path, body)?;
        info!(votes = latest.len(), "Rendered RSS feed");
        Ok(())
    }
}
