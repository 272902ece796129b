//! `feed.json`: the latest votes wrapped in a `jsonVoteFeed(...)` callback.

use anyhow::Result;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use vote_core::VoteRecord;
use vote_core::config::SiteConfig;
use vote_core::pipeline::Renderer;

use crate::site::{render_error, write_artifact};

pub const CALLBACK: &str = "jsonVoteFeed";

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct JsonFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<VoteRecord>,
}

impl JsonFeed {
    pub fn new(site: &SiteConfig, items: &[VoteRecord]) -> Self {
        Self {
            title: site.title.clone(),
            link: site.link.clone(),
            description: site.description.clone(),
            items: items.to_vec(),
        }
    }
}

pub fn render_json(feed: &JsonFeed) -> Result<String> {
    let body = serde_json::to_string_pretty(feed)?;
    Ok(format!("{CALLBACK}({body})"))
}

pub struct JsonFeedRenderer {
    path: PathBuf,
    site: SiteConfig,
}

impl JsonFeedRenderer {
    pub fn new(path: PathBuf, site: SiteConfig) -> Self {
        Self { path, site }
    }
}

impl Renderer for JsonFeedRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, latest: &[VoteRecord]) -> vote_core::Result<()> {
        let body = render_json(&JsonFeed::new(&self.site, latest)).map_err(render_error)?;
        write_artifact(&self.path, body)?;
        info!(votes = latest.len(), "Rendered JSON feed");
        Ok(())
    }
}
