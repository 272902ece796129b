use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use vote_core::IngestError;
use vote_core::config::SiteConfig;
use vote_core::pipeline::Renderer;

use crate::html::HtmlRenderer;
use crate::json::JsonFeedRenderer;
use crate::rss::RssRenderer;

pub struct SitePaths {
    pub root: PathBuf,
    pub json_feed: PathBuf,
    pub rss_feed: PathBuf,
    pub index_page: PathBuf,
}

impl SitePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            json_feed: root.join("feed.json"),
            rss_feed: root.join("feed.xml"),
            index_page: root.join("index.html"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// The three artifact renderers writing under `output_dir`.
pub fn renderers(
    site: &SiteConfig,
    output_dir: &Path,
    template_dir: &Path,
) -> Result<Vec<Box<dyn Renderer>>> {
    let paths = SitePaths::new(output_dir);
    paths.ensure()?;

    Ok(vec![
        Box::new(JsonFeedRenderer::new(paths.json_feed, site.clone())),
        Box::new(RssRenderer::new(paths.rss_feed, site.clone())),
        Box::new(HtmlRenderer::new(template_dir, paths.index_page, site.clone())),
    ])
}

/// Writes `contents` to `path`, reporting failures as render errors.
pub(crate) fn write_artifact(path: &Path, contents: impl AsRef<[u8]>) -> vote_core::Result<()> {
    let contents = contents.as_ref();
    fs::write(path, contents)
        .map_err(|err| IngestError::Render(format!("{}: {err}", path.display())))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
    Ok(())
}

pub(crate) fn render_error(err: anyhow::Error) -> IngestError {
    IngestError::Render(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_root() {
        let paths = SitePaths::new("public");
        assert_eq!(paths.json_feed, PathBuf::from("public/feed.json"));
        assert_eq!(paths.rss_feed, PathBuf::from("public/feed.xml"));
        assert_eq!(paths.index_page, PathBuf::from("public/index.html"));
    }

    #[test]
    fn builds_all_renderers_and_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("public");
        let list = renderers(&SiteConfig::default(), &out, dir.path()).unwrap();
        let names: Vec<&str> = list.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["json", "rss", "html"]);
        assert!(out.is_dir());
    }
}
