//! `index.html`, rendered from `index.html` in the template directory.

use anyhow::Result;
use minijinja::{Environment, context, path_loader};
use std::path::{Path, PathBuf};
use time::Date;
use time::macros::format_description;
use tracing::info;

use vote_core::VoteRecord;
use vote_core::config::SiteConfig;
use vote_core::pipeline::Renderer;

use crate::site::{render_error, write_artifact};

pub const INDEX_TEMPLATE: &str = "index.html";

/// `2012-03-28` → `Wednesday, March 28, 2012`. Unparseable input is returned
/// as is.
pub fn format_date(value: String) -> String {
    let input = format_description!("[year]-[month]-[day]");
    let output = format_description!("[weekday], [month repr:long] [day padding:none], [year]");
    Date::parse(&value, &input)
        .ok()
        .and_then(|date| date.format(&output).ok())
        .unwrap_or(value)
}

pub fn first_letter(value: String) -> String {
    value.chars().next().map(String::from).unwrap_or_default()
}

pub fn booleanize(decision: String) -> String {
    let vote = if decision == "Agreed to" { "Yea" } else { "Nay" };
    vote.to_string()
}

pub fn environment(template_dir: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(template_dir.to_path_buf()));
    env.add_filter("format_date", format_date);
    env.add_filter("first_letter", first_letter);
    env.add_filter("booleanize", booleanize);
    env
}

pub fn render_index(env: &Environment<'_>, site: &SiteConfig, votes: &[VoteRecord]) -> Result<String> {
    let template = env.get_template(INDEX_TEMPLATE)?;
    let html = template.render(context! { site => site, votes => votes })?;
    Ok(html)
}

pub struct HtmlRenderer {
    env: Environment<'static>,
    path: PathBuf,
    site: SiteConfig,
}

impl HtmlRenderer {
    pub fn new(template_dir: &Path, path: PathBuf, site: SiteConfig) -> Self {
        Self {
            env: environment(template_dir),
            path,
            site,
        }
    }
}

impl Renderer for HtmlRenderer {
    fn name(&self) -> &str {
        "html"
    }

    fn render(&self, latest: &[VoteRecord]) -> vote_core::Result<()> {
        let html = render_index(&self.env, &self.site, latest).map_err(render_error)?;
        write_artifact(&self.path, html)?;
        info!(votes = latest.len(), "Rendered HTML page");
        Ok(())
    }
}
