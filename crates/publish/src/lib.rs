//! Static artifacts built from the latest stored votes: a JSONP feed, an RSS
//! channel and the front page.

pub mod html;
pub mod json;
pub mod rss;
pub mod site;

pub use site::{SitePaths, renderers};
