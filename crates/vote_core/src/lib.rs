//! Incremental ingestion of the House of Commons vote list.
//!
//! The flow is fetch, normalize, select what is newer than the stored
//! watermark, split each description into its English and French halves,
//! persist oldest-first in one transaction, then hand the latest votes to
//! the renderers.

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod select;
pub mod social;
pub mod split;
pub mod translate;

pub use error::{IngestError, Result};
pub use schema::{VoteRecord, Watermark};
