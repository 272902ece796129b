//! Error taxonomy for an ingestion run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can go wrong while ingesting.
///
/// `Fetch`, `MalformedFeed`, `Translation` and `Persistence` abort the run
/// before anything is committed. `Render` and `Social` are reported by the
/// collaborators but the pipeline only logs and counts them.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    #[error("translation failed: {0}")]
    Translation(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("social post failed: {0}")]
    Social(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether this error must stop the current run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IngestError::Render(_) | IngestError::Social(_))
    }
}

impl From<rusqlite::Error> for IngestError {
    fn from(err: rusqlite::Error) -> Self {
        IngestError::Persistence(err.to_string())
    }
}

impl From<quick_xml::de::DeError> for IngestError {
    fn from(err: quick_xml::de::DeError) -> Self {
        IngestError::MalformedFeed(err.to_string())
    }
}
