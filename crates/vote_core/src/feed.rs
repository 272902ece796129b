//! Where the raw vote list comes from.

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{IngestError, Result};

pub trait FeedSource {
    /// One blocking fetch of the whole document.
    fn fetch(&self) -> Result<Vec<u8>>;
}

pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| IngestError::Fetch(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl FeedSource for HttpFeedSource {
    #[instrument(skip(self), fields(url = %self.url))]
    fn fetch(&self) -> Result<Vec<u8>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|err| IngestError::Fetch(err.to_string()))?;

        debug!(bytes = body.len(), "fetched vote list");
        Ok(body.to_vec())
    }
}
