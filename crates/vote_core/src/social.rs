//! Announcing freshly stored votes.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::cell::OnceCell;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::SiteConfig;
use crate::error::{IngestError, Result};
use crate::schema::VoteRecord;

pub trait SocialPoster {
    /// Queues one post for a vote that is already committed.
    fn post(&self, vote: &VoteRecord) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPoster;

impl SocialPoster for NoopPoster {
    fn post(&self, _vote: &VoteRecord) -> Result<()> {
        Ok(())
    }
}

/// Text of the post: the shortened description followed by the vote link.
pub fn post_text(vote: &VoteRecord, site: &SiteConfig) -> String {
    format!("{} {}", vote.short_description(), site.vote_link(vote))
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
}

/// Buffer update queue client.
pub struct BufferPoster {
    client: Client,
    endpoint: String,
    access_token: String,
    profile_id: OnceCell<String>,
    site: SiteConfig,
}

impl BufferPoster {
    pub fn new(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        profile_id: Option<String>,
        site: SiteConfig,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| IngestError::Social(err.to_string()))?;
        let cell = OnceCell::new();
        if let Some(id) = profile_id {
            let _ = cell.set(id);
        }
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            profile_id: cell,
            site,
        })
    }

    /// Configured profile, or the first profile on the account.
    fn profile_id(&self) -> Result<&str> {
        if let Some(id) = self.profile_id.get() {
            return Ok(id);
        }

        let profiles: Vec<Profile> = self
            .client
            .get(format!("{}/profiles.json", self.endpoint))
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(|err| IngestError::Social(err.to_string()))?;

        let first = profiles
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::Social("account has no profiles".into()))?;
        debug!(profile = %first.id, "resolved social profile");
        Ok(self.profile_id.get_or_init(|| first.id))
    }
}

impl SocialPoster for BufferPoster {
    #[instrument(skip(self, vote), fields(parliament = vote.parliament, number = vote.number))]
    fn post(&self, vote: &VoteRecord) -> Result<()> {
        let profile = self.profile_id()?;
        let text = post_text(vote, &self.site);
        let link = self.site.vote_link(vote);

        self.client
            .post(format!("{}/updates/create.json", self.endpoint))
            .form(&[
                ("access_token", self.access_token.as_str()),
                ("text", text.as_str()),
                ("profile_ids[]", profile),
                ("media[link]", link.as_str()),
                ("shorten", "true"),
                ("now", "false"),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| IngestError::Social(err.to_string()))?;
        Ok(())
    }
}
