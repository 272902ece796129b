//! Runtime configuration.
//!
//! Settings live in a TOML file; secrets come from the environment, which may
//! be seeded from a `.env` file in the working directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::schema::VoteRecord;
use crate::split::CorrectionTable;

pub const DEFAULT_CONFIG_FILE: &str = "todays-vote.toml";
pub const TRANSLATOR_KEY_VAR: &str = "TRANSLATOR_KEY";
pub const BUFFER_TOKEN_VAR: &str = "BUFFER_ACCESS_TOKEN";

const DEFAULT_FEED_URL: &str =
    "http://www.parl.gc.ca/HouseChamberBusiness/Chambervotelist.aspx?Language=E&xml=True";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed_url: String,
    pub database_path: PathBuf,
    pub output_dir: PathBuf,
    pub template_dir: PathBuf,
    pub latest_count: usize,
    pub batch_limit: Option<usize>,
    pub http_timeout_secs: u64,
    pub site: SiteConfig,
    pub translator: TranslatorConfig,
    pub social: SocialConfig,
    pub corrections: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            database_path: PathBuf::from("todays-vote.sqlite3"),
            output_dir: PathBuf::from("public"),
            template_dir: PathBuf::from("templates"),
            latest_count: 10,
            batch_limit: None,
            http_timeout_secs: 30,
            site: SiteConfig::default(),
            translator: TranslatorConfig::default(),
            social: SocialConfig::default(),
            corrections: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub link: String,
    pub description: String,
    pub bill_url_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Today's Vote".to_string(),
            link: "http://www.todaysvote.ca".to_string(),
            description: "Stay up to date with what Canada's House of Commons is voting on each day."
                .to_string(),
            bill_url_prefix: "http://www.parl.gc.ca/LegisInfo/BillDetails.aspx?Mode=1&Language=E&bill="
                .to_string(),
        }
    }
}

impl SiteConfig {
    pub fn vote_link(&self, vote: &VoteRecord) -> String {
        vote.link(&self.bill_url_prefix, &self.link)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub to: String,
    pub region: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.cognitive.microsofttranslator.com".to_string(),
            to: "fr".to_string(),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub endpoint: String,
    pub profile_id: Option<String>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.bufferapp.com/1".to_string(),
            profile_id: None,
        }
    }
}

/// What the pipeline itself needs out of [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub latest_count: usize,
    pub batch_limit: Option<usize>,
    pub corrections: CorrectionTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            latest_count: 10,
            batch_limit: None,
            corrections: CorrectionTable::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|err| IngestError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|err| IngestError::Config(err.to_string()))?;
        if config.latest_count == 0 {
            return Err(IngestError::Config("latest_count must be at least 1".into()));
        }
        if config.batch_limit == Some(0) {
            return Err(IngestError::Config("batch_limit must be at least 1 when set".into()));
        }
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            latest_count: self.latest_count,
            batch_limit: self.batch_limit,
            corrections: CorrectionTable::default().extended(self.corrections.clone()),
        }
    }
}

/// Loads `.env` into the process environment if one is present.
pub fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded environment file");
            Ok(())
        }
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(IngestError::Config(format!(".env: {err}"))),
    }
}

/// Reads a required secret from the environment.
pub fn secret(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| IngestError::Config(format!("{var} is not set")))
}
