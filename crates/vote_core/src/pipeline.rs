//! One ingestion run, end to end.
//!
//! A run walks `Idle → Fetched → Normalized → Selected → Split → Persisted →
//! Rendered` and stops at the first fatal error. Nothing is written before
//! the persistence step, and nothing is announced before its transaction has
//! committed. Runs against the same store must not overlap: the watermark is
//! read outside the insert transaction.

use std::fmt;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::db::VoteStore;
use crate::error::{IngestError, Result};
use crate::feed::FeedSource;
use crate::normalize::FeedNormalizer;
use crate::schema::{VoteRecord, Watermark};
use crate::select::select_new;
use crate::social::{NoopPoster, SocialPoster};
use crate::split::{BilingualSplitter, SplitOutcome, first_word};
use crate::translate::{NoopTranslator, Translator};

/// Publishes the latest stored votes somewhere (a file, a page, ...).
pub trait Renderer {
    fn name(&self) -> &str;
    fn render(&self, latest: &[VoteRecord]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetched,
    Normalized,
    Selected,
    Split,
    Persisted,
    Rendered,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Stage::Idle => "idle",
            Stage::Fetched => "fetched",
            Stage::Normalized => "normalized",
            Stage::Selected => "selected",
            Stage::Split => "split",
            Stage::Persisted => "persisted",
            Stage::Rendered => "rendered",
            Stage::Failed => "failed",
        };
        write!(f, "{value}")
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub watermark: Watermark,
    pub fetched: usize,
    pub selected: usize,
    pub inserted: usize,
    pub split_misses: usize,
    pub posted: usize,
    pub post_failures: usize,
    pub render_failures: usize,
}

pub struct IngestionPipeline {
    config: PipelineConfig,
    normalizer: FeedNormalizer,
    splitter: BilingualSplitter,
    source: Box<dyn FeedSource>,
    store: Box<dyn VoteStore>,
    translator: Box<dyn Translator>,
    poster: Box<dyn SocialPoster>,
    renderers: Vec<Box<dyn Renderer>>,
    stage: Stage,
}

impl IngestionPipeline {
    /// A pipeline that neither translates nor posts; add those with the
    /// `with_*` builders.
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn FeedSource>,
        store: Box<dyn VoteStore>,
    ) -> Result<Self> {
        let splitter = BilingualSplitter::new(config.corrections.clone());
        Ok(Self {
            config,
            normalizer: FeedNormalizer::new()?,
            splitter,
            source,
            store,
            translator: Box::new(NoopTranslator),
            poster: Box::new(NoopPoster),
            renderers: Vec::new(),
            stage: Stage::Idle,
        })
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_poster(mut self, poster: Box<dyn SocialPoster>) -> Self {
        self.poster = poster;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn store(&self) -> &dyn VoteStore {
        self.store.as_ref()
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "pipeline stage");
        self.stage = next;
    }

    /// Runs every stage once. A fatal error leaves the pipeline `Failed` and
    /// the store untouched.
    #[instrument(skip(self))]
    pub fn run(&mut self) -> Result<RunReport> {
        self.stage = Stage::Idle;
        match self.run_stages() {
            Ok(report) => {
                self.advance(Stage::Idle);
                Ok(report)
            }
            Err(err) => {
                error!(stage = %self.stage, error = %err, "ingestion run aborted");
                self.stage = Stage::Failed;
                Err(err)
            }
        }
    }

    fn run_stages(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();

        let raw = self.source.fetch()?;
        self.advance(Stage::Fetched);

        let votes = self.normalizer.normalize(&raw)?;
        report.fetched = votes.len();
        self.advance(Stage::Normalized);

        report.watermark = self.store.current_watermark()?;
        let mut selected = select_new(votes, report.watermark, self.config.batch_limit);
        report.selected = selected.len();
        info!(
            watermark = %report.watermark,
            fetched = report.fetched,
            selected = report.selected,
            "selected new votes"
        );
        self.advance(Stage::Selected);

        report.split_misses = self.split_descriptions(&mut selected)?;
        self.advance(Stage::Split);

        // The feed leads with the newest vote; store oldest first so ids
        // follow the order the votes were held.
        selected.reverse();
        let ids = self.store.insert_all(&selected)?;
        for (vote, id) in selected.iter_mut().zip(ids) {
            vote.id = Some(id);
        }
        report.inserted = selected.len();
        info!("Inserted {} rows", report.inserted);
        self.advance(Stage::Persisted);

        let (posted, post_failures) = self.announce(&selected);
        report.posted = posted;
        report.post_failures = post_failures;

        report.render_failures = self.render_latest();
        self.advance(Stage::Rendered);

        Ok(report)
    }

    /// Splits each description using one translated pivot per vote. Returns
    /// how many descriptions kept no French half.
    fn split_descriptions(&self, votes: &mut [VoteRecord]) -> Result<usize> {
        if votes.is_empty() {
            return Ok(0);
        }

        let words: Vec<String> = votes
            .iter()
            .map(|vote| first_word(&vote.description_english).to_string())
            .collect();
        let pivots = self.translator.translate(&words)?;
        if pivots.len() != words.len() {
            return Err(IngestError::Translation(format!(
                "asked for {} words, got {}",
                words.len(),
                pivots.len()
            )));
        }
        info!(?words, ?pivots, "pivot words");

        let mut misses = 0;
        for (vote, pivot) in votes.iter_mut().zip(&pivots) {
            debug!(whole = %vote.description_english, "splitting description");
            let outcome = self.splitter.apply(vote, pivot);
            debug!(en = %vote.description_english, fr = %vote.description_french, "split");
            if outcome == SplitOutcome::Miss {
                misses += 1;
                if !pivot.is_empty() {
                    warn!(
                        parliament = vote.parliament,
                        number = vote.number,
                        pivot = %pivot,
                        "pivot not found, keeping whole description as English"
                    );
                }
            }
        }
        Ok(misses)
    }

    /// Posts each committed vote, oldest first. Failures are logged only.
    fn announce(&self, committed: &[VoteRecord]) -> (usize, usize) {
        let mut posted = 0;
        let mut failed = 0;
        for vote in committed {
            match self.poster.post(vote) {
                Ok(()) => posted += 1,
                Err(err) => {
                    failed += 1;
                    warn!(parliament = vote.parliament, number = vote.number, error = %err, "social post failed");
                }
            }
        }
        if !committed.is_empty() {
            info!("Pushed {posted} posts");
        }
        (posted, failed)
    }

    /// Hands the latest stored votes to every renderer and returns how many
    /// of them failed. Reading the store counts as one failure of each.
    pub fn render_latest(&self) -> usize {
        if self.renderers.is_empty() {
            return 0;
        }

        let latest = match self.store.latest(self.config.latest_count) {
            Ok(latest) => latest,
            Err(err) => {
                warn!(error = %err, "could not load latest votes for rendering");
                return self.renderers.len();
            }
        };

        let mut failures = 0;
        for renderer in &self.renderers {
            match renderer.render(&latest) {
                Ok(()) => debug!(renderer = renderer.name(), "renderer finished"),
                Err(err) => {
                    failures += 1;
                    warn!(renderer = renderer.name(), error = %err, "render failed");
                }
            }
        }
        failures
    }
}
