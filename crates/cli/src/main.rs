use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vote_core::config::{self, AppConfig};
use vote_core::db::SqliteVoteStore;
use vote_core::feed::HttpFeedSource;
use vote_core::pipeline::{IngestionPipeline, RunReport};
use vote_core::social::BufferPoster;
use vote_core::translate::HttpTranslator;

#[derive(Parser)]
#[command(name = "todays-vote")]
#[command(about = "Today's Vote: House of Commons vote feed worker", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest new votes with translation and social posts, then render
    Run,
    /// Ingest new votes without translation or social posts, then render
    Digest,
    /// Re-render the artifacts from stored votes only
    Render,
    /// Serve the output directory over HTTP
    Serve {
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for published types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Worker,
    Digest,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Run => ingest(&config, Mode::Worker),
        Commands::Digest => ingest(&config, Mode::Digest),
        Commands::Render => render(&config),
        Commands::Serve { port } => serve(&config.output_dir, port),
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
    }
}

fn build_pipeline(config: &AppConfig, mode: Mode) -> Result<IngestionPipeline> {
    let timeout = config.http_timeout();
    let source = HttpFeedSource::new(&config.feed_url, timeout)?;
    let store = SqliteVoteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let mut pipeline =
        IngestionPipeline::new(config.pipeline_config(), Box::new(source), Box::new(store))?;

    if mode == Mode::Worker {
        let translator = HttpTranslator::new(
            &config.translator.endpoint,
            &config.translator.to,
            config::secret(config::TRANSLATOR_KEY_VAR)?,
            config.translator.region.clone(),
            timeout,
        )?;
        let poster = BufferPoster::new(
            &config.social.endpoint,
            config::secret(config::BUFFER_TOKEN_VAR)?,
            config.social.profile_id.clone(),
            config.site.clone(),
            timeout,
        )?;
        pipeline = pipeline
            .with_translator(Box::new(translator))
            .with_poster(Box::new(poster));
    }

    for renderer in publish::renderers(&config.site, &config.output_dir, &config.template_dir)? {
        pipeline = pipeline.with_renderer(renderer);
    }
    Ok(pipeline)
}

fn ingest(config: &AppConfig, mode: Mode) -> Result<()> {
    let mut pipeline = build_pipeline(config, mode)?;
    let report = pipeline.run()?;
    log_report(mode, &report);
    Ok(())
}

fn log_report(mode: Mode, report: &RunReport) {
    info!(
        mode = ?mode,
        watermark = %report.watermark,
        fetched = report.fetched,
        inserted = report.inserted,
        split_misses = report.split_misses,
        posted = report.posted,
        post_failures = report.post_failures,
        render_failures = report.render_failures,
        "run complete"
    );
}

fn render(config: &AppConfig) -> Result<()> {
    let pipeline = build_pipeline(config, Mode::Digest)?;
    let failures = pipeline.render_latest();
    if failures > 0 {
        anyhow::bail!("{failures} renderer(s) failed");
    }
    info!(output = %config.output_dir.display(), "rendered artifacts");
    Ok(())
}

fn serve(root: &Path, port: u16) -> Result<()> {
    use tower_http::compression::CompressionLayer;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    let app = axum::Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, root = %root.display(), "serving static site");
        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    // Export VoteRecord schema
    let vote_schema = schema_for!(vote_core::VoteRecord);
    let vote_json = serde_json::to_string_pretty(&vote_schema)?;
    fs::write(out_dir.join("VoteRecord.schema.json"), vote_json)?;

    // Export JsonFeed schema
    let feed_schema = schema_for!(publish::json::JsonFeed);
    let feed_json = serde_json::to_string_pretty(&feed_schema)?;
    fs::write(out_dir.join("JsonFeed.schema.json"), feed_json)?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
