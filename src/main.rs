use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use digest_core::dates::{day_window, parse_date_key, previous_day_window};
use digest_core::{CollectionWindow, DigestConfig};
use llm_interface::{ChatSettings, OpenAiProvider};
use pipeline::{refilter, Collector, Pipeline, StageOutcome, SummarizeRequest, Summarizer};
use reddit_client::RedditClient;
use storage::{DigestStore, FsBlobStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "reddit_digest=info,pipeline=info,reddit_client=info,llm_interface=info,storage=info,web=info";

#[derive(Debug, Parser)]
#[command(name = "reddit-digest", version, about = "Daily digest of AI subreddits")]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(long, env = "DIGEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch and filter a day's posts, then summarize them if enabled.
    Collect {
        /// Day to collect (YYYY-MM-DD). Defaults to yesterday.
        #[arg(long)]
        date: Option<String>,
    },
    /// Re-run the popularity filter over already collected posts.
    Filter {
        #[arg(long)]
        date: String,
    },
    /// Write the digest for a day whose posts are stored.
    Summarize {
        #[arg(long)]
        date: String,
    },
    /// Serve the published digests over HTTP.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = DigestConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let store = DigestStore::new(FsBlobStore::new(&config.storage.root));

    match cli.command {
        Command::Collect { date } => {
            let tz = config.timezone()?;
            let window = match date {
                Some(date) => day_window(parse_date_key(&date)?, tz)?,
                None => previous_day_window(Utc::now(), tz)?,
            };
            collect(&config, store, &window).await
        }
        Command::Filter { date } => {
            parse_date_key(&date)?;
            let filtered = refilter(&store, &date, config.filter.thresholds()).await?;
            info!(
                "Kept {} of {} posts for {}",
                filtered.total_posts_filtered, filtered.total_posts_collected, date
            );
            Ok(())
        }
        Command::Summarize { date } => {
            parse_date_key(&date)?;
            let summarizer = Summarizer::new(
                provider(&config)?,
                store,
                config.reddit.subreddits.clone(),
            );
            let report = summarizer.summarize(&SummarizeRequest::for_date(&date)).await?;
            info!(
                "Digest {} written ({} characters)",
                report.digest_key, report.digest_size
            );
            Ok(())
        }
        Command::Serve => {
            let state = web::AppState::new(store, config.reddit.subreddits.clone());
            web::serve(state, &config.bind_address()).await?;
            Ok(())
        }
    }
}

async fn collect(
    config: &DigestConfig,
    store: DigestStore<FsBlobStore>,
    window: &CollectionWindow,
) -> anyhow::Result<()> {
    let source = RedditClient::new(
        &config.reddit_credentials()?,
        config.reddit.max_posts_per_subreddit,
    )?;
    let collector = Collector::new(
        source,
        store.clone(),
        config.reddit.subreddits.clone(),
        config.filter.thresholds(),
    );

    let mut pipeline = Pipeline::new(collector);
    if config.schedule.trigger_summarize {
        pipeline = pipeline.with_summarizer(Summarizer::new(
            provider(config)?,
            store,
            config.reddit.subreddits.clone(),
        ));
    }

    let report = pipeline.run(window).await?;
    match &report.collect {
        StageOutcome::Completed(collected) => info!(
            "Collected {} posts for {}, {} kept",
            collected.total_posts_collected, collected.date, collected.total_posts_filtered
        ),
        StageOutcome::Skipped { reason } => info!("Collect skipped: {}", reason),
    }
    if let Some(digest) = &report.digest {
        info!("Digest published at {}", digest.digest_key);
    }
    Ok(())
}

fn provider(config: &DigestConfig) -> anyhow::Result<OpenAiProvider> {
    let settings = ChatSettings {
        model: config.llm.model.clone(),
        ..ChatSettings::default()
    };
    Ok(OpenAiProvider::with_settings(
        &config.llm_api_key()?,
        &config.llm.base_url,
        settings,
    )?)
}
