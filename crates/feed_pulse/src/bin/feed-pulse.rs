use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::Context;
use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use cron::Schedule;
use feed_datastore::{DataStore, MemoryDataStore, PgDataStore};
use feed_pulse::{
    gemini::GeminiClient,
    notify::telegram::TelegramNotifier,
    tracing::init_tracing_subscriber,
    types::Channel,
    yt::{scraper::Scraper, transcript::YtTranscriptSource},
    FallbackSummarizer, FeedProcessorBuilder, RunOutcome,
};

#[derive(Parser)]
#[command(
    name = "feed-pulse",
    about = "Announces new YouTube uploads on Telegram with an AI summary"
)]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL", required_unless_present = "ephemeral")]
    database_url: Option<String>,

    /// Keep state in memory only; nothing survives the process
    #[arg(long)]
    ephemeral: bool,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN")]
    telegram_token: String,

    /// Telegram chat or channel id
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: String,

    /// Google Generative Language API key
    #[arg(long, env = "GENAI_API_KEY")]
    genai_api_key: String,

    /// Primary summarization model
    #[arg(long, env = "AI_MODEL")]
    ai_model: String,

    /// Model used when a transcript is too long for the primary one
    #[arg(long, env = "ALT_AI_MODEL", default_value = "gemini-exp-1206")]
    alt_ai_model: String,

    /// File holding the summarization system prompt
    #[arg(long, env = "SYSTEM_PROMPT_PATH")]
    system_prompt_path: Option<PathBuf>,

    /// Monitored channels as NAME=CHANNEL_ID
    #[arg(long = "channel", env = "CHANNELS", value_delimiter = ',', required = true)]
    channels: Vec<Channel>,

    /// Transcript languages, in order of preference
    #[arg(
        long,
        env = "TRANSCRIPT_LANGUAGES",
        value_delimiter = ',',
        default_value = "it,en"
    )]
    languages: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 */30 * * * *")]
        schedule: String,
    },
}

#[derive(Clone)]
struct Config {
    database_url: Option<String>,
    // shared across cron ticks when running ephemeral
    memory_store: Option<Arc<MemoryDataStore>>,
    telegram_token: String,
    telegram_chat_id: String,
    genai_api_key: String,
    ai_model: String,
    alt_ai_model: String,
    system_prompt: String,
    channels: Vec<Channel>,
    languages: Vec<String>,
}

fn load_system_prompt(path: Option<&PathBuf>) -> String {
    let Some(path) = path else {
        return GeminiClient::SYSTEM_PROMPT.to_string();
    };

    match std::fs::read_to_string(path) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to read system prompt, using the built-in one"
            );
            GeminiClient::SYSTEM_PROMPT.to_string()
        }
    }
}

async fn run_with_store<D>(config: &Config, store: D) -> anyhow::Result<RunOutcome>
where
    D: DataStore + Send + Sync + 'static,
{
    let gemini = GeminiClient::new(&config.genai_api_key)
        .with_system_instruction(&config.system_prompt);
    let summarizer = FallbackSummarizer::new(
        gemini.model(&config.ai_model),
        gemini.model(&config.alt_ai_model),
    );
    let transcript_source = YtTranscriptSource::new()?;
    let notifier = TelegramNotifier::new(&config.telegram_token, &config.telegram_chat_id);

    let processor = FeedProcessorBuilder::new()
        .store(store)
        .transcript_source(transcript_source)
        .summarizer(summarizer)
        .notifier(notifier)
        .channel_scraper(Scraper::default())
        .channels(config.channels.clone())
        .languages(config.languages.clone())
        .build();

    processor.run_once().await
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let outcome = match &config.memory_store {
        Some(store) => run_with_store(config, store.clone()).await?,
        None => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL not set")?;
            run_with_store(config, PgDataStore::connect_lazy(database_url)?).await?
        }
    };

    match outcome {
        RunOutcome::NotifierUnreachable => {
            tracing::error!("Run skipped: Telegram is not reachable with the configured bot");
        }
        outcome => {
            if let Some(report) = outcome.report() {
                tracing::info!(
                    handled = report.handled(),
                    succeeded = report.succeeded.len(),
                    summary_failed = report.summary_failed.len(),
                    errored = report.errored.len(),
                    "Run finished"
                );
            }
        }
    }

    Ok(())
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        channels = config.channels.len(),
        "Running scheduled pipeline..."
    );
    run_pipeline(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = Config {
        database_url: cli.database_url,
        memory_store: cli.ephemeral.then(|| Arc::new(MemoryDataStore::new())),
        telegram_token: cli.telegram_token,
        telegram_chat_id: cli.telegram_chat_id,
        genai_api_key: cli.genai_api_key,
        ai_model: cli.ai_model,
        alt_ai_model: cli.alt_ai_model,
        system_prompt: load_system_prompt(cli.system_prompt_path.as_ref()),
        channels: cli.channels,
        languages: cli.languages,
    };

    match cli.command {
        Command::Run => {
            tracing::info!(channels = config.channels.len(), "Running pipeline once...");
            run_pipeline(&config).await?;
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("feed-pulse-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
