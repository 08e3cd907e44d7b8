pub mod builder;

use anyhow::Context;
use feed_datastore::{DataStore, SummaryState};
use tracing::Instrument;

use crate::{
    notify::Notifier,
    types::{Channel, VideoInfo},
    yt::{ChannelScraper, TranscriptSource},
    Summarizer,
};

/// How a single item left [`FeedProcessor::process`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A summary was already cached and has been re-delivered
    Cached,
    Summarized,
    /// The video has no transcript; only the bare announcement was sent and
    /// the attempt is recorded so recovery scans skip it
    NoTranscript,
    /// Summarization failed; the failure is cached for a later retry
    SummaryFailed { reason: String },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ProcessOutcome::SummaryFailed { .. })
    }
}

/// Per-item results of one batch, by item id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub summary_failed: Vec<String>,
    pub errored: Vec<String>,
}

impl BatchReport {
    /// Number of items the batch attempted
    pub fn handled(&self) -> usize {
        self.succeeded.len() + self.summary_failed.len() + self.errored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handled() == 0
    }

    fn record(&mut self, item_id: &str, result: anyhow::Result<ProcessOutcome>) {
        match result {
            Ok(outcome) if outcome.is_success() => self.succeeded.push(item_id.to_string()),
            Ok(_) => self.summary_failed.push(item_id.to_string()),
            Err(e) => {
                tracing::error!(error = ?e, %item_id, "Failed to process item");
                self.errored.push(item_id.to_string());
            }
        }
    }
}

/// Which category of work a run drained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The notifier could not be reached; nothing was done
    NotifierUnreachable,
    Unprocessed(BatchReport),
    PendingRetry(BatchReport),
    NewItems(BatchReport),
}

impl RunOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            RunOutcome::NotifierUnreachable => None,
            RunOutcome::Unprocessed(report)
            | RunOutcome::PendingRetry(report)
            | RunOutcome::NewItems(report) => Some(report),
        }
    }
}

pub fn new_item_message(video: &VideoInfo) -> String {
    format!(
        "📢 New video from {}!\n🎥 {}\n🔗 {}",
        video.channel_name, video.title, video.link
    )
}

pub fn summary_unavailable_message(video: &VideoInfo) -> String {
    format!("❌ Summary not available for: {}", video.title)
}

/// Watches YouTube channels and announces every new video on the notifier,
/// followed by a summary of its transcript.
///
/// Items are handled strictly one at a time.
#[derive(Debug)]
pub struct FeedProcessor<D, T, S, N, P>
where
    D: DataStore + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    P: ChannelScraper + Send + Sync + 'static,
{
    store: D,
    transcript_source: T,
    summarizer: S,
    notifier: N,
    channel_scraper: P,
    channels: Vec<Channel>,
    languages: Vec<String>,
}

impl<D, T, S, N, P> FeedProcessor<D, T, S, N, P>
where
    D: DataStore + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
    P: ChannelScraper + Send + Sync + 'static,
{
    /// Posts a message; delivery failures are logged and otherwise ignored
    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.post(text).await {
            tracing::warn!(error = %e, "Failed to deliver notification");
        }
    }

    /// Announces `video` and delivers its summary, summarizing on demand.
    ///
    /// Summarization failures are cached and reported as
    /// [`ProcessOutcome::SummaryFailed`]. Transcript source and persistence
    /// errors are returned.
    #[tracing::instrument(skip(self, video), fields(item_id = %video.item_id, channel = %video.channel_name))]
    pub async fn process(&self, video: &VideoInfo) -> anyhow::Result<ProcessOutcome> {
        let cached = self
            .store
            .get_cache_entry(&video.item_id)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to read cache entry"))
            .context("Failed to read cache entry")?;

        if let Some(SummaryState::Ok(summary)) = cached.as_ref().map(|entry| &entry.summary) {
            tracing::info!("Using cached summary");
            self.notify(&new_item_message(video)).await;
            self.notify(summary).await;
            return Ok(ProcessOutcome::Cached);
        }

        let transcript = match video
            .transcript
            .clone()
            .or_else(|| {
                cached
                    .filter(|entry| entry.summary.needs_reprocessing())
                    .map(|entry| entry.transcript)
            })
        {
            Some(transcript) => Some(transcript),
            None => self
                .transcript_source
                .fetch_preferred(&video.item_id, &self.languages)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to fetch transcript: {e}"))?,
        };

        let Some(transcript) = transcript else {
            tracing::info!("No transcript available, announcing without summary");
            self.store
                .put_cache_entry(&video.item_id, "", &SummaryState::NoTranscript)
                .await
                .inspect_err(|e| tracing::error!(error = ?e, "Failed to record missing transcript"))
                .context("Failed to record missing transcript")?;

            self.notify(&new_item_message(video)).await;
            return Ok(ProcessOutcome::NoTranscript);
        };

        self.store
            .put_cache_entry(&video.item_id, &transcript, &SummaryState::Pending)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to cache transcript"))
            .context("Failed to cache transcript")?;

        match self.summarizer.summarize(&transcript, &video.title).await {
            Ok(resp) => {
                tracing::info!(model = %resp.model, "Summary generated");
                self.store
                    .put_cache_entry(
                        &video.item_id,
                        &transcript,
                        &SummaryState::Ok(resp.summary.clone()),
                    )
                    .await
                    .inspect_err(|e| tracing::error!(error = ?e, "Failed to cache summary"))
                    .context("Failed to cache summary")?;

                self.notify(&new_item_message(video)).await;
                self.notify(&resp.summary).await;
                Ok(ProcessOutcome::Summarized)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "Summary generation failed");
                self.store
                    .put_cache_entry(
                        &video.item_id,
                        &transcript,
                        &SummaryState::Failed(reason.clone()),
                    )
                    .await
                    .inspect_err(|e| tracing::error!(error = ?e, "Failed to cache summary failure"))
                    .context("Failed to cache summary failure")?;

                self.notify(&new_item_message(video)).await;
                self.notify(&summary_unavailable_message(video)).await;
                Ok(ProcessOutcome::SummaryFailed { reason })
            }
        }
    }

    async fn process_batch(&self, videos: Vec<VideoInfo>) -> BatchReport {
        let mut report = BatchReport::default();
        for video in videos {
            let result = self.process(&video).await;
            report.record(&video.item_id, result);
        }
        report
    }

    /// Processes videos that were detected but never cached, e.g. because a
    /// previous run stopped right after updating a channel pointer
    #[tracing::instrument(skip(self))]
    pub async fn process_unprocessed(&self) -> anyhow::Result<BatchReport> {
        let items = self
            .store
            .list_unprocessed()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to list unprocessed items"))
            .context("Failed to list unprocessed items")?;

        if !items.is_empty() {
            tracing::info!(count = items.len(), "Processing unprocessed items");
        }

        let videos = items.into_iter().map(VideoInfo::from).collect();
        Ok(self.process_batch(videos).await)
    }

    /// Retries summaries that failed or never completed, reusing the cached
    /// transcripts
    #[tracing::instrument(skip(self))]
    pub async fn process_pending(&self) -> anyhow::Result<BatchReport> {
        let items = self
            .store
            .list_pending_retry()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to list pending items"))
            .context("Failed to list pending items")?;

        if !items.is_empty() {
            tracing::info!(count = items.len(), "Retrying pending summaries");
        }

        let videos = items.into_iter().map(VideoInfo::from).collect();
        Ok(self.process_batch(videos).await)
    }

    /// Latest video of `channel` if it differs from the stored pointer; the
    /// pointer is moved to it
    async fn poll_channel(&self, channel: &Channel) -> anyhow::Result<Option<VideoInfo>> {
        let last_seen = self
            .store
            .get_pointer(&channel.id)
            .await
            .context("Failed to read channel pointer")?;

        let feed = self
            .channel_scraper
            .scrape_feed(&channel.id)
            .await?
            .parse()
            .context("Failed to parse channel feed")?;

        let Some(latest) = feed.entries.into_iter().next() else {
            tracing::debug!("Feed has no entries");
            return Ok(None);
        };

        if last_seen.as_deref() == Some(latest.video_id.as_str()) {
            return Ok(None);
        }

        let channel_name = feed.channel_title.unwrap_or_else(|| channel.name.clone());
        self.store
            .set_pointer(&channel.id, &latest.video_id, &channel_name)
            .await
            .context("Failed to update channel pointer")?;

        tracing::info!(video_id = %latest.video_id, title = %latest.title, "New video detected");
        Ok(Some(VideoInfo::from_feed_entry(
            latest,
            &channel_name,
            &channel.id,
        )))
    }

    /// Checks every configured channel for a new upload. Channels that fail
    /// are logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn poll_new_items(&self) -> anyhow::Result<Vec<VideoInfo>> {
        let mut videos = Vec::new();
        for channel in &self.channels {
            let span = tracing::info_span!("poll_channel", channel_id = %channel.id);
            match self.poll_channel(channel).instrument(span).await {
                Ok(Some(video)) => videos.push(video),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = ?e, channel = %channel, "Failed to poll channel");
                }
            }
        }
        Ok(videos)
    }

    /// Runs one pass of the pipeline.
    ///
    /// Videos never cached are handled first, then pending summaries, then new
    /// uploads; the first category with any work ends the run.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> anyhow::Result<RunOutcome> {
        if !self.notifier.check_reachable().await {
            tracing::error!("Notifier is not reachable, skipping run");
            return Ok(RunOutcome::NotifierUnreachable);
        }

        self.store
            .init_schema()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to initialize schema"))
            .context("Failed to initialize schema")?;

        let report = self.process_unprocessed().await?;
        if !report.is_empty() {
            tracing::info!(handled = report.handled(), "Handled unprocessed items");
            return Ok(RunOutcome::Unprocessed(report));
        }

        let report = self.process_pending().await?;
        if !report.is_empty() {
            tracing::info!(handled = report.handled(), "Handled pending summaries");
            return Ok(RunOutcome::PendingRetry(report));
        }

        let videos = self.poll_new_items().await?;
        if videos.is_empty() {
            tracing::info!("No new videos at this time");
        }
        Ok(RunOutcome::NewItems(self.process_batch(videos).await))
    }
}
