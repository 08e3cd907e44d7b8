pub mod scraper;
pub mod transcript;

use std::{fmt::Display, future::Future};

use crate::parser::YtFeedDocument;

pub trait ChannelScraper {
    const FEED_URL: &str;

    /// Downloads the uploads feed of `channel_id`
    fn scrape_feed(&self, channel_id: &str) -> impl Future<Output = anyhow::Result<YtFeedDocument>>;
}

pub trait TranscriptSource {
    type Error: Display;

    /// Fetches the transcript of `video_id` in `language`.
    ///
    /// `Ok(None)` means the video has no transcript in that language, which is
    /// not an error.
    fn fetch_transcript(
        &self,
        video_id: &str,
        language: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>>;

    /// Tries each language in order, returning the first transcript found
    fn fetch_preferred(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> {
        async move {
            for language in languages {
                if let Some(transcript) = self.fetch_transcript(video_id, language).await? {
                    tracing::info!(%video_id, %language, "Transcript found");
                    return Ok(Some(transcript));
                }
                tracing::info!(%video_id, %language, "No transcript in language");
            }
            Ok(None)
        }
    }
}
