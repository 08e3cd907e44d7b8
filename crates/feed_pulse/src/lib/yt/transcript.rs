use itertools::Itertools;
use yt_transcript_rs::{
    api::YouTubeTranscriptApi,
    errors::{CouldNotRetrieveTranscript, CouldNotRetrieveTranscriptReason},
};

use crate::{retry::Backoff, yt::TranscriptSource};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to initialize transcript api: {0}")]
    Init(String),
    #[error("Failed to fetch transcript for {video_id}: {message}")]
    Fetch { video_id: String, message: String },
}

/// Captions downloaded straight from YouTube's transcript endpoints
pub struct YtTranscriptSource {
    api: YouTubeTranscriptApi,
    backoff: Backoff,
}

impl YtTranscriptSource {
    pub fn new() -> Result<Self, TranscriptError> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| TranscriptError::Init(format!("{e:?}")))?;

        Ok(Self {
            api,
            backoff: Backoff::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    async fn fetch_once(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Option<String>, TranscriptError> {
        match self.api.fetch_transcript(video_id, &[language], false).await {
            Ok(transcript) => {
                let mut lines = Vec::new();
                for snippet in transcript {
                    lines.push(snippet.text);
                }
                let text = lines.iter().map(|l| l.trim()).join("\n");
                Ok(Some(text).filter(|t| !t.trim().is_empty()))
            }
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(TranscriptError::Fetch {
                video_id: video_id.to_string(),
                message: format!("{e:?}"),
            }),
        }
    }
}

/// Disabled captions and a missing language are final answers, not failures
fn is_missing(e: &CouldNotRetrieveTranscript) -> bool {
    matches!(
        e.reason,
        Some(CouldNotRetrieveTranscriptReason::TranscriptsDisabled)
            | Some(CouldNotRetrieveTranscriptReason::NoTranscriptFound { .. })
    )
}

impl TranscriptSource for YtTranscriptSource {
    type Error = TranscriptError;

    #[tracing::instrument(skip(self))]
    async fn fetch_transcript(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Option<String>, Self::Error> {
        self.backoff
            .retry(
                "Transcript fetch",
                move || self.fetch_once(video_id, language),
                |e| matches!(e, TranscriptError::Fetch { .. }),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch transcript"))
    }
}
