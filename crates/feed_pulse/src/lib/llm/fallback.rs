use std::future::Future;

use crate::{
    llm::{
        rate_limiter::RateLimiter,
        summarizer::{SummarizeError, Summarizer, SummaryResponse},
    },
    retry::Backoff,
};

/// A single text generation backend
pub trait GenerativeModel {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, SummarizeError>>;
}

/// Summarizes with a primary model and falls back to an alternative one only
/// when the primary rejects the transcript as too long.
///
/// Every attempt on either model goes through the same [`RateLimiter`], and
/// transient failures are retried according to [`Backoff`].
#[derive(Debug)]
pub struct FallbackSummarizer<M> {
    primary: M,
    alternative: M,
    rate_limiter: RateLimiter,
    backoff: Backoff,
}

impl<M: GenerativeModel> FallbackSummarizer<M> {
    pub fn new(primary: M, alternative: M) -> Self {
        Self {
            primary,
            alternative,
            rate_limiter: RateLimiter::default(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    fn build_prompt(transcript: &str, title: &str) -> String {
        format!("Video title for additional context: \"{title}\".\nTranscript:\n{transcript}\n")
    }

    async fn call_model(&self, model: &M, prompt: &str) -> Result<String, SummarizeError> {
        self.backoff
            .retry(
                &format!("Summary generation with {}", model.name()),
                move || async move {
                    self.rate_limiter.acquire().await;
                    model.generate(prompt).await
                },
                SummarizeError::is_transient,
            )
            .await
    }
}

impl<M: GenerativeModel> Summarizer for FallbackSummarizer<M> {
    type Error = SummarizeError;

    #[tracing::instrument(skip(self, transcript), fields(primary = self.primary.name()))]
    async fn summarize(
        &self,
        transcript: &str,
        title: &str,
    ) -> Result<SummaryResponse, Self::Error> {
        let prompt = Self::build_prompt(transcript, title);

        match self.call_model(&self.primary, &prompt).await {
            Ok(summary) => Ok(SummaryResponse {
                summary,
                model: self.primary.name().to_string(),
            }),
            Err(SummarizeError::ContentTooLong { .. }) => {
                tracing::warn!(
                    alternative = self.alternative.name(),
                    "Transcript too long for primary model, trying alternative"
                );
                self.call_model(&self.alternative, &prompt)
                    .await
                    .map(|summary| SummaryResponse {
                        summary,
                        model: self.alternative.name().to_string(),
                    })
                    .map_err(|e| {
                        tracing::error!(error = %e, "Alternative model failed too");
                        SummarizeError::Failed(format!("Both models failed, last error: {e}"))
                    })
            }
            Err(e @ SummarizeError::Failed(_)) => Err(e),
            Err(e) => Err(SummarizeError::Failed(e.to_string())),
        }
    }
}
