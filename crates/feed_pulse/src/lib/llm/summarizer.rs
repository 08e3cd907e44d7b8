use std::{fmt::Display, future::Future};

pub trait Summarizer {
    type Error: Display;

    /// Summarizes a transcript; `title` is passed along as context
    fn summarize(
        &self,
        transcript: &str,
        title: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>>;
}

#[derive(Debug, Clone)]
pub struct SummaryResponse {
    pub summary: String,
    /// Model that produced the summary
    pub model: String,
}

/// Failure of a single model call, classified at the transport boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    #[error("Content too long for model {model}")]
    ContentTooLong { model: String },
    #[error("Transient error from model {model}: {message}")]
    Transient { model: String, message: String },
    #[error("Summary generation failed: {0}")]
    Failed(String),
}

impl SummarizeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SummarizeError::Transient { .. })
    }
}
