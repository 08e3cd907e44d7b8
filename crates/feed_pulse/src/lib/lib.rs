mod error;
mod http;
mod llm;
pub mod notify;
pub mod parser;
mod processor;
pub mod retry;
pub mod tracing;
pub mod types;
pub mod yt;

pub use error::Error;
pub use llm::{
    fallback::{FallbackSummarizer, GenerativeModel},
    gemini,
    rate_limiter::RateLimiter,
    summarizer::{SummarizeError, Summarizer, SummaryResponse},
};
pub use processor::{
    builder::FeedProcessorBuilder, new_item_message, summary_unavailable_message, BatchReport,
    FeedProcessor, ProcessOutcome, RunOutcome,
};
