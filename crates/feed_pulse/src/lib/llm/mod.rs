pub mod fallback;
pub mod gemini;
pub mod rate_limiter;
pub mod summarizer;
