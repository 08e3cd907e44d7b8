pub mod channel_scraper;
pub mod datastore;
pub mod notifier;
pub mod summarizer;
pub mod transcript_source;
