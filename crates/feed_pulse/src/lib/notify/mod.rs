pub mod telegram;

use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

pub trait Notifier {
    /// Checks credentials and access to the destination channel
    fn check_reachable(&self) -> impl Future<Output = bool>;

    fn post(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>>;
}
