#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Feed parse error: {0}")]
    ParseError(&'static str),
    #[error("Invalid channel entry '{0}', expected NAME=CHANNEL_ID")]
    InvalidChannel(String),
}
