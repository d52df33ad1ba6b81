// Errors produced while fetching or decoding a remote feed.

use thiserror::Error;

/// A recoverable failure of a single poll cycle.
///
/// Neither variant is fatal to a poll session: the cycle is logged, reported
/// to the update consumer and retried on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Network or HTTP-level failure (connect error, non-2xx status, body read).
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// The response was received but did not have the expected shape.
    #[error("unexpected feed shape: {0}")]
    Parse(String),
}

impl FeedError {
    /// Short tag used in log fields and rendered failure notices.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Fetch { .. } => "fetch",
            FeedError::Parse(_) => "parse",
        }
    }
}
