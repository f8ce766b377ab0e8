use thiserror::Error;

/// Errors returned while delivering to the webhook.
#[derive(Debug, Error)]
pub enum SlackError {
    /// Transport failure, timeout, or a non-2xx status from the webhook.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured webhook URL does not parse.
    #[error("invalid webhook URL: {0}")]
    InvalidUrl(String),
}
