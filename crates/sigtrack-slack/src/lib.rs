//! Escalation delivery to a Slack incoming webhook.
//!
//! [`Escalator`] validates a request, posts a Block Kit message with bounded
//! exponential back-off, and falls back to the local escalation log when no
//! webhook is configured.

pub mod client;
pub mod error;
pub mod escalator;
pub mod message;
pub mod retry;

pub use client::SlackClient;
pub use error::SlackError;
pub use escalator::{EscalationOutcome, EscalationRequest, EscalationResult, Escalator};
pub use message::{format_message, Attribution, Block, SlackMessage, Text};
pub use retry::RetryPolicy;
