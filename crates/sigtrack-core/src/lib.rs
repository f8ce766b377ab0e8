//! Domain types and configuration shared by the sigtrack crates.
//!
//! A [`Signal`] is the compact record written after each meaningful
//! interaction; an [`EscalationRecord`] is written only when an escalation
//! could not be delivered to the webhook.

pub mod app_config;
pub mod config;
pub mod escalation;
pub mod signal;
pub mod timestamp;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use escalation::{EscalationRecord, SignalType};
pub use signal::{Sentiment, Signal};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown {kind} \"{value}\" (expected one of: {expected})")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("invalid timestamp \"{0}\"")]
    InvalidTimestamp(String),
}
