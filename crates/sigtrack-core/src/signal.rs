use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The user's sentiment during an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Sentiment {
    Positive,
    Neutral,
    Frustrated,
    Angry,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Frustrated,
        Sentiment::Angry,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Frustrated => "frustrated",
            Sentiment::Angry => "angry",
        }
    }

    /// Frustrated and angry interactions count toward the negative ratio.
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, Sentiment::Frustrated | Sentiment::Angry)
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Sentiment {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sentiment::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "sentiment",
                value: s.to_string(),
                expected: Sentiment::ALL.map(Sentiment::as_str).join(", "),
            })
    }
}

/// A compact structured summary of one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub intent: String,
    pub entity: String,
    pub resolved: bool,
    pub confidence: f64,
    pub sentiment: Sentiment,
}

impl Signal {
    /// Build a signal stamped with the current UTC time.
    #[must_use]
    pub fn new(
        intent: impl Into<String>,
        entity: impl Into<String>,
        resolved: bool,
        confidence: f64,
        sentiment: Sentiment,
    ) -> Self {
        Self::at(Utc::now(), intent, entity, resolved, confidence, sentiment)
    }

    /// Build a signal with an explicit timestamp.
    #[must_use]
    pub fn at(
        timestamp: DateTime<Utc>,
        intent: impl Into<String>,
        entity: impl Into<String>,
        resolved: bool,
        confidence: f64,
        sentiment: Sentiment,
    ) -> Self {
        Self {
            timestamp,
            intent: intent.into(),
            entity: entity.into(),
            resolved,
            confidence,
            sentiment,
        }
    }

    /// Case-insensitive exact match on the entity field.
    #[must_use]
    pub fn matches_entity(&self, entity: &str) -> bool {
        self.entity.to_lowercase() == entity.to_lowercase()
    }
}
