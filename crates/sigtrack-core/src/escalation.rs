use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Category of pattern being escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SignalType {
    /// Many requests for unavailable items.
    Demand,
    /// Repeated questions despite answers.
    Confusion,
    /// Frustration, safety or uncertainty spike.
    Risk,
    /// Long-term insight worth preserving.
    Memory,
}

impl SignalType {
    pub const ALL: [SignalType; 4] = [
        SignalType::Demand,
        SignalType::Confusion,
        SignalType::Risk,
        SignalType::Memory,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Demand => "demand",
            SignalType::Confusion => "confusion",
            SignalType::Risk => "risk",
            SignalType::Memory => "memory",
        }
    }

    /// Capitalised label used in message headers.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            SignalType::Demand => "Demand",
            SignalType::Confusion => "Confusion",
            SignalType::Risk => "Risk",
            SignalType::Memory => "Memory",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SignalType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for SignalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "signal type",
                value: s.to_string(),
                expected: SignalType::ALL.map(SignalType::as_str).join(", "),
            })
    }
}

/// Status reason used when no webhook is configured.
pub const REASON_SLACK_UNAVAILABLE: &str = "slack_unavailable";
/// Status reason used when delivery failed after all retries.
pub const REASON_DELIVERY_FAILED: &str = "delivery_failed";

/// An escalation that was logged locally instead of delivered.
///
/// Records are append-only: once written they are never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRecord {
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub signal_type: SignalType,
    pub summary: String,
    pub evidence: Vec<String>,
    pub recommendation: Option<String>,
    pub status: String,
}

impl EscalationRecord {
    /// Build a `not_sent_<reason>` record stamped with the current UTC time.
    #[must_use]
    pub fn not_sent(
        reason: &str,
        signal_type: SignalType,
        summary: impl Into<String>,
        evidence: Vec<String>,
        recommendation: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            signal_type,
            summary: summary.into(),
            evidence,
            recommendation,
            status: format!("not_sent_{reason}"),
        }
    }
}
