//! Escalation state machine.
//!
//! ```text
//! validate ──empty evidence──▶ Declined
//!    │
//!    ├─ webhook configured ──▶ deliver (≤ max_attempts) ──▶ Delivered | Failed
//!    │
//!    └─ no webhook ──────────▶ append to escalation log ──▶ FallbackLogged | FallbackFailed
//! ```
//!
//! A delivery that fails after every retry is reported as failed and, unless
//! `fallback_on_delivery_failure` is set, is not written to the local log.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sigtrack_core::escalation::{REASON_DELIVERY_FAILED, REASON_SLACK_UNAVAILABLE};
use sigtrack_core::{AppConfig, EscalationRecord, SignalType};
use sigtrack_store::EscalationLog;

use crate::client::SlackClient;
use crate::error::SlackError;
use crate::message::{format_message, Attribution};
use crate::retry::{retry_with_backoff, RetryPolicy};

pub const FALLBACK_LOCAL_LOGGING: &str = "local_logging";

/// What the host asks to escalate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub signal_type: SignalType,
    pub summary: String,
    pub evidence: Vec<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Terminal state of one [`Escalator::escalate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Rejected before any I/O.
    Declined { reason: String },
    Delivered,
    /// Every delivery attempt failed. `logged_to` is set when the opt-in
    /// fallback wrote the escalation to the local log.
    Failed {
        error: String,
        logged_to: Option<PathBuf>,
        warning: Option<String>,
    },
    /// No webhook configured; written to the local log instead. `warning`
    /// is set when the previous log could not be read and was set aside.
    FallbackLogged {
        path: PathBuf,
        warning: Option<String>,
    },
    /// No webhook configured and the local log could not be written.
    FallbackFailed { error: String },
}

/// Tool-facing shape of an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalationResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<SignalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Where a local fallback write landed.
struct LoggedLocally {
    path: PathBuf,
    warning: Option<String>,
}

impl EscalationOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            EscalationOutcome::Delivered | EscalationOutcome::FallbackLogged { .. }
        )
    }

    /// The local-log warning, if the fallback write had one.
    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            EscalationOutcome::Failed { warning, .. }
            | EscalationOutcome::FallbackLogged { warning, .. } => warning.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_result(self, signal_type: SignalType) -> EscalationResult {
        let success = self.is_success();
        let warning = self.warning().map(ToString::to_string);
        let (message, signal_type, fallback) = match self {
            EscalationOutcome::Declined { reason } => (reason, None, None),
            EscalationOutcome::Delivered => (
                format!("Successfully notified team about {signal_type} signal"),
                Some(signal_type),
                None,
            ),
            EscalationOutcome::Failed {
                error,
                logged_to: Some(path),
                ..
            } => (
                format!(
                    "Failed to send Slack message: {error}. Escalation logged locally to {}",
                    path.display()
                ),
                Some(signal_type),
                Some(FALLBACK_LOCAL_LOGGING.to_string()),
            ),
            EscalationOutcome::Failed { error, .. } => (
                format!("Failed to send Slack message: {error}"),
                Some(signal_type),
                None,
            ),
            EscalationOutcome::FallbackLogged { path, .. } => (
                format!(
                    "Escalation logged locally (Slack not configured). Check {}",
                    path.display()
                ),
                Some(signal_type),
                Some(FALLBACK_LOCAL_LOGGING.to_string()),
            ),
            EscalationOutcome::FallbackFailed { error } => (
                format!(
                    "Slack not configured and escalation could not be logged locally: {error}"
                ),
                Some(signal_type),
                None,
            ),
        };

        EscalationResult {
            success,
            message,
            signal_type,
            fallback,
            warning,
        }
    }
}

pub struct Escalator {
    client: Option<SlackClient>,
    log: EscalationLog,
    retry: RetryPolicy,
    attribution: Attribution,
    fallback_on_delivery_failure: bool,
}

impl Escalator {
    /// An escalator with the default retry policy and attribution.
    ///
    /// `client = None` means no webhook is configured.
    #[must_use]
    pub fn new(client: Option<SlackClient>, log: EscalationLog) -> Self {
        Self {
            client,
            log,
            retry: RetryPolicy::default(),
            attribution: Attribution::default(),
            fallback_on_delivery_failure: false,
        }
    }

    /// # Errors
    ///
    /// Returns [`SlackError`] if a webhook URL is configured but the client
    /// cannot be built from it.
    pub fn from_config(config: &AppConfig) -> Result<Self, SlackError> {
        let client = config
            .slack_webhook_url
            .as_deref()
            .map(|url| SlackClient::new(url, config.slack_timeout_secs))
            .transpose()?;

        Ok(Self::new(client, EscalationLog::from_config(config))
            .with_retry_policy(RetryPolicy::from_config(config))
            .with_attribution(Attribution::from_config(config))
            .with_fallback_on_delivery_failure(config.fallback_on_delivery_failure))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    #[must_use]
    pub fn with_fallback_on_delivery_failure(mut self, enabled: bool) -> Self {
        self.fallback_on_delivery_failure = enabled;
        self
    }

    #[must_use]
    pub fn has_webhook(&self) -> bool {
        self.client.is_some()
    }

    #[must_use]
    pub fn log(&self) -> &EscalationLog {
        &self.log
    }

    pub async fn escalate(&self, request: &EscalationRequest) -> EscalationOutcome {
        tracing::info!(
            signal_type = %request.signal_type,
            summary = %request.summary,
            "escalating signal"
        );

        if request.evidence.is_empty() {
            tracing::warn!(signal_type = %request.signal_type, "escalation declined: no evidence");
            return EscalationOutcome::Declined {
                reason: "Evidence is required for escalation".to_string(),
            };
        }

        let Some(client) = &self.client else {
            tracing::warn!("Slack webhook not configured; logging escalation locally");
            return match self.log_locally(request, REASON_SLACK_UNAVAILABLE).await {
                Ok(logged) => EscalationOutcome::FallbackLogged {
                    path: logged.path,
                    warning: logged.warning,
                },
                Err(error) => EscalationOutcome::FallbackFailed { error },
            };
        };

        let message = format_message(
            &self.attribution,
            request.signal_type,
            &request.summary,
            &request.evidence,
            request.recommendation.as_deref(),
        );

        match retry_with_backoff(&self.retry, || client.post(&message)).await {
            Ok(()) => {
                tracing::info!(signal_type = %request.signal_type, "escalation delivered");
                EscalationOutcome::Delivered
            }
            Err(e) => {
                tracing::error!(
                    signal_type = %request.signal_type,
                    attempts = self.retry.max_attempts,
                    error = %e,
                    "failed to deliver escalation"
                );
                let logged = if self.fallback_on_delivery_failure {
                    self.log_locally(request, REASON_DELIVERY_FAILED).await.ok()
                } else {
                    None
                };
                let (logged_to, warning) = match logged {
                    Some(logged) => (Some(logged.path), logged.warning),
                    None => (None, None),
                };
                EscalationOutcome::Failed {
                    error: e.to_string(),
                    logged_to,
                    warning,
                }
            }
        }
    }

    async fn log_locally(
        &self,
        request: &EscalationRequest,
        reason: &str,
    ) -> Result<LoggedLocally, String> {
        let record = EscalationRecord::not_sent(
            reason,
            request.signal_type,
            request.summary.clone(),
            request.evidence.clone(),
            request.recommendation.clone(),
        );
        let outcome = self.log.append(record).await;
        if !outcome.is_persisted() {
            return Err(outcome
                .fault
                .map_or_else(|| "unknown storage fault".to_string(), |e| e.to_string()));
        }
        let warning = outcome.fault.map(|e| {
            tracing::warn!(error = %e, "escalation logged over an unreadable log");
            format!("previous escalation log was unreadable and was set aside: {e}")
        });
        Ok(LoggedLocally {
            path: self.log.path().to_path_buf(),
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(evidence: &[&str]) -> EscalationRequest {
        EscalationRequest {
            signal_type: SignalType::Risk,
            summary: "test".to_string(),
            evidence: evidence.iter().map(ToString::to_string).collect(),
            recommendation: None,
        }
    }

    #[tokio::test]
    async fn empty_evidence_is_declined_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("escalations.json");
        let escalator = Escalator::new(None, EscalationLog::new(&log_path));

        let outcome = escalator.escalate(&request(&[])).await;
        assert!(matches!(outcome, EscalationOutcome::Declined { .. }));
        assert!(!log_path.exists(), "declined escalation must not touch disk");

        let result = outcome.into_result(SignalType::Risk);
        assert!(!result.success);
        assert_eq!(result.message, "Evidence is required for escalation");
        assert!(result.signal_type.is_none());
    }

    #[tokio::test]
    async fn missing_webhook_logs_locally() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("data/escalations.json");
        let escalator = Escalator::new(None, EscalationLog::new(&log_path));
        assert!(!escalator.has_webhook());

        let outcome = escalator.escalate(&request(&["obs1"])).await;
        assert_eq!(
            outcome,
            EscalationOutcome::FallbackLogged {
                path: log_path.clone(),
                warning: None,
            }
        );

        let records = escalator.log().load().await.value;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "not_sent_slack_unavailable");
        assert_eq!(records[0].evidence, vec!["obs1"]);

        let result = outcome.into_result(SignalType::Risk);
        assert!(result.success);
        assert_eq!(result.fallback.as_deref(), Some("local_logging"));
        assert_eq!(result.signal_type, Some(SignalType::Risk));
    }

    #[tokio::test]
    async fn unwritable_fallback_log_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let escalator = Escalator::new(None, EscalationLog::new(blocker.join("escalations.json")));

        let outcome = escalator.escalate(&request(&["obs1"])).await;
        assert!(matches!(outcome, EscalationOutcome::FallbackFailed { .. }));
        assert!(!outcome.into_result(SignalType::Risk).success);
    }

    #[test]
    fn request_deserializes_without_recommendation() {
        let req: EscalationRequest = serde_json::from_value(serde_json::json!({
            "signal_type": "demand",
            "summary": "s",
            "evidence": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(req.signal_type, SignalType::Demand);
        assert!(req.recommendation.is_none());
    }

    #[test]
    fn failed_result_serializes_without_fallback() {
        let result = EscalationOutcome::Failed {
            error: "HTTP error: 500".to_string(),
            logged_to: None,
            warning: None,
        }
        .into_result(SignalType::Demand);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Failed to send Slack message: HTTP error: 500");
        assert!(value.get("fallback").is_none());
        assert!(value.get("warning").is_none());
    }

    #[tokio::test]
    async fn corrupt_fallback_log_still_logs_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("escalations.json");
        std::fs::write(&log_path, r#"[{"truncated": "#).unwrap();
        let escalator = Escalator::new(None, EscalationLog::new(&log_path));

        let outcome = escalator.escalate(&request(&["obs1"])).await;
        assert!(
            matches!(
                outcome,
                EscalationOutcome::FallbackLogged {
                    ref path,
                    warning: Some(_),
                } if path == &log_path
            ),
            "got {outcome:?}"
        );

        let records = escalator.log().load().await.value;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].evidence, vec!["obs1"]);

        let kept: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("escalations.json.corrupt-")
            })
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(
            std::fs::read_to_string(kept[0].path()).unwrap(),
            r#"[{"truncated": "#
        );

        let result = outcome.into_result(SignalType::Risk);
        assert!(result.success);
        assert_eq!(result.fallback.as_deref(), Some("local_logging"));
        assert!(result.warning.unwrap().contains("set aside"));
    }
}
