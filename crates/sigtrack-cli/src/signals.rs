//! Handlers for the signal and escalation commands.

use serde_json::json;
use sigtrack_core::{AppConfig, Sentiment, SignalType};
use sigtrack_slack::{EscalationRequest, Escalator};
use sigtrack_store::{Aggregator, EscalationLog, SignalStore};

use crate::print_json;

pub(crate) async fn run_record(
    config: &AppConfig,
    intent: &str,
    entity: &str,
    resolved: bool,
    confidence: f64,
    sentiment: Sentiment,
) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&confidence) {
        anyhow::bail!("--confidence must be between 0.0 and 1.0, got {confidence}");
    }

    let store = SignalStore::from_config(config);
    let outcome = store
        .record(intent, entity, resolved, confidence, sentiment)
        .await;

    print_json(&json!({
        "path": store.path(),
        "signal_count": outcome.value,
        "storage_error": outcome.fault.as_ref().map(ToString::to_string),
    }))?;

    if let Some(e) = outcome.fault {
        return Err(anyhow::Error::new(e).context("signal was not persisted"));
    }
    Ok(())
}

pub(crate) async fn run_check(
    config: &AppConfig,
    entity: &str,
    window_hours: f64,
) -> anyhow::Result<()> {
    let aggregator = Aggregator::new(SignalStore::from_config(config));
    let result = aggregator.query(entity, window_hours).await;
    print_json(&result)
}

/// Escalate and print the result. A non-success result exits non-zero.
pub(crate) async fn run_escalate(
    config: &AppConfig,
    signal_type: SignalType,
    summary: String,
    evidence: Vec<String>,
    recommendation: Option<String>,
) -> anyhow::Result<()> {
    let escalator = Escalator::from_config(config)?;
    if !escalator.has_webhook() {
        tracing::info!("SLACK_WEBHOOK_URL not set; escalation will be logged locally");
    }

    let request = EscalationRequest {
        signal_type,
        summary,
        evidence,
        recommendation,
    };
    let result = escalator.escalate(&request).await.into_result(signal_type);
    print_json(&result)?;

    if !result.success {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}

pub(crate) async fn run_escalations(config: &AppConfig) -> anyhow::Result<()> {
    let records = EscalationLog::from_config(config).load().await.into_result()?;
    print_json(&records)
}
