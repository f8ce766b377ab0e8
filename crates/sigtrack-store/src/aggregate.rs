//! Time-windowed statistics over the signal log.
//!
//! Aggregation informs; it never escalates by itself. The host reads the
//! numbers and decides whether a pattern is worth a human's attention.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sigtrack_core::{Sentiment, Signal};

use crate::signal_store::SignalStore;

pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;
const RECENT_SIGNAL_LIMIT: usize = 5;

/// Projection of a signal included in [`AggregateStats::recent_signals`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSignal {
    pub intent: String,
    pub resolved: bool,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

/// Statistics present only when at least one signal matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub unresolved_count: usize,
    pub unresolved_ratio: f64,
    pub negative_sentiment_count: usize,
    pub negative_sentiment_ratio: f64,
    /// Mean confidence rounded to two decimal places.
    pub average_confidence: f64,
    pub recent_signals: Vec<RecentSignal>,
}

/// Aggregate view of one entity over a trailing window.
///
/// Callers must branch on `count` (or `stats`) before reading ratios: an
/// empty window carries a `message` instead of statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub entity: String,
    pub window_hours: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub stats: Option<AggregateStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

impl AggregateResult {
    /// Ratio of unresolved signals, `0.0` when nothing matched.
    #[must_use]
    pub fn unresolved_ratio(&self) -> f64 {
        self.stats.as_ref().map_or(0.0, |s| s.unresolved_ratio)
    }

    /// Ratio of frustrated or angry signals, `0.0` when nothing matched.
    #[must_use]
    pub fn negative_sentiment_ratio(&self) -> f64 {
        self.stats.as_ref().map_or(0.0, |s| s.negative_sentiment_ratio)
    }
}

/// Reads [`SignalStore`] and summarises it per entity.
pub struct Aggregator {
    store: SignalStore,
}

impl Aggregator {
    #[must_use]
    pub fn new(store: SignalStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    /// Aggregate `entity` over the last `window_hours` hours.
    pub async fn query(&self, entity: &str, window_hours: f64) -> AggregateResult {
        self.query_at(entity, window_hours, Utc::now()).await
    }

    /// Like [`Aggregator::query`] with an explicit "now".
    pub async fn query_at(
        &self,
        entity: &str,
        window_hours: f64,
        now: DateTime<Utc>,
    ) -> AggregateResult {
        let loaded = self.store.load().await;
        let mut result = aggregate(&loaded.value, entity, window_hours, now);
        result.storage_error = loaded.fault.map(|e| e.to_string());

        match &result.stats {
            Some(stats) => tracing::info!(
                entity,
                window_hours,
                count = result.count,
                unresolved = stats.unresolved_count,
                negative = stats.negative_sentiment_count,
                "aggregate check"
            ),
            None => tracing::info!(entity, window_hours, "aggregate check found no signals"),
        }

        result
    }
}

/// Compute the aggregate for `entity` over `signals`.
///
/// A signal is included when its entity equals `entity` ignoring case and its
/// timestamp is at or after `now - window_hours`. Negative or NaN windows are
/// treated as zero; a window reaching past the representable range includes
/// everything.
#[must_use]
pub fn aggregate(
    signals: &[Signal],
    entity: &str,
    window_hours: f64,
    now: DateTime<Utc>,
) -> AggregateResult {
    let cutoff = window_start(now, window_hours);

    let matching: Vec<&Signal> = signals
        .iter()
        .filter(|s| s.matches_entity(entity))
        .filter(|s| cutoff.is_none_or(|c| s.timestamp >= c))
        .collect();

    let count = matching.len();
    if count == 0 {
        return AggregateResult {
            entity: entity.to_string(),
            window_hours,
            count: 0,
            message: Some(format!(
                "No signals found for '{entity}' in the last {window_hours} hours"
            )),
            stats: None,
            storage_error: None,
        };
    }

    let unresolved_count = matching.iter().filter(|s| !s.resolved).count();
    let negative_sentiment_count = matching
        .iter()
        .filter(|s| s.sentiment.is_negative())
        .count();
    let confidence_sum: f64 = matching.iter().map(|s| s.confidence).sum();

    #[allow(clippy::cast_precision_loss)]
    let total = count as f64;
    #[allow(clippy::cast_precision_loss)]
    let stats = AggregateStats {
        unresolved_count,
        unresolved_ratio: unresolved_count as f64 / total,
        negative_sentiment_count,
        negative_sentiment_ratio: negative_sentiment_count as f64 / total,
        average_confidence: round2(confidence_sum / total),
        recent_signals: matching[count.saturating_sub(RECENT_SIGNAL_LIMIT)..]
            .iter()
            .map(|s| RecentSignal {
                intent: s.intent.clone(),
                resolved: s.resolved,
                sentiment: s.sentiment,
                confidence: s.confidence,
            })
            .collect(),
    };

    AggregateResult {
        entity: entity.to_string(),
        window_hours,
        count,
        message: None,
        stats: Some(stats),
        storage_error: None,
    }
}

fn window_start(now: DateTime<Utc>, window_hours: f64) -> Option<DateTime<Utc>> {
    // f64::max discards NaN.
    let hours = window_hours.max(0.0);
    #[allow(clippy::cast_possible_truncation)]
    let micros = (hours * 3_600_000_000.0).round() as i64;
    now.checked_sub_signed(TimeDelta::microseconds(micros))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn signal(
        minutes_ago: i64,
        entity: &str,
        resolved: bool,
        confidence: f64,
        sentiment: Sentiment,
    ) -> Signal {
        Signal::at(
            now() - TimeDelta::minutes(minutes_ago),
            "product_search",
            entity,
            resolved,
            confidence,
            sentiment,
        )
    }

    #[test]
    fn milk_scenario() {
        let signals = vec![
            signal(50, "milk", false, 0.4, Sentiment::Frustrated),
            signal(30, "milk", false, 0.5, Sentiment::Frustrated),
            signal(10, "milk", true, 0.9, Sentiment::Positive),
        ];

        let result = aggregate(&signals, "milk", 24.0, now());
        assert_eq!(result.count, 3);
        let stats = result.stats.as_ref().expect("stats present");
        assert_eq!(stats.unresolved_count, 2);
        assert!((stats.unresolved_ratio - 0.667).abs() < 0.001);
        assert_eq!(stats.negative_sentiment_count, 2);
        assert!((stats.negative_sentiment_ratio - 0.667).abs() < 0.001);
        assert!((stats.average_confidence - 0.6).abs() < f64::EPSILON);
        assert!(result.message.is_none());
    }

    #[test]
    fn ratios_match_counts() {
        let sentiments = [
            Sentiment::Angry,
            Sentiment::Neutral,
            Sentiment::Positive,
            Sentiment::Frustrated,
            Sentiment::Neutral,
        ];
        let signals: Vec<Signal> = sentiments
            .iter()
            .enumerate()
            .map(|(i, s)| signal(i64::try_from(i).unwrap(), "bread", i % 2 == 0, 0.5, *s))
            .collect();

        let result = aggregate(&signals, "bread", 1.0, now());
        assert_eq!(result.count, 5);
        let stats = result.stats.unwrap();
        assert_eq!(stats.unresolved_count, 2);
        assert_eq!(stats.negative_sentiment_count, 2);
        assert!((stats.unresolved_ratio - 2.0 / 5.0).abs() < 1e-12);
        assert!((stats.negative_sentiment_ratio - 2.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn empty_window_reports_message_and_zero_ratios() {
        let result = aggregate(&[], "eggs", 24.0, now());
        assert_eq!(result.count, 0);
        assert!(result.stats.is_none());
        assert_eq!(
            result.message.as_deref(),
            Some("No signals found for 'eggs' in the last 24 hours")
        );
        assert!(result.unresolved_ratio().abs() < f64::EPSILON);
        assert!(result.negative_sentiment_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_window_omits_stat_fields_from_json() {
        let value = serde_json::to_value(aggregate(&[], "eggs", 24.0, now())).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["count"], 0);
        assert!(obj.contains_key("message"));
        assert!(!obj.contains_key("unresolved_ratio"));
        assert!(!obj.contains_key("average_confidence"));
        assert!(!obj.contains_key("recent_signals"));
        assert!(!obj.contains_key("storage_error"));
    }

    #[test]
    fn populated_window_flattens_stats_into_json() {
        let signals = vec![signal(5, "milk", false, 0.333, Sentiment::Angry)];
        let value = serde_json::to_value(aggregate(&signals, "milk", 24.0, now())).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["unresolved_count"], 1);
        assert_eq!(value["negative_sentiment_ratio"], 1.0);
        assert_eq!(value["average_confidence"], 0.33);
        assert_eq!(value["recent_signals"][0]["sentiment"], "angry");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn window_lower_bound_is_inclusive() {
        let boundary = Signal::at(
            now() - TimeDelta::hours(24),
            "question",
            "milk",
            true,
            1.0,
            Sentiment::Neutral,
        );
        let older = Signal::at(
            now() - TimeDelta::hours(24) - TimeDelta::microseconds(1),
            "question",
            "milk",
            true,
            1.0,
            Sentiment::Neutral,
        );

        assert_eq!(aggregate(&[boundary], "milk", 24.0, now()).count, 1);
        assert_eq!(aggregate(&[older], "milk", 24.0, now()).count, 0);
    }

    #[test]
    fn fractional_window_hours() {
        let signals = vec![
            signal(20, "milk", true, 1.0, Sentiment::Positive),
            signal(40, "milk", true, 1.0, Sentiment::Positive),
        ];
        assert_eq!(aggregate(&signals, "milk", 0.5, now()).count, 1);
    }

    #[test]
    fn negative_and_nan_windows_only_include_now() {
        let signals = vec![
            signal(0, "milk", true, 1.0, Sentiment::Positive),
            signal(1, "milk", true, 1.0, Sentiment::Positive),
        ];
        assert_eq!(aggregate(&signals, "milk", -5.0, now()).count, 1);
        assert_eq!(aggregate(&signals, "milk", f64::NAN, now()).count, 1);
    }

    #[test]
    fn huge_window_includes_everything() {
        let ancient = Signal::at(
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            "question",
            "milk",
            true,
            1.0,
            Sentiment::Neutral,
        );
        assert_eq!(aggregate(&[ancient], "milk", f64::INFINITY, now()).count, 1);
    }

    #[test]
    fn entity_match_is_case_insensitive_and_exact() {
        let signals = vec![
            signal(1, "Widget", false, 0.5, Sentiment::Neutral),
            signal(2, "widgets", false, 0.5, Sentiment::Neutral),
            signal(3, "Blue Widget", false, 0.5, Sentiment::Neutral),
        ];
        let result = aggregate(&signals, "widget", 24.0, now());
        assert_eq!(result.count, 1);
        assert_eq!(result.entity, "widget");
    }

    #[test]
    fn recent_signals_are_last_five_in_append_order() {
        let signals: Vec<Signal> = (0..8)
            .map(|i| {
                let mut s = signal(60 - i, "milk", true, 0.5, Sentiment::Neutral);
                s.intent = format!("intent-{i}");
                s
            })
            .collect();

        let result = aggregate(&signals, "milk", 24.0, now());
        let intents: Vec<&str> = result
            .stats
            .as_ref()
            .unwrap()
            .recent_signals
            .iter()
            .map(|r| r.intent.as_str())
            .collect();
        assert_eq!(
            intents,
            vec!["intent-3", "intent-4", "intent-5", "intent-6", "intent-7"]
        );
    }

    #[test]
    fn average_confidence_is_rounded_to_two_places() {
        let signals = vec![
            signal(1, "milk", true, 0.1, Sentiment::Neutral),
            signal(2, "milk", true, 0.2, Sentiment::Neutral),
            signal(3, "milk", true, 0.25, Sentiment::Neutral),
        ];
        let stats = aggregate(&signals, "milk", 24.0, now()).stats.unwrap();
        assert!((stats.average_confidence - 0.18).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn aggregator_reads_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path().join("signals.json"));
        store
            .record("product_search", "Widget", false, 0.4, Sentiment::Frustrated)
            .await;

        let aggregator = Aggregator::new(store);
        let result = aggregator.query("widget", DEFAULT_WINDOW_HOURS).await;
        assert_eq!(result.count, 1);
        assert!(result.storage_error.is_none());
    }

    #[tokio::test]
    async fn aggregator_surfaces_storage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        std::fs::write(&path, "garbage").unwrap();

        let aggregator = Aggregator::new(SignalStore::new(path));
        let result = aggregator.query("milk", 24.0).await;
        assert_eq!(result.count, 0);
        assert!(result.storage_error.is_some());
    }
}
