use std::path::{Path, PathBuf};

use sigtrack_core::{AppConfig, Sentiment, Signal};

use crate::json_file::{BestEffort, JsonArrayFile};

/// Durable append-only log of interaction signals.
///
/// There is no update or delete: the only write is [`SignalStore::record`].
pub struct SignalStore {
    file: JsonArrayFile<Signal>,
}

impl SignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonArrayFile::new(path),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.signals_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Stamp a new signal with the current UTC time and append it.
    ///
    /// Returns the total number of stored signals after the append.
    pub async fn record(
        &self,
        intent: &str,
        entity: &str,
        resolved: bool,
        confidence: f64,
        sentiment: Sentiment,
    ) -> BestEffort<usize> {
        let signal = Signal::new(intent, entity, resolved, confidence, sentiment);
        self.record_signal(signal).await
    }

    /// Append a pre-built signal, keeping its timestamp.
    pub async fn record_signal(&self, signal: Signal) -> BestEffort<usize> {
        let intent = signal.intent.clone();
        let entity = signal.entity.clone();
        let resolved = signal.resolved;
        let confidence = signal.confidence;
        let sentiment = signal.sentiment;

        let outcome = self.file.append(signal).await;
        tracing::debug!(
            intent = %intent,
            entity = %entity,
            resolved,
            confidence,
            sentiment = %sentiment,
            signal_count = outcome.value,
            "recorded signal"
        );
        outcome
    }

    /// Read every stored signal in append order.
    ///
    /// A read fault yields an empty list with the fault attached.
    pub async fn load(&self) -> BestEffort<Vec<Signal>> {
        match self.file.load().await {
            Ok(signals) => BestEffort::ok(signals),
            Err(e) => {
                tracing::error!(
                    path = %self.path().display(),
                    error = %e,
                    "failed to load signals"
                );
                BestEffort::degraded(Vec::new(), e)
            }
        }
    }

    /// Number of stored signals; zero on a read fault.
    pub async fn len(&self) -> usize {
        self.load().await.value.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SignalStore {
        SignalStore::from_config(&AppConfig::with_data_dir(dir.path().join("data")))
    }

    #[tokio::test]
    async fn record_creates_data_dir_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = store
            .record("product_search", "oat milk", false, 0.6, Sentiment::Neutral)
            .await;
        assert!(!first.is_degraded());
        assert_eq!(first.value, 1);
        assert!(dir.path().join("data/signals.json").exists());

        let second = store
            .record("complaint", "oat milk", false, 0.3, Sentiment::Angry)
            .await;
        assert_eq!(second.value, 2);
    }

    #[tokio::test]
    async fn count_grows_by_exactly_one_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for n in 1..=7 {
            let outcome = store
                .record("question", "hours", true, 0.9, Sentiment::Positive)
                .await;
            assert_eq!(outcome.value, n);
            assert_eq!(store.len().await, n);
        }
    }

    #[tokio::test]
    async fn record_signal_keeps_explicit_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let ts = Utc.with_ymd_and_hms(2024, 12, 24, 18, 0, 0).unwrap();

        store
            .record_signal(Signal::at(ts, "directions", "Aisle 5", true, 1.0, Sentiment::Positive))
            .await;

        let loaded = store.load().await;
        assert!(!loaded.is_degraded());
        assert_eq!(loaded.value.len(), 1);
        assert_eq!(loaded.value[0].timestamp, ts);
        assert_eq!(loaded.value[0].entity, "Aisle 5");
    }

    #[tokio::test]
    async fn unreadable_store_is_degraded_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        let loaded = store.load().await;
        assert!(loaded.value.is_empty());
        assert!(loaded.is_degraded());
    }

    #[tokio::test]
    async fn persisted_file_is_a_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .record("complaint", "milk", false, 0.25, Sentiment::Frustrated)
            .await;

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {"), "unexpected layout: {raw}");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value[0];
        assert_eq!(first["intent"], "complaint");
        assert_eq!(first["sentiment"], "frustrated");
        assert_eq!(first["resolved"], false);
        assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
