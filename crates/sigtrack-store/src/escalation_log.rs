use std::path::{Path, PathBuf};

use sigtrack_core::{AppConfig, EscalationRecord};

use crate::json_file::{BestEffort, JsonArrayFile};

/// Local log of escalations that were not delivered to the webhook.
///
/// Records are only ever appended. There is no retention policy.
pub struct EscalationLog {
    file: JsonArrayFile<EscalationRecord>,
}

impl EscalationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonArrayFile::new(path),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.escalations_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn append(&self, record: EscalationRecord) -> BestEffort<usize> {
        let signal_type = record.signal_type;
        let outcome = self.file.append(record).await;
        tracing::info!(
            path = %self.path().display(),
            signal_type = %signal_type,
            logged = outcome.value,
            "escalation written to fallback log"
        );
        outcome
    }

    pub async fn load(&self) -> BestEffort<Vec<EscalationRecord>> {
        match self.file.load().await {
            Ok(records) => BestEffort::ok(records),
            Err(e) => {
                tracing::error!(
                    path = %self.path().display(),
                    error = %e,
                    "failed to load escalation log"
                );
                BestEffort::degraded(Vec::new(), e)
            }
        }
    }
}
