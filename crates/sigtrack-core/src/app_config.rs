use std::path::{Path, PathBuf};

pub const SIGNALS_FILE_NAME: &str = "signals.json";
pub const ESCALATIONS_FILE_NAME: &str = "escalations.json";

#[derive(Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub slack_webhook_url: Option<String>,
    pub log_level: String,
    pub app_name: String,
    pub app_version: String,
    pub agent_name: String,
    /// Name shown in the message header; `agent_name` is used in the context line.
    pub header_name: String,
    pub slack_timeout_secs: u64,
    pub slack_max_attempts: u32,
    pub slack_backoff_initial_ms: u64,
    pub slack_backoff_max_ms: u64,
    pub fallback_on_delivery_failure: bool,
}

impl AppConfig {
    /// Defaults with the data directory pointed at `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn signals_path(&self) -> PathBuf {
        self.data_dir.join(SIGNALS_FILE_NAME)
    }

    #[must_use]
    pub fn escalations_path(&self) -> PathBuf {
        self.data_dir.join(ESCALATIONS_FILE_NAME)
    }

    /// Attribution line appended to every escalation message.
    #[must_use]
    pub fn app_meta(&self) -> String {
        format!("{} v{}", self.app_name, self.app_version)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            slack_webhook_url: None,
            log_level: "info".to_string(),
            app_name: "sigtrack".to_string(),
            app_version: "dev".to_string(),
            agent_name: "Reachy Mini".to_string(),
            header_name: "Reachy".to_string(),
            slack_timeout_secs: 10,
            slack_max_attempts: 3,
            slack_backoff_initial_ms: 2_000,
            slack_backoff_max_ms: 10_000,
            fallback_on_delivery_failure: false,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field(
                "slack_webhook_url",
                &self.slack_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("log_level", &self.log_level)
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("agent_name", &self.agent_name)
            .field("header_name", &self.header_name)
            .field("slack_timeout_secs", &self.slack_timeout_secs)
            .field("slack_max_attempts", &self.slack_max_attempts)
            .field("slack_backoff_initial_ms", &self.slack_backoff_initial_ms)
            .field("slack_backoff_max_ms", &self.slack_backoff_max_ms)
            .field(
                "fallback_on_delivery_failure",
                &self.fallback_on_delivery_failure,
            )
            .finish()
    }
}
