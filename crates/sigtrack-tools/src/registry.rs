use std::sync::Arc;

use serde_json::Value;
use sigtrack_core::AppConfig;
use sigtrack_slack::{Escalator, SlackError};
use sigtrack_store::{Aggregator, SignalStore};

use crate::check_aggregates::CheckSignalAggregatesTool;
use crate::error::ToolError;
use crate::escalate::EscalateToSlackTool;
use crate::record_signal::RecordInteractionSignalTool;
use crate::tool::{Tool, ToolSpec};

/// Name → tool lookup, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The three signal tools sharing `config`'s data directory.
    ///
    /// # Errors
    ///
    /// Returns [`SlackError`] if a webhook URL is configured but unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, SlackError> {
        let mut registry = Self::new();
        registry.register(Arc::new(RecordInteractionSignalTool::new(
            SignalStore::from_config(config),
        )));
        registry.register(Arc::new(CheckSignalAggregatesTool::new(Aggregator::new(
            SignalStore::from_config(config),
        ))));
        registry.register(Arc::new(EscalateToSlackTool::new(Escalator::from_config(
            config,
        )?)));
        Ok(registry)
    }

    /// Adds `tool`, replacing any tool already registered under its name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for an unregistered name, otherwise
    /// whatever the tool returns.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, "invoking tool");
        tool.invoke(args).await
    }
}
