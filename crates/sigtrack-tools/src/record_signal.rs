//! `record_interaction_signal`: append one signal after a meaningful interaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sigtrack_core::Sentiment;
use sigtrack_store::SignalStore;

use crate::error::ToolError;
use crate::tool::{parse_args, Tool};

#[derive(Debug, Deserialize)]
struct RecordArgs {
    intent: String,
    entity: String,
    resolved: bool,
    confidence: f64,
    sentiment: Sentiment,
}

#[derive(Debug, Serialize)]
struct RecordResult {
    success: bool,
    message: &'static str,
    signal_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_error: Option<String>,
}

pub struct RecordInteractionSignalTool {
    store: SignalStore,
}

impl RecordInteractionSignalTool {
    pub const NAME: &'static str = "record_interaction_signal";

    #[must_use]
    pub fn new(store: SignalStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecordInteractionSignalTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Record a compact summary of a meaningful interaction. \
         Call this after each substantive user interaction to track patterns over time. \
         This helps detect if multiple people have similar issues or requests."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "description":
                        "High-level user intent (e.g., product_search, directions, complaint, question)"
                },
                "entity": {
                    "type": "string",
                    "description":
                        "Primary subject of interaction (e.g., specific product, location, topic)"
                },
                "resolved": {
                    "type": "boolean",
                    "description": "Whether you fully resolved the user's request"
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "description": "Your confidence in the response quality (0.0 to 1.0)"
                },
                "sentiment": {
                    "type": "string",
                    "enum": Sentiment::ALL.map(Sentiment::as_str),
                    "description": "User's sentiment during interaction"
                }
            },
            "required": ["intent", "entity", "resolved", "confidence", "sentiment"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let args: RecordArgs = parse_args(Self::NAME, args)?;

        let outcome = self
            .store
            .record(
                &args.intent,
                &args.entity,
                args.resolved,
                args.confidence,
                args.sentiment,
            )
            .await;

        // Durability is best effort: a storage fault still reports success.
        Ok(serde_json::to_value(RecordResult {
            success: true,
            message: "Signal recorded",
            signal_count: outcome.value,
            storage_error: outcome.fault.map(|e| e.to_string()),
        })?)
    }
}
