//! `check_signal_aggregates`: counts and ratios for one entity over a window.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sigtrack_store::aggregate::DEFAULT_WINDOW_HOURS;
use sigtrack_store::Aggregator;

use crate::error::ToolError;
use crate::tool::{parse_args, Tool};

fn default_window_hours() -> f64 {
    DEFAULT_WINDOW_HOURS
}

#[derive(Debug, Deserialize)]
struct CheckArgs {
    entity: String,
    #[serde(default = "default_window_hours")]
    window_hours: f64,
}

pub struct CheckSignalAggregatesTool {
    aggregator: Aggregator,
}

impl CheckSignalAggregatesTool {
    pub const NAME: &'static str = "check_signal_aggregates";

    #[must_use]
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Tool for CheckSignalAggregatesTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Check aggregated signals for a specific topic or entity over a time window. \
         Use this when you suspect a pattern (e.g., multiple people asking about the same thing). \
         Returns counts and statistics to help you decide if escalation is needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "entity": {
                    "type": "string",
                    "description": "The entity/topic to check (e.g., product name, location, topic)"
                },
                "window_hours": {
                    "type": "number",
                    "description": "How many hours back to check (e.g., 24 for last day)",
                    "default": 24
                }
            },
            "required": ["entity"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let args: CheckArgs = parse_args(Self::NAME, args)?;
        let result = self.aggregator.query(&args.entity, args.window_hours).await;
        Ok(serde_json::to_value(result)?)
    }
}
