//! `escalate_to_slack`: hand a high-value signal to a human.

use async_trait::async_trait;
use serde_json::{json, Value};
use sigtrack_core::SignalType;
use sigtrack_slack::{EscalationRequest, Escalator};

use crate::error::ToolError;
use crate::tool::{parse_args, Tool};

pub struct EscalateToSlackTool {
    escalator: Escalator,
}

impl EscalateToSlackTool {
    pub const NAME: &'static str = "escalate_to_slack";

    #[must_use]
    pub fn new(escalator: Escalator) -> Self {
        Self { escalator }
    }

    #[must_use]
    pub fn escalator(&self) -> &Escalator {
        &self.escalator
    }
}

#[async_trait]
impl Tool for EscalateToSlackTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Notify the organization of a high-value signal that warrants human attention. \
         Use this when you detect patterns like: repeated product requests you can't fulfill, \
         confusion about the same topic multiple times, \
         or risk situations (frustration, safety concerns). \
         Always provide clear evidence and a recommendation."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "signal_type": {
                    "type": "string",
                    "enum": SignalType::ALL.map(SignalType::as_str),
                    "description": "Type of signal: \
                        demand = many requests for unavailable items, \
                        confusion = repeated questions despite answers, \
                        risk = frustration/safety/uncertainty spike, \
                        memory = long-term insight worth preserving"
                },
                "summary": {
                    "type": "string",
                    "description": "Concise summary of the situation (1-2 sentences)"
                },
                "evidence": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "List of specific observations that led to this escalation"
                },
                "recommendation": {
                    "type": "string",
                    "description": "Optional: Suggested next action for the team"
                }
            },
            "required": ["signal_type", "summary", "evidence"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let request: EscalationRequest = parse_args(Self::NAME, args)?;
        let outcome = self.escalator.escalate(&request).await;
        Ok(serde_json::to_value(outcome.into_result(request.signal_type))?)
    }
}
