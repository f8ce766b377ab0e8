use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

/// Function spec in the shape the host's model API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Must match the `name` in [`Tool::spec`].
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema for the arguments object.
    fn parameters_schema(&self) -> Value;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            kind: "function",
            name: self.name(),
            description: self.description(),
            parameters: self.parameters_schema(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArgs`] if `args` does not match the schema.
    /// Storage and delivery faults are reported inside the returned value.
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;
}

/// Deserialise a tool's arguments, naming the tool on failure.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool: &'static str,
    args: Value,
) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs {
        tool,
        reason: e.to_string(),
    })
}
