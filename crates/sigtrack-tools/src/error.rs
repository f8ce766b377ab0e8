use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArgs { tool: &'static str, reason: String },

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}
