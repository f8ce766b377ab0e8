//! Tool surface exposed to the conversation host.
//!
//! Each [`Tool`] publishes a JSON-schema function spec and accepts JSON
//! arguments. [`ToolRegistry`] wires the three signal tools to one
//! [`sigtrack_core::AppConfig`].

pub mod check_aggregates;
pub mod error;
pub mod escalate;
pub mod record_signal;
pub mod registry;
pub mod tool;

pub use check_aggregates::CheckSignalAggregatesTool;
pub use error::ToolError;
pub use escalate::EscalateToSlackTool;
pub use record_signal::RecordInteractionSignalTool;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolSpec};
