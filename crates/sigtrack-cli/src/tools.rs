//! `tools` sub-commands: list specs, invoke a tool by name.

use clap::Subcommand;
use serde_json::Value;
use sigtrack_core::AppConfig;
use sigtrack_tools::ToolRegistry;

use crate::print_json;

#[derive(Debug, Subcommand)]
pub enum ToolsCommands {
    /// Print every tool's function spec
    List,
    /// Invoke a tool with JSON arguments
    Invoke {
        /// Tool name (e.g., `check_signal_aggregates`)
        name: String,
        /// Arguments object as JSON
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

pub(crate) async fn run(config: &AppConfig, command: ToolsCommands) -> anyhow::Result<()> {
    let registry = ToolRegistry::from_config(config)?;

    match command {
        ToolsCommands::List => print_json(&registry.specs()),
        ToolsCommands::Invoke { name, args } => {
            let args: Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;
            let output = registry.invoke(&name, args).await?;
            print_json(&output)
        }
    }
}
