//! Block Kit payload for escalation messages.

use serde::Serialize;
use sigtrack_core::{AppConfig, SignalType};

/// Text object inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Section { text: Text },
    Context { elements: Vec<Text> },
}

/// Body posted to the webhook: `{"blocks": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    pub blocks: Vec<Block>,
}

/// Who is escalating. `header_name` titles the message; `agent_name` and
/// `app_meta` fill the trailing context block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub header_name: String,
    pub agent_name: String,
    pub app_meta: String,
}

impl Attribution {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            header_name: config.header_name.clone(),
            agent_name: config.agent_name.clone(),
            app_meta: config.app_meta(),
        }
    }
}

impl Default for Attribution {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[must_use]
pub fn emoji(signal_type: SignalType) -> &'static str {
    match signal_type {
        SignalType::Demand => "\u{1f4e6}",
        SignalType::Confusion => "\u{2753}",
        SignalType::Risk => "\u{26a0}\u{fe0f}",
        SignalType::Memory => "\u{1f9e0}",
    }
}

fn mrkdwn_section(text: String) -> Block {
    Block::Section {
        text: Text::Mrkdwn { text },
    }
}

/// Build the escalation message.
///
/// Layout: header, summary, bulleted evidence, optional recommendation, and a
/// context line naming the agent and app version. A blank recommendation is
/// left out.
#[must_use]
pub fn format_message(
    attribution: &Attribution,
    signal_type: SignalType,
    summary: &str,
    evidence: &[String],
    recommendation: Option<&str>,
) -> SlackMessage {
    let bullets = evidence
        .iter()
        .map(|e| format!("\u{2022} {e}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut blocks = vec![
        Block::Header {
            text: Text::PlainText {
                text: format!(
                    "{} {} Escalation: {}",
                    emoji(signal_type),
                    attribution.header_name,
                    signal_type.title()
                ),
            },
        },
        mrkdwn_section(format!("*Summary:*\n{summary}")),
        mrkdwn_section(format!("*Evidence:*\n{bullets}")),
    ];

    if let Some(rec) = recommendation.filter(|r| !r.trim().is_empty()) {
        blocks.push(mrkdwn_section(format!("*Recommendation:*\n{rec}")));
    }

    blocks.push(Block::Context {
        elements: vec![Text::Mrkdwn {
            text: format!(
                "Escalated by {} \u{2022} {}",
                attribution.agent_name, attribution.app_meta
            ),
        }],
    });

    SlackMessage { blocks }
}
