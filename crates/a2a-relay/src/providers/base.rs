use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::message::Message;
use crate::models::tool::Tool;

/// Token accounting for one completion. Compatible servers do not always report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    /// Read the `usage` object of a chat-completions response
    pub fn from_openai(usage: Option<&Value>) -> Self {
        let Some(usage) = usage else {
            return Self::default();
        };
        let count = |key: &str| usage.get(key).and_then(Value::as_i64).map(|v| v as i32);

        let input_tokens = count("prompt_tokens");
        let output_tokens = count("completion_tokens");
        let total_tokens = count("total_tokens").or(match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// A chat-completion backend the orchestrator reasons with
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message. System instructions travel as leading
    /// system messages.
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Message, Usage)>;
}
