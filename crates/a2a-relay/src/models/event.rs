use super::role::Role;
use crate::errors::RelayError;
use serde::{Deserialize, Serialize};

fn assistant_role() -> Role {
    Role::Assistant
}

fn tool_role() -> Role {
    Role::Tool
}

/// An event in a run's stream. The relay emits the same shapes the orchestrator produces,
/// so downstream consumers do not need to know the relay exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted { thread_id: String, run_id: String },

    #[serde(rename_all = "camelCase")]
    TextMessageStart {
        message_id: String,
        #[serde(default = "assistant_role")]
        role: Role,
    },

    #[serde(rename_all = "camelCase")]
    TextMessageContent { message_id: String, delta: String },

    #[serde(rename_all = "camelCase")]
    TextMessageEnd { message_id: String },

    #[serde(rename_all = "camelCase")]
    ToolCallStart {
        tool_call_id: String,
        tool_call_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    ToolCallArgs { tool_call_id: String, delta: String },

    #[serde(rename_all = "camelCase")]
    ToolCallEnd { tool_call_id: String },

    #[serde(rename_all = "camelCase")]
    ToolCallResult {
        message_id: String,
        tool_call_id: String,
        content: String,
        #[serde(default = "tool_role")]
        role: Role,
    },

    #[serde(rename_all = "camelCase")]
    RunFinished { thread_id: String, run_id: String },

    #[serde(rename_all = "camelCase")]
    RunError {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl RunEvent {
    pub fn text_message_end<S: Into<String>>(message_id: S) -> Self {
        RunEvent::TextMessageEnd {
            message_id: message_id.into(),
        }
    }

    pub fn tool_call_result<M, T, C>(message_id: M, tool_call_id: T, content: C) -> Self
    where
        M: Into<String>,
        T: Into<String>,
        C: Into<String>,
    {
        RunEvent::ToolCallResult {
            message_id: message_id.into(),
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            role: Role::Tool,
        }
    }

    pub fn run_error(error: &RelayError) -> Self {
        RunEvent::RunError {
            message: error.to_string(),
            code: Some(error.code().to_string()),
        }
    }

    /// The wire name of the event, used for logging
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::RunStarted { .. } => "RUN_STARTED",
            RunEvent::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            RunEvent::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            RunEvent::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            RunEvent::ToolCallStart { .. } => "TOOL_CALL_START",
            RunEvent::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            RunEvent::ToolCallEnd { .. } => "TOOL_CALL_END",
            RunEvent::ToolCallResult { .. } => "TOOL_CALL_RESULT",
            RunEvent::RunFinished { .. } => "RUN_FINISHED",
            RunEvent::RunError { .. } => "RUN_ERROR",
        }
    }

    pub fn is_run_finished(&self) -> bool {
        matches!(self, RunEvent::RunFinished { .. })
    }
}
