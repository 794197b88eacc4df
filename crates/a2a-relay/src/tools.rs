//! The tools the relay injects into the orchestrator's tool list. The orchestrator only ever
//! requests them; the relay resolves them by calling the specialized agents.
use serde::Deserialize;
use serde_json::json;

use crate::errors::{RelayError, RelayResult};
use crate::models::tool::Tool;

pub const SEND_MESSAGE_TOOL: &str = "send_message_to_a2a_agent";
pub const RETRY_WITH_PAYMENT_TOOL: &str = "retry_a2a_agent_with_payment";

pub fn is_synthetic(tool_name: &str) -> bool {
    tool_name == SEND_MESSAGE_TOOL || tool_name == RETRY_WITH_PAYMENT_TOOL
}

pub fn send_message_tool() -> Tool {
    Tool::new(
        SEND_MESSAGE_TOOL,
        "Sends a task to a specialized agent and returns its answer.",
        json!({
            "type": "object",
            "properties": {
                "agentName": {
                    "type": "string",
                    "description": "The exact name of the agent to call"
                },
                "task": {
                    "type": "string",
                    "description": "The task for the agent, e.g. 'get balance of 0x... on movement'"
                }
            },
            "required": ["agentName", "task"]
        }),
    )
}

pub fn retry_with_payment_tool() -> Tool {
    Tool::new(
        RETRY_WITH_PAYMENT_TOOL,
        "Retries a task that an agent refused with PAYMENT_REQUIRED, attaching the hash of the payment transaction.",
        json!({
            "type": "object",
            "properties": {
                "agentName": {
                    "type": "string",
                    "description": "The exact name of the agent to call"
                },
                "task": {
                    "type": "string",
                    "description": "The same task that was refused"
                },
                "transactionHash": {
                    "type": "string",
                    "description": "Hash of the transaction that paid the agent"
                }
            },
            "required": ["agentName", "task", "transactionHash"]
        }),
    )
}

/// Add the synthetic tools to a tool list, replacing any existing definitions with the same names
pub fn install(tools: &mut Vec<Tool>) {
    tools.retain(|tool| !is_synthetic(&tool.name));
    tools.push(send_message_tool());
    tools.push(retry_with_payment_tool());
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCallArgs {
    pub agent_name: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryCallArgs {
    pub agent_name: String,
    pub task: String,
    pub transaction_hash: String,
}

/// A parsed request for one of the synthetic tools
#[derive(Debug, Clone, PartialEq)]
pub enum AgentToolCall {
    Direct(DirectCallArgs),
    Retry(RetryCallArgs),
}

impl AgentToolCall {
    /// Parse the raw arguments recorded for tool call `id`
    pub fn parse(id: &str, tool_name: &str, arguments: &str) -> RelayResult<Self> {
        let invalid = |message: String| RelayError::InvalidToolArguments {
            id: id.to_string(),
            message,
        };
        match tool_name {
            SEND_MESSAGE_TOOL => serde_json::from_str(arguments)
                .map(AgentToolCall::Direct)
                .map_err(|e| invalid(e.to_string())),
            RETRY_WITH_PAYMENT_TOOL => serde_json::from_str(arguments)
                .map(AgentToolCall::Retry)
                .map_err(|e| invalid(e.to_string())),
            other => Err(invalid(format!("{} is not a relay tool", other))),
        }
    }

    pub fn agent_name(&self) -> &str {
        match self {
            AgentToolCall::Direct(args) => &args.agent_name,
            AgentToolCall::Retry(args) => &args.agent_name,
        }
    }

    pub fn task(&self) -> &str {
        match self {
            AgentToolCall::Direct(args) => &args.task,
            AgentToolCall::Retry(args) => &args.task,
        }
    }

    pub fn payment_reference(&self) -> Option<&str> {
        match self {
            AgentToolCall::Direct(_) => None,
            AgentToolCall::Retry(args) => Some(&args.transaction_hash),
        }
    }
}
