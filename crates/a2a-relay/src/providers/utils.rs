use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::models::message::{Message, ToolCallRequest};
use crate::models::role::Role;
use crate::models::tool::Tool;

fn invalid_name_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("function name pattern is valid"))
}

/// Convert conversation messages to chat-completions messages. Assistant turns that carry
/// neither text nor tool calls are dropped, the API rejects them.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages.iter().filter_map(message_to_openai).collect()
}

fn message_to_openai(message: &Message) -> Option<Value> {
    if message.role == Role::Tool {
        return Some(json!({
            "role": "tool",
            "content": message.content,
            "tool_call_id": message.tool_call_id,
        }));
    }
    if message.content.is_empty() && message.tool_calls.is_empty() {
        return None;
    }

    let mut converted = json!({"role": message.role});
    if !message.content.is_empty() {
        converted["content"] = json!(message.content);
    }
    if !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message.tool_calls.iter().map(tool_call_to_openai).collect();
        converted["tool_calls"] = json!(calls);
    }
    Some(converted)
}

fn tool_call_to_openai(call: &ToolCallRequest) -> Value {
    // calls streamed without arguments still need a JSON object
    let arguments = match call.arguments.trim() {
        "" => "{}",
        _ => call.arguments.as_str(),
    };
    json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": sanitize_function_name(&call.name),
            "arguments": arguments,
        }
    })
}

/// Convert tools to chat-completions function definitions
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        let parameters = if tool.parameters.is_null() {
            json!({"type": "object", "properties": {}})
        } else {
            tool.parameters.clone()
        };

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format. Tool calls keep their
/// arguments as raw text; they are validated by whoever resolves the call.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response"))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(Value::as_str) {
        message = message.with_text(text);
    }

    let calls = original
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for call in calls {
        let id = call["id"].as_str().unwrap_or_default();
        let name = call["function"]["name"].as_str().unwrap_or_default();
        if !is_valid_function_name(name) {
            tracing::warn!("dropping tool call {} with invalid function name '{}'", id, name);
            continue;
        }
        let arguments = call["function"]["arguments"].as_str().unwrap_or_default();
        message = message.with_tool_call(id, name, arguments);
    }

    Ok(message)
}

fn sanitize_function_name(name: &str) -> String {
    invalid_name_chars().replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    !name.is_empty() && !invalid_name_chars().is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
