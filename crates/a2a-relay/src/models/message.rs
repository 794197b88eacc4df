use super::role::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A tool call requested by an assistant message
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON text of the arguments, as streamed by the orchestrator
    #[serde(default)]
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new<I: Into<String>, N: Into<String>, A: Into<String>>(
        id: I,
        name: N,
        arguments: A,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A message in a conversation
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    fn new(role: Role) -> Self {
        Message {
            id: new_message_id(),
            role,
            content: String::new(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new system message
    pub fn system() -> Self {
        Self::new(Role::System)
    }

    /// Create a new user message
    pub fn user() -> Self {
        Self::new(Role::User)
    }

    /// Create a new assistant message
    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    /// Create a tool result message answering the given tool call
    pub fn tool_result<S: Into<String>>(tool_call_id: S) -> Self {
        let mut message = Self::new(Role::Tool);
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    /// Replace the generated id
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Append text content to the message
    pub fn with_text<S: AsRef<str>>(mut self, text: S) -> Self {
        self.content.push_str(text.as_ref());
        self
    }

    /// Add a tool call request to the message
    pub fn with_tool_call<I, N, A>(mut self, id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        self.tool_calls
            .push(ToolCallRequest::new(id, name, arguments));
        self
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }

    pub fn find_tool_call(&self, id: &str) -> Option<&ToolCallRequest> {
        self.tool_calls.iter().find(|call| call.id == id)
    }
}
