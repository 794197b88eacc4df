use super::message::Message;
use super::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request to run the orchestrator over a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    pub thread_id: String,
    pub run_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    /// Opaque context entries forwarded to the orchestrator untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<Value>,
}

impl RunInput {
    pub fn new<T: Into<String>, R: Into<String>>(thread_id: T, run_id: R) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            context: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}
