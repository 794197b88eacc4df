use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::event::RunEvent;
use crate::models::message::{new_message_id, Message, ToolCallRequest};
use crate::models::role::Role;

/// Append-only message log shared between the relay and whoever observes the run.
///
/// Clones share the same log. Message ids are unique, and a tool call can only be answered
/// once: appending a second result for the same `tool_call_id` is ignored. The one exception
/// to append-only is the leading system prompt, which each run replaces.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        let conversation = Self::default();
        for message in messages {
            conversation.append(message);
        }
        conversation
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a message. Returns false if it was a duplicate and was dropped.
    pub fn append(&self, message: Message) -> bool {
        let mut messages = self.lock();
        if messages.iter().any(|existing| existing.id == message.id) {
            return false;
        }
        if let Some(tool_call_id) = &message.tool_call_id {
            if messages
                .iter()
                .any(|existing| existing.tool_call_id.as_ref() == Some(tool_call_id))
            {
                return false;
            }
        }
        messages.push(message);
        true
    }

    /// Make `prompt` the log's only leading system message
    pub fn set_system_prompt(&self, prompt: Message) {
        let mut messages = self.lock();
        let leading = messages.iter().take_while(|m| m.is_system()).count();
        messages.drain(..leading);
        messages.retain(|m| m.id != prompt.id);
        messages.insert(0, prompt);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The most recent tool call request with this id
    pub fn find_tool_call(&self, id: &str) -> Option<ToolCallRequest> {
        self.lock()
            .iter()
            .rev()
            .find_map(|message| message.find_tool_call(id))
            .cloned()
    }

    pub fn has_tool_result(&self, tool_call_id: &str) -> bool {
        self.lock()
            .iter()
            .any(|message| message.tool_call_id.as_deref() == Some(tool_call_id))
    }

    /// Fold an orchestrator event into the log, assembling streamed text and tool calls
    /// into messages.
    pub fn apply(&self, event: &RunEvent) {
        match event {
            RunEvent::TextMessageStart { message_id, role } => {
                let mut message = Message::assistant().with_id(message_id.clone());
                message.role = *role;
                self.append(message);
            }
            RunEvent::TextMessageContent { message_id, delta } => {
                let mut messages = self.lock();
                if let Some(message) = messages.iter_mut().rev().find(|m| &m.id == message_id) {
                    message.content.push_str(delta);
                }
            }
            RunEvent::ToolCallStart {
                tool_call_id,
                tool_call_name,
                parent_message_id,
            } => {
                let call = ToolCallRequest::new(tool_call_id.clone(), tool_call_name.clone(), "");
                let mut messages = self.lock();
                let parent = parent_message_id.as_ref().and_then(|parent_id| {
                    messages
                        .iter_mut()
                        .rev()
                        .find(|m| &m.id == parent_id && m.role == Role::Assistant)
                });
                match parent {
                    Some(message) => message.tool_calls.push(call),
                    None => {
                        // the parent id may already name a non-assistant message
                        let id = parent_message_id
                            .clone()
                            .filter(|id| !messages.iter().any(|m| &m.id == id))
                            .unwrap_or_else(new_message_id);
                        let mut message = Message::assistant().with_id(id);
                        message.tool_calls.push(call);
                        messages.push(message);
                    }
                }
            }
            RunEvent::ToolCallArgs {
                tool_call_id,
                delta,
            } => {
                let mut messages = self.lock();
                let call = messages
                    .iter_mut()
                    .rev()
                    .flat_map(|m| m.tool_calls.iter_mut())
                    .find(|call| &call.id == tool_call_id);
                if let Some(call) = call {
                    call.arguments.push_str(delta);
                }
            }
            RunEvent::ToolCallResult {
                message_id,
                tool_call_id,
                content,
                ..
            } => {
                self.append(
                    Message::tool_result(tool_call_id.clone())
                        .with_id(message_id.clone())
                        .with_text(content),
                );
            }
            RunEvent::RunStarted { .. }
            | RunEvent::TextMessageEnd { .. }
            | RunEvent::ToolCallEnd { .. }
            | RunEvent::RunFinished { .. }
            | RunEvent::RunError { .. } => {}
        }
    }
}
