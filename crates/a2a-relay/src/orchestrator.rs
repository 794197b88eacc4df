//! The conversational agent the relay sits in front of. It reasons over the conversation and
//! requests agent calls through the synthetic tools; it never resolves them itself.
use async_stream::stream;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::models::event::RunEvent;
use crate::models::message::Message;
use crate::models::run::RunInput;
use crate::providers::base::Provider;

pub type EventStream = BoxStream<'static, RunEvent>;

pub trait Orchestrator: Send + Sync {
    /// Start a run. The stream must end with either `RUN_FINISHED` or `RUN_ERROR`.
    fn run(&self, input: &RunInput) -> EventStream;

    /// Make a message visible to subsequent runs
    fn add_message(&self, _message: Message) {}
}

/// An orchestrator backed by a single chat-completion per run. It keeps no state between runs:
/// everything a run needs arrives in its input, which the relay rebuilds from the conversation.
pub struct ProviderOrchestrator {
    provider: Arc<dyn Provider>,
}

impl ProviderOrchestrator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

impl Orchestrator for ProviderOrchestrator {
    fn run(&self, input: &RunInput) -> EventStream {
        let provider = Arc::clone(&self.provider);
        let messages = input.messages.clone();
        let tools = input.tools.clone();
        let thread_id = input.thread_id.clone();
        let run_id = input.run_id.clone();

        Box::pin(stream! {
            yield RunEvent::RunStarted {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            };

            let reply = match provider.complete(&messages, &tools).await {
                Ok((reply, usage)) => {
                    tracing::debug!(
                        input_tokens = ?usage.input_tokens,
                        output_tokens = ?usage.output_tokens,
                        tool_calls = reply.tool_calls.len(),
                        "completion finished"
                    );
                    reply
                }
                Err(e) => {
                    tracing::error!("completion failed: {}", e);
                    yield RunEvent::RunError {
                        message: e.to_string(),
                        code: Some("PROVIDER_ERROR".to_string()),
                    };
                    return;
                }
            };

            if !reply.content.is_empty() {
                yield RunEvent::TextMessageStart {
                    message_id: reply.id.clone(),
                    role: reply.role,
                };
                yield RunEvent::TextMessageContent {
                    message_id: reply.id.clone(),
                    delta: reply.content.clone(),
                };
                yield RunEvent::text_message_end(reply.id.clone());
            }

            for call in reply.tool_calls {
                yield RunEvent::ToolCallStart {
                    tool_call_id: call.id.clone(),
                    tool_call_name: call.name,
                    parent_message_id: Some(reply.id.clone()),
                };
                if !call.arguments.is_empty() {
                    yield RunEvent::ToolCallArgs {
                        tool_call_id: call.id.clone(),
                        delta: call.arguments,
                    };
                }
                yield RunEvent::ToolCallEnd {
                    tool_call_id: call.id,
                };
            }

            yield RunEvent::RunFinished { thread_id, run_id };
        })
    }
}
