//! The run driver. Relays an orchestrator's event stream outward while resolving the agent
//! calls it requests, then re-runs the orchestrator with the results until nothing is pending.
use async_stream::try_stream;
use futures::future::join_all;
use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use std::sync::Arc;

use crate::agents::AgentDirectory;
use crate::conversation::Conversation;
use crate::errors::{RelayError, RelayResult};
use crate::executor::CallExecutor;
use crate::models::event::RunEvent;
use crate::models::message::Message;
use crate::models::run::RunInput;
use crate::orchestrator::Orchestrator;
use crate::payment::PaymentRequiredEnvelope;
use crate::prompt::compose_system_prompt;
use crate::registry::PendingCalls;
use crate::segments::TextSegments;
use crate::tools::{self, AgentToolCall};

pub type RelayStream = BoxStream<'static, RelayResult<RunEvent>>;

/// Where a run is in its cycle of orchestrator turns and drains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running { turn: usize },
    Draining { pending: usize },
    Finished,
    Errored,
}

impl RunState {
    fn enter(&mut self, next: RunState) {
        tracing::debug!(from = ?*self, to = ?next, "run state transition");
        *self = next;
    }
}

#[derive(Clone)]
pub struct Relay {
    orchestrator: Arc<dyn Orchestrator>,
    directory: Arc<AgentDirectory>,
    executor: CallExecutor,
    instructions: Option<String>,
}

impl Relay {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, directory: Arc<AgentDirectory>) -> Self {
        Self {
            orchestrator,
            executor: CallExecutor::new(Arc::clone(&directory)),
            directory,
            instructions: None,
        }
    }

    /// Operating instructions appended to the composed system prompt
    pub fn with_instructions<S: Into<String>>(mut self, instructions: S) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    /// Drive a run to completion over a fresh conversation
    pub fn run(&self, input: RunInput) -> RelayStream {
        self.run_in(input, Conversation::default())
    }

    /// Drive a run to completion, recording every message in `conversation`.
    ///
    /// The stream yields the orchestrator's events, synthetic closures and agent results. A
    /// failure is reported as a `RUN_ERROR` event followed by a single `Err` item, after which
    /// the stream ends.
    pub fn run_in(&self, input: RunInput, conversation: Conversation) -> RelayStream {
        Box::pin(self.clone().drive(input, conversation))
    }

    fn drive(
        self,
        input: RunInput,
        conversation: Conversation,
    ) -> impl Stream<Item = RelayResult<RunEvent>> + Send + 'static {
        try_stream! {
            let mut state = RunState::Idle;
            let mut input = self.prepare(input);
            // a reused conversation still carries the previous run's prompt
            let mut seed = input.messages.iter().cloned();
            if let Some(prompt) = seed.next() {
                conversation.set_system_prompt(prompt);
            }
            for message in seed {
                conversation.append(message);
            }

            let mut pending = PendingCalls::default();
            let mut segments = TextSegments::default();
            let mut turn = 0;

            loop {
                turn += 1;
                state.enter(RunState::Running { turn });

                let mut events = self.orchestrator.run(&input);
                let mut finished = None;

                while let Some(event) = events.next().await {
                    conversation.apply(&event);

                    let mut orchestrator_error = None;
                    match &event {
                        RunEvent::ToolCallStart { tool_call_id, tool_call_name, .. }
                            if tools::is_synthetic(tool_call_name) =>
                        {
                            pending.register(tool_call_id);
                        }
                        RunEvent::ToolCallResult { tool_call_id, .. } => {
                            pending.resolve(tool_call_id);
                        }
                        RunEvent::TextMessageStart { message_id, .. } => segments.open(message_id),
                        RunEvent::TextMessageEnd { message_id } => segments.close(message_id),
                        RunEvent::RunError { message, .. } => {
                            orchestrator_error = Some(RelayError::Orchestrator(message.clone()));
                        }
                        _ => {}
                    }

                    if event.is_run_finished() {
                        finished = Some(event);
                        break;
                    }
                    yield event;

                    if let Some(error) = orchestrator_error {
                        state.enter(RunState::Errored);
                        Err::<(), _>(error)?;
                    }
                }

                let finished = match finished {
                    Some(event) => event,
                    None => {
                        state.enter(RunState::Errored);
                        let error = RelayError::OrchestratorStreamEnded;
                        yield RunEvent::run_error(&error);
                        Err::<RunEvent, _>(error)?
                    }
                };

                state.enter(RunState::Draining { pending: pending.len() });
                for message_id in segments.close_all() {
                    yield RunEvent::text_message_end(message_id);
                }

                if pending.is_empty() {
                    yield finished;
                    state.enter(RunState::Finished);
                    break;
                }

                let ids = pending.ids();
                let outcomes = self.drain(&ids, &conversation).await;

                let mut batch = Vec::new();
                let mut failure = None;
                for (id, outcome) in ids.iter().zip(outcomes) {
                    match outcome {
                        Ok(content) => {
                            let message = Message::tool_result(id.as_str()).with_text(&content);
                            if conversation.append(message.clone()) {
                                yield RunEvent::tool_call_result(message.id.clone(), id.clone(), content);
                                batch.push(message);
                            }
                            pending.resolve(id);
                        }
                        Err(error) => {
                            tracing::error!(tool_call_id = %id, "agent call failed: {}", error);
                            failure.get_or_insert(error);
                        }
                    }
                }

                if let Some(error) = failure {
                    state.enter(RunState::Errored);
                    yield RunEvent::run_error(&error);
                    Err::<(), _>(error)?;
                }

                for message_id in segments.close_all() {
                    yield RunEvent::text_message_end(message_id);
                }
                yield finished;

                for message in batch {
                    self.orchestrator.add_message(message);
                }
                input.messages = conversation.snapshot();
            }
        }
    }

    /// Replace leading system messages with the composed prompt and install the relay's tools
    fn prepare(&self, mut input: RunInput) -> RunInput {
        let leading = input
            .messages
            .iter()
            .take_while(|message| message.is_system())
            .count();
        input.messages.drain(..leading);

        let prompt = compose_system_prompt(&self.directory.summaries(), self.instructions.as_deref());
        input.messages.insert(0, Message::system().with_text(prompt));
        tools::install(&mut input.tools);
        input
    }

    /// Resolve every pending call concurrently. Payment requirements come back as tool
    /// content. Outcomes are returned in the order of `ids`.
    ///
    /// Calls run on their own tasks. A consumer that stops listening does not abort them, their
    /// results are discarded.
    async fn drain(&self, ids: &[String], conversation: &Conversation) -> Vec<RelayResult<String>> {
        tracing::debug!(count = ids.len(), "draining pending agent calls");

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let call = resolve_call(id, conversation);
                let executor = self.executor.clone();
                tokio::spawn(async move {
                    let call = call?;
                    let result = executor
                        .execute(call.agent_name(), call.task(), call.payment_reference())
                        .await;
                    match result {
                        Err(RelayError::PaymentRequired(requirement)) => {
                            Ok(PaymentRequiredEnvelope::new(*requirement).to_content())
                        }
                        other => other,
                    }
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or_else(|e| Err(RelayError::Internal(e.to_string()))))
            .collect()
    }
}

/// The parsed request recorded in the conversation for a pending call
fn resolve_call(id: &str, conversation: &Conversation) -> RelayResult<AgentToolCall> {
    let request = conversation
        .find_tool_call(id)
        .filter(|request| !request.arguments.trim().is_empty())
        .ok_or_else(|| RelayError::MissingToolArguments(id.to_string()))?;
    AgentToolCall::parse(id, &request.name, &request.arguments)
}
