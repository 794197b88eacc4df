use a2a_relay::agents::{A2aMessage, AgentCard, AgentClient, AgentDirectory, SendOutcome};
use a2a_relay::models::event::RunEvent;
use a2a_relay::models::role::Role;
use a2a_relay::models::run::RunInput;
use a2a_relay::orchestrator::{EventStream, Orchestrator};
use a2a_relay::relay::Relay;
use a2a_relay::tools::SEND_MESSAGE_TOOL;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::state::AppState;

/// Plays back one scripted turn per run, then finishes empty runs
pub struct ScriptedOrchestrator {
    turns: Mutex<VecDeque<Vec<RunEvent>>>,
}

impl ScriptedOrchestrator {
    pub fn new(turns: Vec<Vec<RunEvent>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

impl Orchestrator for ScriptedOrchestrator {
    fn run(&self, input: &RunInput) -> EventStream {
        let mut events = vec![RunEvent::RunStarted {
            thread_id: input.thread_id.clone(),
            run_id: input.run_id.clone(),
        }];
        if let Some(turn) = self.turns.lock().unwrap().pop_front() {
            events.extend(turn);
        }
        events.push(RunEvent::RunFinished {
            thread_id: input.thread_id.clone(),
            run_id: input.run_id.clone(),
        });
        futures::stream::iter(events).boxed()
    }
}

/// Answers every task with a fixed text
pub struct EchoAgentClient {
    url: String,
    reply: String,
}

impl EchoAgentClient {
    pub fn new(url: &str, reply: &str) -> Self {
        Self {
            url: url.to_string(),
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl AgentClient for EchoAgentClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_card(&self) -> anyhow::Result<AgentCard> {
        Ok(AgentCard {
            name: "Balance Agent".to_string(),
            description: "Checks balances on Movement".to_string(),
            ..Default::default()
        })
    }

    async fn send_message(&self, _message: A2aMessage) -> anyhow::Result<SendOutcome> {
        Ok(SendOutcome::Success(
            json!({"kind": "text", "text": self.reply}),
        ))
    }
}

pub fn agent_call(id: &str, agent: &str, task: &str) -> Vec<RunEvent> {
    vec![
        RunEvent::ToolCallStart {
            tool_call_id: id.to_string(),
            tool_call_name: SEND_MESSAGE_TOOL.to_string(),
            parent_message_id: Some("a1".to_string()),
        },
        RunEvent::ToolCallArgs {
            tool_call_id: id.to_string(),
            delta: json!({"agentName": agent, "task": task}).to_string(),
        },
        RunEvent::ToolCallEnd {
            tool_call_id: id.to_string(),
        },
    ]
}

pub fn text(message_id: &str, text: &str) -> Vec<RunEvent> {
    vec![
        RunEvent::TextMessageStart {
            message_id: message_id.to_string(),
            role: Role::Assistant,
        },
        RunEvent::TextMessageContent {
            message_id: message_id.to_string(),
            delta: text.to_string(),
        },
        RunEvent::text_message_end(message_id),
    ]
}

/// State with a single `balance` agent in the directory
pub async fn state_with(turns: Vec<Vec<RunEvent>>) -> AppState {
    let clients: Vec<Arc<dyn AgentClient>> = vec![Arc::new(EchoAgentClient::new(
        "http://agents/balance",
        "12.5 MOVE",
    ))];
    let directory = AgentDirectory::discover_with(clients).await.unwrap();
    let relay = Relay::new(
        Arc::new(ScriptedOrchestrator::new(turns)),
        Arc::new(directory),
    );
    AppState::new(relay)
}
