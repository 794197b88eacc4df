use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::card::AgentCard;
use super::client::{A2aMessage, AgentClient, JsonRpcError, SendOutcome};
use super::directory::agent_name_from_url;

/// An agent client that answers from a script and records every message it receives
pub struct MockAgentClient {
    url: String,
    card: Option<AgentCard>,
    replies: Mutex<VecDeque<Result<SendOutcome, String>>>,
    received: Arc<Mutex<Vec<A2aMessage>>>,
    delay: Option<Duration>,
}

impl MockAgentClient {
    pub fn new(url: &str) -> Self {
        let name = agent_name_from_url(url).unwrap_or_default();
        Self {
            url: url.to_string(),
            card: Some(AgentCard {
                name: name.clone(),
                description: format!("The {} agent", name),
                url: url.to_string(),
                ..Default::default()
            }),
            replies: Mutex::new(VecDeque::new()),
            received: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Card fetches fail
    pub fn unreachable(mut self) -> Self {
        self.card = None;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reply_text(self, text: &str) -> Self {
        self.reply(Ok(SendOutcome::Success(json!({
            "kind": "message",
            "role": "agent",
            "parts": [{"kind": "text", "text": text}]
        }))))
    }

    pub fn reply_result(self, result: Value) -> Self {
        self.reply(Ok(SendOutcome::Success(result)))
    }

    pub fn reply_error(self, code: i64, message: &str) -> Self {
        self.reply(Ok(SendOutcome::Error(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        })))
    }

    pub fn reply_transport_failure(self, message: &str) -> Self {
        self.reply(Err(message.to_string()))
    }

    fn reply(self, reply: Result<SendOutcome, String>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Handle to the messages received so far, usable after the client is moved
    pub fn received(&self) -> Arc<Mutex<Vec<A2aMessage>>> {
        Arc::clone(&self.received)
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_card(&self) -> Result<AgentCard> {
        self.card.clone().ok_or_else(|| anyhow!("connection refused"))
    }

    async fn send_message(&self, message: A2aMessage) -> Result<SendOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.received.lock().unwrap().push(message);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}
