use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// Answers completions from a script and records the messages of every request
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<Message, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Responses where an `Err` makes that completion fail
    pub fn with_results(responses: Vec<Result<Message, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The message lists of every completion requested so far
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<(Message, Usage)> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(message)) => Ok((message, Usage::default())),
            Some(Err(e)) => Err(anyhow!(e)),
            // an exhausted script answers with an empty assistant turn
            None => Ok((Message::assistant(), Usage::default())),
        }
    }
}
