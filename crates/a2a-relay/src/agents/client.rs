use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use super::card::AgentCard;
use crate::payment::PAYMENT_REQUIRED_CODE;

pub const AGENT_CARD_PATH: &str = ".well-known/agent-card.json";
pub const LEGACY_AGENT_CARD_PATH: &str = ".well-known/agent.json";
const SEND_MESSAGE_METHOD: &str = "message/send";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Value },
}

/// A message sent to a specialized agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessage {
    pub kind: String,
    pub message_id: String,
    pub role: String,
    pub parts: Vec<Part>,
}

impl A2aMessage {
    /// A user message carrying a single text part
    pub fn user_text<S: Into<String>>(text: S) -> Self {
        Self {
            kind: "message".to_string(),
            message_id: Uuid::new_v4().to_string(),
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// The error text including any attached data, which is where agents put payment details
    pub fn full_text(&self) -> String {
        match &self.data {
            Some(data) => format!("{} {}", self.message, data),
            None => self.message.clone(),
        }
    }
}

/// The answer to a message-send request
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The `result` payload of a successful response
    Success(Value),
    /// A protocol-level error returned by the agent
    Error(JsonRpcError),
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// A handle to one specialized agent
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// The endpoint the agent was discovered at
    fn url(&self) -> &str;

    /// Fetch the agent's capability card
    async fn fetch_card(&self) -> Result<AgentCard>;

    /// Send one message and wait for the agent's answer
    async fn send_message(&self, message: A2aMessage) -> Result<SendOutcome>;
}

pub struct HttpAgentClient {
    client: Client,
    url: String,
}

impl HttpAgentClient {
    pub fn new<S: Into<String>>(url: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // agents may call an LLM and a chain indexer
            .build()?;

        Ok(Self::with_client(client, url))
    }

    pub fn with_client<S: Into<String>>(client: Client, url: S) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn well_known(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_card(&self) -> Result<AgentCard> {
        let mut response = self
            .client
            .get(self.well_known(AGENT_CARD_PATH))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            response = self
                .client
                .get(self.well_known(LEGACY_AGENT_CARD_PATH))
                .send()
                .await?;
        }

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status => Err(anyhow!("Failed to fetch agent card: {}", status)),
        }
    }

    async fn send_message(&self, message: A2aMessage) -> Result<SendOutcome> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": SEND_MESSAGE_METHOD,
            "params": { "message": message }
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        match response.status() {
            // A payment gate in front of the agent answers before the JSON-RPC layer runs
            StatusCode::PAYMENT_REQUIRED => {
                let body = response.text().await.unwrap_or_default();
                Ok(SendOutcome::Error(JsonRpcError {
                    code: PAYMENT_REQUIRED_CODE,
                    message: format!("402 Payment Required: {}", body),
                    data: None,
                }))
            }
            status if status.is_success() => {
                let body: JsonRpcResponse = response.json().await?;
                match (body.error, body.result) {
                    (Some(error), _) => Ok(SendOutcome::Error(error)),
                    (None, Some(result)) => Ok(SendOutcome::Success(result)),
                    (None, None) => Err(anyhow!("Response contained neither result nor error")),
                }
            }
            status => Err(anyhow!("Request failed: {}", status)),
        }
    }
}
