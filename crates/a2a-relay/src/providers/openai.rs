use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
    tools_to_openai_spec,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    /// The chat-completions request body. Parallel tool calls are disabled whenever tools
    /// are offered so each assistant turn asks for at most one agent call.
    fn payload(&self, messages: &[Message], tools: &[Tool]) -> Result<Value> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });
        let Some(object) = payload.as_object_mut() else {
            return Ok(payload);
        };

        let tools_spec = tools_to_openai_spec(tools)?;
        if !tools_spec.is_empty() {
            object.insert("tools".to_string(), json!(tools_spec));
            object.insert("parallel_tool_calls".to_string(), json!(false));
        }
        if let Some(temperature) = self.config.temperature {
            object.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = self.config.max_tokens {
            object.insert("max_tokens".to_string(), json!(max_tokens));
        }
        Ok(payload)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("Request failed: {}: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Message, Usage)> {
        let response = self.post(self.payload(messages, tools)?).await?;

        if let Some(error) = response.get("error") {
            return Err(match check_openai_context_length_error(error) {
                Some(err) => err.into(),
                None => anyhow!("OpenAI API error: {}", error),
            });
        }

        let message = openai_response_to_message(&response)?;
        Ok((message, Usage::from_openai(response.get("usage"))))
    }
}
