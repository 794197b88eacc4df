use serde::{Deserialize, Serialize};

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

/// Which provider the orchestrator runs on, and how to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

fn default_host() -> String {
    OPENAI_DEFAULT_HOST.to_string()
}

fn default_model() -> String {
    OPENAI_DEFAULT_MODEL.to_string()
}

impl OpenAiProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: default_host(),
            api_key: api_key.into(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
        }
    }
}
