use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use a2a_relay::providers::configs::{ProviderConfig, OPENAI_DEFAULT_HOST, OPENAI_DEFAULT_MODEL};
use config::{Config, Environment};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

/// Settings without a default, by full key. Serde only reports the leaf name of a missing
/// field, so this is how the variable to set is found.
const REQUIRED_KEYS: &[&str] = &["provider.api_key"];

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentSettings {
    /// Endpoints of the specialized agents, e.g. `http://localhost:8000/balance`
    #[serde(default)]
    pub urls: Vec<String>,
    /// Appended to the orchestrator's system prompt
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub agents: AgentSettings,
    pub provider: ProviderConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("provider.type", "openai")?
            .set_default("provider.host", OPENAI_DEFAULT_HOST)?
            .set_default("provider.model", OPENAI_DEFAULT_MODEL)?
            // RELAY_AGENTS__URLS=http://localhost:8000/balance,http://localhost:8000/swap
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("agents.urls")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            match missing_key(&err) {
                Some(key) => ConfigError::MissingEnvVar {
                    env_var: to_env_var(&key),
                },
                None => ConfigError::Other(err),
            }
        })
    }
}

/// The dotted key a deserialization error complains about, if it is a missing value
fn missing_key(err: &config::ConfigError) -> Option<String> {
    if let config::ConfigError::NotFound(key) = err {
        return Some(key.clone());
    }

    // "missing field `api_key`"
    let message = err.to_string();
    let field = message.strip_prefix("missing field `")?.split('`').next()?;
    let key = REQUIRED_KEYS
        .iter()
        .find(|key| key.rsplit('.').next() == Some(field))
        .map_or(field, |key| *key);
    Some(key.to_string())
}
