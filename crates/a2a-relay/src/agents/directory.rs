use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use super::card::{AgentCard, AgentSummary};
use super::client::{AgentClient, HttpAgentClient};
use crate::errors::{RelayError, RelayResult};

/// A discovered specialized agent
#[derive(Clone)]
pub struct AgentEntry {
    pub name: String,
    pub url: String,
    pub card: AgentCard,
    pub client: Arc<dyn AgentClient>,
}

impl std::fmt::Debug for AgentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEntry")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("card", &self.card)
            .finish()
    }
}

/// The name an agent is addressed by: the last non-empty path segment of its endpoint,
/// or the host when the endpoint has no path.
pub fn agent_name_from_url(endpoint: &str) -> Option<String> {
    let parsed = Url::parse(endpoint).ok()?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(String::from)
        .or_else(|| parsed.host_str().map(String::from))
}

/// The agents discovered at startup, addressed by exact name
#[derive(Debug, Default)]
pub struct AgentDirectory {
    entries: Vec<AgentEntry>,
}

impl AgentDirectory {
    /// Discover every agent over HTTP. Fails if any agent cannot be reached.
    pub async fn discover(urls: &[String]) -> RelayResult<Self> {
        let clients = urls
            .iter()
            .map(|url| {
                HttpAgentClient::new(url.as_str())
                    .map(|client| Arc::new(client) as Arc<dyn AgentClient>)
                    .map_err(|e| RelayError::Discovery {
                        agent: url.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<RelayResult<Vec<_>>>()?;

        Self::discover_with(clients).await
    }

    /// Fetch all cards concurrently through the given clients
    pub async fn discover_with(clients: Vec<Arc<dyn AgentClient>>) -> RelayResult<Self> {
        let fetches = clients.into_iter().map(|client| async move {
            let url = client.url().to_string();
            let name = agent_name_from_url(&url).ok_or_else(|| RelayError::Discovery {
                agent: url.clone(),
                message: "cannot derive an agent name from the endpoint".to_string(),
            })?;
            let card = client
                .fetch_card()
                .await
                .map_err(|e| RelayError::Discovery {
                    agent: url.clone(),
                    message: e.to_string(),
                })?;
            tracing::info!(agent = %name, url = %url, skills = card.skills.len(), "discovered agent");
            Ok(AgentEntry {
                name,
                url,
                card,
                client,
            })
        });

        let entries = join_all(fetches)
            .await
            .into_iter()
            .collect::<RelayResult<Vec<_>>>()?;

        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<AgentEntry>) -> RelayResult<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(RelayError::Discovery {
                    agent: entry.url.clone(),
                    message: format!("duplicate agent name '{}'", entry.name),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&AgentEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.entries
            .iter()
            .map(|entry| AgentSummary::new(&entry.name, &entry.card))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
