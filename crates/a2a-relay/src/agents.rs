//! Specialized agents reachable over the A2A protocol: their capability cards, the client
//! that talks to them and the directory of agents discovered at startup.
pub mod card;
pub mod client;
pub mod directory;

#[cfg(test)]
pub mod mock;

pub use card::{AgentCard, AgentSkill, AgentSummary};
pub use client::{A2aMessage, AgentClient, HttpAgentClient, JsonRpcError, Part, SendOutcome};
pub use directory::{agent_name_from_url, AgentDirectory, AgentEntry};
