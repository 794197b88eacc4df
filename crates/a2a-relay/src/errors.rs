use thiserror::Error;

use crate::payment::PaymentRequirement;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Call to agent {agent} failed: {message}")]
    AgentCallFailed { agent: String, message: String },

    #[error("Agent {} requires payment of {} {}", .0.agent_name, .0.amount, .0.token)]
    PaymentRequired(Box<PaymentRequirement>),

    #[error("No recorded arguments for tool call {0}")]
    MissingToolArguments(String),

    #[error("Invalid arguments for tool call {id}: {message}")]
    InvalidToolArguments { id: String, message: String },

    #[error("Failed to discover agent at {agent}: {message}")]
    Discovery { agent: String, message: String },

    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    #[error("Orchestrator stream ended before the run finished")]
    OrchestratorStreamEnded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Stable code reported in `RUN_ERROR` events
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::AgentNotFound(_) => "AGENT_NOT_FOUND",
            RelayError::AgentCallFailed { .. } => "AGENT_CALL_FAILED",
            RelayError::PaymentRequired(_) => "PAYMENT_REQUIRED",
            RelayError::MissingToolArguments(_) => "MISSING_TOOL_ARGUMENTS",
            RelayError::InvalidToolArguments { .. } => "INVALID_TOOL_ARGUMENTS",
            RelayError::Discovery { .. } => "DISCOVERY_FAILED",
            RelayError::Orchestrator(_) => "ORCHESTRATOR_ERROR",
            RelayError::OrchestratorStreamEnded => "ORCHESTRATOR_STREAM_ENDED",
            RelayError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
