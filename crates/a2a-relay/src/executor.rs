use serde_json::Value;
use std::sync::Arc;

use crate::agents::{A2aMessage, AgentDirectory, SendOutcome};
use crate::errors::{RelayError, RelayResult};
use crate::payment::{is_payment_required, PaymentRequirement};

/// Sends one task to one specialized agent
#[derive(Debug, Clone)]
pub struct CallExecutor {
    directory: Arc<AgentDirectory>,
}

impl CallExecutor {
    pub fn new(directory: Arc<AgentDirectory>) -> Self {
        Self { directory }
    }

    /// Perform exactly one message-send request. A payment reference marks the call as a
    /// paid retry. No retries happen here.
    pub async fn execute(
        &self,
        agent_name: &str,
        task: &str,
        payment_ref: Option<&str>,
    ) -> RelayResult<String> {
        let entry = self
            .directory
            .get(agent_name)
            .ok_or_else(|| RelayError::AgentNotFound(agent_name.to_string()))?;

        let text = match payment_ref {
            Some(reference) => format!("{}\nPayment transaction hash: {}", task, reference),
            None => task.to_string(),
        };

        tracing::debug!(agent = %agent_name, paid = payment_ref.is_some(), "sending task to agent");
        let outcome = entry
            .client
            .send_message(A2aMessage::user_text(text))
            .await
            .map_err(|e| RelayError::AgentCallFailed {
                agent: agent_name.to_string(),
                message: e.to_string(),
            })?;

        match outcome {
            SendOutcome::Success(result) => Ok(result_text(&result)),
            SendOutcome::Error(error) => {
                let error_text = error.full_text();
                if is_payment_required(Some(error.code), &error_text) {
                    let requirement =
                        PaymentRequirement::from_error_text(&error_text, agent_name, task);
                    tracing::info!(
                        agent = %agent_name,
                        amount = %requirement.amount,
                        token = %requirement.token,
                        "agent requires payment"
                    );
                    Err(RelayError::PaymentRequired(Box::new(requirement)))
                } else {
                    Err(RelayError::AgentCallFailed {
                        agent: agent_name.to_string(),
                        message: error.message,
                    })
                }
            }
        }
    }
}

/// The text of a text-part answer, or the whole payload serialized
fn result_text(result: &Value) -> String {
    let text_part = match result.get("kind").and_then(Value::as_str) {
        Some("text") => Some(result),
        Some("message") => result
            .get("parts")
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .filter(|part| part.get("kind").and_then(Value::as_str) == Some("text")),
        _ => None,
    };

    match text_part.and_then(|part| part.get("text")).and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None => result.to_string(),
    }
}
