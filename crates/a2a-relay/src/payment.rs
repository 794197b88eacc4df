//! Payment-required handling for specialized agents.
//!
//! Agents that charge for a task answer with an error signalling HTTP 402 semantics. The error
//! text is only semi-structured: it usually embeds a JSON object describing what to pay, but
//! nothing guarantees it. Everything here is pure so it can be tested against malformed input
//! on its own.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PAYMENT_REQUIRED_CODE: i64 = 402;
pub const PAYMENT_REQUIRED_ERROR: &str = "PAYMENT_REQUIRED";

const DEFAULT_AMOUNT: &str = "0";
const DEFAULT_TOKEN: &str = "MOVE";
const DEFAULT_DESCRIPTION: &str = "Payment is required to use this agent";

/// What a specialized agent asks to be paid before it fulfils a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    pub amount: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub description: String,
    /// The task that was refused, so it can be retried verbatim
    pub task: String,
    pub agent_name: String,
}

impl PaymentRequirement {
    /// Requirement used when the error text carries nothing usable
    pub fn fallback(agent_name: &str, task: &str) -> Self {
        Self {
            amount: DEFAULT_AMOUNT.to_string(),
            token: DEFAULT_TOKEN.to_string(),
            recipient: None,
            description: DEFAULT_DESCRIPTION.to_string(),
            task: task.to_string(),
            agent_name: agent_name.to_string(),
        }
    }

    /// Recover the requirement embedded in an agent's error text. Never fails: anything
    /// missing or malformed falls back to the defaults.
    pub fn from_error_text(text: &str, agent_name: &str, task: &str) -> Self {
        let mut requirement = Self::fallback(agent_name, task);
        let Some(Value::Object(object)) = extract_json_object(text) else {
            return requirement;
        };

        let details = ["paymentDetails", "payment_details", "payment"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_object))
            .unwrap_or(&object);

        if let Some(amount) = string_field(details, &["amount", "price", "maxAmountRequired"]) {
            requirement.amount = amount;
        }
        if let Some(token) = string_field(details, &["token", "currency", "asset"]) {
            requirement.token = token;
        }
        requirement.recipient = string_field(details, &["recipient", "recipientAddress", "payTo"]);
        if let Some(description) = string_field(details, &["description", "message"]) {
            requirement.description = description;
        }
        requirement
    }
}

/// The structured tool result handed back to the orchestrator instead of failing the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredEnvelope {
    pub error: String,
    pub payment_details: PaymentRequirement,
    pub message: String,
}

impl PaymentRequiredEnvelope {
    pub fn new(requirement: PaymentRequirement) -> Self {
        let message = format!(
            "Agent '{}' requires a payment of {} {} before it can complete this task. \
             Ask the user to pay, then call retry_a2a_agent_with_payment with the transaction hash.",
            requirement.agent_name, requirement.amount, requirement.token
        );
        Self {
            error: PAYMENT_REQUIRED_ERROR.to_string(),
            payment_details: requirement,
            message,
        }
    }

    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::new())
    }
}

/// Whether an agent error signals that payment is required
pub fn is_payment_required(code: Option<i64>, message: &str) -> bool {
    code == Some(PAYMENT_REQUIRED_CODE)
        || message.contains("402")
        || message.contains("Payment Required")
}

/// Find the first balanced `{...}` span in `text` that parses as a JSON object
pub fn extract_json_object(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| {
            let len = balanced_object_len(&text[start..])?;
            match serde_json::from_str::<Value>(&text[start..start + len]) {
                Ok(value) if value.is_object() => Some(value),
                _ => None,
            }
        })
}

/// Length of the brace-balanced prefix of `text`, which must start with `{`.
/// Braces inside JSON strings are ignored.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_payment_required() {
        assert!(is_payment_required(Some(402), "anything"));
        assert!(is_payment_required(None, "HTTP 402 from upstream"));
        assert!(is_payment_required(Some(-32000), "Payment Required"));
        assert!(!is_payment_required(Some(-32603), "Internal error"));
    }

    #[test]
    fn test_extract_from_surrounding_text() {
        let text = r#"Payment Required: {"amount":"5","token":"MOVE"} (see docs)"#;
        assert_eq!(
            extract_json_object(text),
            Some(json!({"amount": "5", "token": "MOVE"}))
        );
    }

    #[test]
    fn test_extract_nested_and_braces_in_strings() {
        let text = r#"err {"payment":{"amount":"1","description":"pay {now}"}} tail }"#;
        assert_eq!(
            extract_json_object(text),
            Some(json!({"payment": {"amount": "1", "description": "pay {now}"}}))
        );
    }

    #[test]
    fn test_extract_skips_malformed_candidate() {
        let text = r#"{not json} then {"amount":"2"}"#;
        assert_eq!(extract_json_object(text), Some(json!({"amount": "2"})));
    }

    #[test]
    fn test_extract_truncated() {
        assert_eq!(extract_json_object(r#"402 {"amount":"5","token":"#), None);
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_from_error_text_full() {
        let text = r#"402 Payment Required {"amount":"5","token":"MOVE","recipientAddress":"0xabc","description":"premium rates"}"#;
        let requirement = PaymentRequirement::from_error_text(text, "lending", "compare rates");
        assert_eq!(requirement.amount, "5");
        assert_eq!(requirement.token, "MOVE");
        assert_eq!(requirement.recipient.as_deref(), Some("0xabc"));
        assert_eq!(requirement.description, "premium rates");
        assert_eq!(requirement.task, "compare rates");
        assert_eq!(requirement.agent_name, "lending");
    }

    #[test]
    fn test_from_error_text_numeric_amount_and_wrapper() {
        let text = r#"{"error":"Payment Required","paymentDetails":{"amount":0.5,"currency":"USDC"}}"#;
        let requirement = PaymentRequirement::from_error_text(text, "swap", "quote");
        assert_eq!(requirement.amount, "0.5");
        assert_eq!(requirement.token, "USDC");
        assert_eq!(requirement.recipient, None);
    }

    #[test]
    fn test_from_error_text_falls_back() {
        let requirement =
            PaymentRequirement::from_error_text("Payment Required {broken", "balance", "task");
        assert_eq!(requirement, PaymentRequirement::fallback("balance", "task"));
        assert_eq!(requirement.amount, "0");
        assert_eq!(requirement.token, "MOVE");
    }

    #[test]
    fn test_partial_object_keeps_defaults() {
        let text = r#"{"error":"Payment Required","message":"x-payment header is required"}"#;
        let requirement = PaymentRequirement::from_error_text(text, "lending", "borrow");
        assert_eq!(requirement.amount, "0");
        assert_eq!(requirement.token, "MOVE");
        assert_eq!(requirement.description, "x-payment header is required");
    }

    #[test]
    fn test_envelope_shape() {
        let mut requirement = PaymentRequirement::fallback("lending", "borrow MOVE");
        requirement.amount = "5".to_string();
        let content = PaymentRequiredEnvelope::new(requirement).to_content();
        let value: Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["error"], "PAYMENT_REQUIRED");
        assert_eq!(value["paymentDetails"]["amount"], "5");
        assert_eq!(value["paymentDetails"]["token"], "MOVE");
        assert_eq!(value["paymentDetails"]["agentName"], "lending");
        assert!(!value["message"].as_str().unwrap().is_empty());
    }
}
