use a2a_relay::{
    agents::AgentDirectory,
    conversation::Conversation,
    errors::RelayError,
    models::{event::RunEvent, message::Message, run::RunInput},
    orchestrator::ProviderOrchestrator,
    providers::{configs::OpenAiProviderConfig, openai::OpenAiProvider},
    relay::{Relay, RelayStream},
    tools::SEND_MESSAGE_TOOL,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_with_tool_call(agent: &str, task: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": SEND_MESSAGE_TOOL,
                        "arguments": json!({"agentName": agent, "task": task}).to_string()
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
    })
}

fn completion_with_text(text: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 150, "completion_tokens": 10, "total_tokens": 160}
    })
}

/// An LLM that first requests one agent call, then answers once it has seen the result
async fn mock_llm(agent: &str, task: &str, answer: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_with_tool_call(agent, task)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"tool_call_id\":\"call_1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_with_text(answer)))
        .mount(&server)
        .await;
    server
}

async fn mount_card(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/.well-known/agent-card.json", name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{} agent", name),
            "description": format!("Handles {} requests", name),
            "version": "1.0.0",
            "skills": [{"id": name, "name": name, "description": "on Movement"}]
        })))
        .mount(server)
        .await;
}

async fn relay_for(llm: &MockServer, agents: &MockServer, names: &[&str]) -> Relay {
    let urls: Vec<String> = names
        .iter()
        .map(|name| format!("{}/{}", agents.uri(), name))
        .collect();
    let directory = AgentDirectory::discover(&urls).await.unwrap();

    let provider = OpenAiProvider::new(OpenAiProviderConfig {
        host: llm.uri(),
        api_key: "test_api_key".to_string(),
        model: "gpt-4o".to_string(),
        temperature: None,
        max_tokens: None,
    })
    .unwrap();
    let orchestrator = ProviderOrchestrator::new(Arc::new(provider));

    Relay::new(Arc::new(orchestrator), Arc::new(directory))
}

fn input() -> RunInput {
    RunInput::new("thread-1", "run-1").with_message(Message::user().with_text("check my balance"))
}

async fn collect(mut stream: RelayStream) -> (Vec<RunEvent>, Option<RelayError>) {
    let mut events = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => events.push(event),
            Err(error) => return (events, Some(error)),
        }
    }
    (events, None)
}

fn tool_results(events: &[RunEvent]) -> Vec<(String, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            RunEvent::ToolCallResult {
                tool_call_id,
                content,
                ..
            } => Some((tool_call_id.clone(), content.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_balance_round_trip() {
    let llm = mock_llm("balance", "get balance of 0xabc on movement", "You have 12.5 MOVE.").await;
    let agents = MockServer::start().await;
    mount_card(&agents, "balance").await;
    Mock::given(method("POST"))
        .and(path("/balance"))
        .and(body_partial_json(json!({
            "method": "message/send",
            "params": {"message": {"role": "user", "parts": [{"kind": "text", "text": "get balance of 0xabc on movement"}]}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"kind": "message", "role": "agent", "parts": [{"kind": "text", "text": "12.5 MOVE"}]}
        })))
        .expect(1)
        .mount(&agents)
        .await;

    let relay = relay_for(&llm, &agents, &["balance"]).await;
    let conversation = Conversation::default();
    let (events, error) = collect(relay.run_in(input(), conversation.clone())).await;

    assert!(error.is_none(), "unexpected error: {:?}", error);
    assert_eq!(
        tool_results(&events),
        vec![("call_1".to_string(), "12.5 MOVE".to_string())]
    );
    assert_eq!(events.iter().filter(|e| e.is_run_finished()).count(), 2);
    assert!(events.iter().any(|event| matches!(
        event,
        RunEvent::TextMessageContent { delta, .. } if delta == "You have 12.5 MOVE."
    )));

    let messages = conversation.snapshot();
    assert!(messages[0].is_system());
    assert!(messages[0].content.contains("**balance**"));
    assert!(conversation.has_tool_result("call_1"));
    assert_eq!(
        messages.last().map(|m| m.content.as_str()),
        Some("You have 12.5 MOVE.")
    );
}

#[tokio::test]
async fn test_payment_gate_surfaces_as_tool_result() {
    let llm = mock_llm("premium_lending", "compare rates of MOVE on movement", "That costs 5 MOVE.").await;
    let agents = MockServer::start().await;
    mount_card(&agents, "premium_lending").await;
    Mock::given(method("POST"))
        .and(path("/premium_lending"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": "Payment Required",
            "paymentDetails": {"amount": "5", "token": "MOVE", "recipient": "0xabc"}
        })))
        .expect(1)
        .mount(&agents)
        .await;

    let relay = relay_for(&llm, &agents, &["premium_lending"]).await;
    let (events, error) = collect(relay.run(input())).await;

    assert!(error.is_none(), "unexpected error: {:?}", error);
    let results = tool_results(&events);
    assert_eq!(results.len(), 1);
    let envelope: Value = serde_json::from_str(&results[0].1).unwrap();
    assert_eq!(envelope["error"], "PAYMENT_REQUIRED");
    assert_eq!(envelope["paymentDetails"]["amount"], "5");
    assert_eq!(envelope["paymentDetails"]["token"], "MOVE");
    assert_eq!(envelope["paymentDetails"]["recipient"], "0xabc");
    assert_eq!(envelope["paymentDetails"]["agentName"], "premium_lending");
    assert_eq!(
        envelope["paymentDetails"]["task"],
        "compare rates of MOVE on movement"
    );
    assert!(events.last().unwrap().is_run_finished());
}

#[tokio::test]
async fn test_unknown_agent_fails_the_run() {
    let llm = mock_llm("unknown", "get balance of 0xabc on movement", "unreachable").await;
    let agents = MockServer::start().await;
    mount_card(&agents, "balance").await;

    let relay = relay_for(&llm, &agents, &["balance"]).await;
    let (events, error) = collect(relay.run(input())).await;

    assert_eq!(error, Some(RelayError::AgentNotFound("unknown".to_string())));
    assert!(matches!(
        events.last(),
        Some(RunEvent::RunError { code: Some(code), .. }) if code == "AGENT_NOT_FOUND"
    ));
    assert_eq!(events.iter().filter(|e| e.is_run_finished()).count(), 0);
    // the orchestrator is never asked to continue
    assert_eq!(llm.received_requests().await.unwrap().len(), 1);
}
