use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;

const PAYMENT_MARKER: &str = "Payment transaction hash:";

/// A local specialized agent that echoes its tasks, optionally behind a payment gate
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name the agent is served under, e.g. `balance` serves `/balance`
    #[arg(long)]
    name: String,

    #[arg(long, default_value_t = 9001)]
    port: u16,

    /// Require this payment before answering
    #[arg(long)]
    price: Option<String>,

    #[arg(long, default_value = "MOVE")]
    token: String,

    /// Address payments should be sent to
    #[arg(long)]
    recipient: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

fn card(args: &Args) -> Value {
    json!({
        "name": format!("{} agent", args.name),
        "description": format!("Stub {} agent that echoes its tasks", args.name),
        "url": format!("http://127.0.0.1:{}/{}", args.port, args.name),
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": {"streaming": false},
        "skills": [{
            "id": args.name,
            "name": args.name,
            "description": format!("Echo {} requests", args.name),
            "tags": ["stub"],
            "examples": [format!("{} for 0xabc", args.name)]
        }]
    })
}

fn task_text(params: &Value) -> Option<String> {
    params
        .pointer("/message/parts")?
        .as_array()?
        .iter()
        .filter(|part| part.get("kind").and_then(Value::as_str) == Some("text"))
        .find_map(|part| part.get("text").and_then(Value::as_str))
        .map(String::from)
}

fn rpc_error(id: Value, code: i64, message: String) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

fn handle_rpc(args: &Args, request: RpcRequest) -> Value {
    if request.method != "message/send" {
        return rpc_error(
            request.id,
            -32601,
            format!("Method not found: {}", request.method),
        );
    }
    let Some(text) = task_text(&request.params) else {
        return rpc_error(request.id, -32602, "Message has no text part".to_string());
    };

    let (task, payment) = match text.split_once(PAYMENT_MARKER) {
        Some((task, hash)) => (task.trim_end().to_string(), Some(hash.trim().to_string())),
        None => (text, None),
    };

    if let (Some(price), None) = (&args.price, &payment) {
        tracing::info!(agent = %args.name, %price, "refusing unpaid task");
        let requirement = json!({
            "amount": price,
            "token": args.token,
            "recipient": args.recipient,
            "description": format!("The {} agent charges {} {} per task", args.name, price, args.token),
        });
        return rpc_error(request.id, 402, format!("Payment Required: {}", requirement));
    }

    let reply = match payment {
        Some(hash) => format!("[{}] paid ({}): {}", args.name, hash, task),
        None => format!("[{}] {}", args.name, task),
    };
    tracing::info!(agent = %args.name, task = %task, "answered task");

    json!({
        "jsonrpc": "2.0",
        "id": request.id,
        "result": {
            "kind": "message",
            "messageId": Uuid::new_v4().to_string(),
            "role": "agent",
            "parts": [{"kind": "text", "text": reply}]
        }
    })
}

fn routes(
    args: Arc<Args>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let card_body = card(&args);
    let agent_card = warp::get()
        .and(warp::path(args.name.clone()))
        .and(warp::path(".well-known"))
        .and(warp::path("agent-card.json"))
        .and(warp::path::end())
        .map(move || warp::reply::json(&card_body));

    let send = warp::post()
        .and(warp::path(args.name.clone()))
        .and(warp::path::end())
        .and(warp::body::json())
        .map(move |request: RpcRequest| warp::reply::json(&handle_rpc(&args, request)));

    agent_card.or(send)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Arc::new(Args::parse());
    let port = args.port;
    tracing::info!(
        "Stub agent {} running at http://127.0.0.1:{}/{}",
        args.name,
        port,
        args.name
    );
    warp::serve(routes(args)).run(([127, 0, 0, 1], port)).await;
}
