use crate::state::AppState;
use a2a_relay::agents::AgentCard;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct AgentInfo {
    name: String,
    url: String,
    card: AgentCard,
}

#[derive(Debug, Serialize)]
struct AgentsResponse {
    agents: Vec<AgentInfo>,
}

// List the agents discovered at startup
async fn list_agents(State(state): State<AppState>) -> Json<AgentsResponse> {
    let agents = state
        .relay
        .directory()
        .iter()
        .map(|entry| AgentInfo {
            name: entry.name.clone(),
            url: entry.url.clone(),
            card: entry.card.clone(),
        })
        .collect();

    Json(AgentsResponse { agents })
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/agents", get(list_agents))
        .with_state(state)
}
