use a2a_relay::{
    agents::AgentDirectory, orchestrator::ProviderOrchestrator, providers::factory, relay::Relay,
};
use anyhow::Result;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

mod configuration;
mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let settings = configuration::Settings::new()?;

    // Discover the specialized agents before accepting runs
    let directory = AgentDirectory::discover(&settings.agents.urls).await?;
    info!(agents = ?directory.names(), "agent discovery complete");

    let provider = factory::get_provider(settings.provider)?;
    let orchestrator = ProviderOrchestrator::new(provider);

    let mut relay = Relay::new(Arc::new(orchestrator), Arc::new(directory));
    if let Some(instructions) = settings.agents.instructions {
        relay = relay.with_instructions(instructions);
    }

    // Create app state
    let state = AppState::new(relay);

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    // Run server
    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
