// Export route modules
pub mod agents;
pub mod health;
pub mod run;

#[cfg(test)]
pub mod mock;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(run::routes(state.clone()))
        .merge(agents::routes(state))
        .merge(health::routes())
}
