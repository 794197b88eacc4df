use a2a_relay::relay::Relay;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}
