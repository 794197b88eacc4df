pub mod agents;
pub mod conversation;
pub mod errors;
pub mod executor;
pub mod models;
pub mod orchestrator;
pub mod payment;
pub mod prompt;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod relay;
pub mod segments;
pub mod tools;
