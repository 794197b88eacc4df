//! These models represent the objects passed around by the relay
//!
//! There are several different related formats we need to interact with:
//! - run requests and streamed events, exchanged with the chat runtime and the orchestrator
//! - openai messages/tools, sent from the orchestrator to the LLM
//! - A2A messages, sent from the relay to the specialized agents
//!
//! The run request and event models follow the shape the chat runtime already speaks, so
//! consumers cannot tell whether they are talking to the relay or to the orchestrator directly.
//! The A2A wire types live next to the client in `agents`.
pub mod event;
pub mod message;
pub mod role;
pub mod run;
pub mod tool;
