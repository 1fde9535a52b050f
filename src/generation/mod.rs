//! Dashboard generation: widget planning, grid layout synthesis, and the
//! session-based orchestration of the end-to-end pipeline.

pub mod error;
pub mod handlers;
pub mod layout;
pub mod orchestrator;
pub mod prompts;
pub mod types;
pub mod widgets;

pub use handlers::configure_generation_routes;
pub use orchestrator::Orchestrator;
