//! Design infusion: theme extraction from images, prompt-driven proposals,
//! and iterative refinement of dashboard themes.

pub mod analysis;
pub mod color;
pub mod error;
pub mod handlers;
pub mod infusion;
pub mod types;

pub use handlers::configure_design_routes;
pub use infusion::DesignEngine;
