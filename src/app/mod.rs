//! Application layer containing business logic and shared state.

pub mod service;
pub mod state;

pub use service::{ConfigurationService, PropertyService};
pub use state::AppState;
