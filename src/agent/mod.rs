//! Bounded agent loop and model gateway integration.

pub mod controller;
pub mod gateway;
pub mod instructions;
pub mod model;

pub use controller::{AgentLoop, EditRequest};
pub use model::ModelClient;
