#![forbid(unsafe_code)]

//! `copydesk` — AI core of a content-generation dashboard.
//!
//! Hosts the bounded agent loop that lets a language model edit a markdown
//! document through a constrained tool protocol, the incremental decoder
//! for streamed model output, and the durable brand-analysis workflow.

pub mod agent;
pub mod config;
pub mod document;
pub mod errors;
pub mod persistence;
pub mod server;
pub mod stream;
pub mod workflow;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
