//! Error types shared across the application.
//!
//! Recoverable edit-tool outcomes (`NotFound`, `Ambiguous`, …) are *not*
//! represented here — they are returned as data to the model so it can
//! self-correct. `AppError` covers only fatal failures that propagate to
//! the request boundary.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Model gateway request or response failure.
    Model(String),
    /// Content fetch (scrape) failure.
    Fetch(String),
    /// Progress store write failure.
    Store(String),
    /// Workflow step failure.
    Workflow(String),
    /// HTTP server setup failure.
    Http(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Model(msg) => write!(f, "model: {msg}"),
            Self::Fetch(msg) => write!(f, "fetch: {msg}"),
            Self::Store(msg) => write!(f, "store: {msg}"),
            Self::Workflow(msg) => write!(f, "workflow: {msg}"),
            Self::Http(msg) => write!(f, "http: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}
