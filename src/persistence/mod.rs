//! Persistence layer modules.

pub mod brand_repo;
pub mod db;
pub mod progress_store;
pub mod retention;
pub mod schema;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
