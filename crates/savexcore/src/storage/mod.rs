//! User preference storage

pub mod db;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, UserRecord};
