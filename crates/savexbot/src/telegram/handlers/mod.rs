//! Telegram bot handler tree configuration
//!
//! The same handler tree is used by polling and webhook modes.

mod callbacks;
mod commands;
mod messages;
mod schema;
mod types;

pub use messages::{route_text, Route};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, UserInfo};
