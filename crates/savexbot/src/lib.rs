//! SaveX bot: Telegram front end for the savexcore download pipeline
//!
//! - `telegram`: bot setup, handler tree, keyboards, admin notifications, webhook server
//! - `broadcast`: one-off announcement to every stored user
//! - `cli`: command line interface

pub mod broadcast;
pub mod cli;
pub mod telegram;
