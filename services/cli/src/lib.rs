//! Terminal client for the tutor API.

pub mod api_client;
pub mod display;
pub mod error;
pub mod input;
pub mod repl;
