//! huddle-api: Client for the meeting assistant chat backend
//!
//! This crate provides the wire types of the single-shot chat exchange and
//! an HTTP client that performs it.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ChatClient, DEFAULT_CHAT_PATH};
pub use error::{Error, Result};
pub use types::*;
