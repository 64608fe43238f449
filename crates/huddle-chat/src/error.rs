//! Error types for huddle-chat

use thiserror::Error;

/// Result type alias using huddle-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the conversation store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operation would leave the store in an invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Why a submission did not start an exchange.
///
/// Both variants are local and are never surfaced to the user; callers
/// treat them as a no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Input was empty or whitespace only
    #[error("input is empty")]
    EmptyInput,

    /// Another exchange is still awaiting its response
    #[error("an exchange is already in flight")]
    AlreadyInFlight,
}
