//! Error types for the Turnstile gateway.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Turnstile operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The call exceeded its quota on at least one tier
    #[error("Rate limit exceeded on tier '{tier}', retry after {retry_after:?}")]
    Throttled {
        /// Name of the tier that rejected the call
        tier: String,
        /// Time remaining in the rejecting tier's window
        retry_after: Duration,
    },

    /// The counter store could not be reached or answered inconsistently.
    /// Never converted into an admit-or-deny decision.
    #[error("Counter store error: {0}")]
    Store(String),

    /// The inbound call context did not yield a usable client key
    #[error("Invalid call context: {0}")]
    Call(String),

    /// gRPC server errors
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
