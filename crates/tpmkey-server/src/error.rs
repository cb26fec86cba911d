//! Server error types.

use std::io;

use thiserror::Error;
use tpmkey_core::SessionError;

/// Errors that can occur in the server runtime.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Session ended with an error
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}
