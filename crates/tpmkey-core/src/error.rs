//! Error types for the tpmkey protocol core.
//!
//! Errors are layered the way data flows:
//! - [`MachineError`]: local shape and parameter checks on the machine
//! - [`ChannelError`]: transport and framing failures
//! - [`SessionError`]: everything that can end a session, as seen by the
//!   session driver
//!
//! Every session error is fatal. Nothing is retried. Failing to converge is
//! not an error: it is reported as `ok = false` in the session outcome.

use std::io;

use thiserror::Error;
use tpmkey_crypto::CryptoError;
use tpmkey_proto::RecordError;

use crate::env::EntropyError;

/// Errors from machine construction and computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// Input (or output) shape does not match the machine.
    #[error("dimension mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    Dimension {
        /// Machine row count (K).
        expected_rows: usize,
        /// Machine inputs per row (N).
        expected_cols: usize,
        /// Rows supplied.
        rows: usize,
        /// Columns of the first offending row (or of row 0).
        cols: usize,
    },

    /// Machine parameters are unusable.
    #[error("invalid machine parameters: {reason}")]
    InvalidParams {
        /// What is wrong.
        reason: String,
    },
}

/// Errors from the framed channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The stream ended before a complete record was read, or the peer is
    /// gone.
    #[error("connection closed")]
    ConnectionClosed,

    /// A line could not be decoded into a record.
    #[error(transparent)]
    Malformed(#[from] RecordError),

    /// Transport failure.
    #[error("connection error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::ConnectionClosed,
            _ => Self::Io(err),
        }
    }
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Round input shape does not match the local machine.
    #[error("dimension mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    Dimension {
        /// Local row count (K).
        expected_rows: usize,
        /// Local inputs per row (N).
        expected_cols: usize,
        /// Rows received.
        rows: usize,
        /// Columns received.
        cols: usize,
    },

    /// Undecodable record.
    #[error("malformed frame: {reason}")]
    MalformedFrame {
        /// Decoder message.
        reason: String,
    },

    /// Well-formed record of a type not allowed at this point.
    #[error("protocol violation: expected {expected}, got {actual}")]
    ProtocolViolation {
        /// Record types acceptable in the current state.
        expected: &'static str,
        /// Type of the record received.
        actual: &'static str,
    },

    /// Round number does not match the local round counter.
    #[error("round out of sequence: expected {expected}, got {actual}")]
    RoundOutOfSequence {
        /// Round the local party is in (or expects next).
        expected: u64,
        /// Round carried by the record.
        actual: u64,
    },

    /// Transport ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Transport failed.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),

    /// Session configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// Key confirmation failed to run.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// No randomness for a seed, an input, or a nonce.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl SessionError {
    /// Returns true if the session ended because of the transport rather than
    /// anything the peer sent.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Connection(_))
    }
}

impl From<MachineError> for SessionError {
    fn from(err: MachineError) -> Self {
        match err {
            MachineError::Dimension { expected_rows, expected_cols, rows, cols } => {
                Self::Dimension { expected_rows, expected_cols, rows, cols }
            },
            MachineError::InvalidParams { reason } => Self::InvalidConfig { reason },
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::ConnectionClosed => Self::ConnectionClosed,
            ChannelError::Malformed(e) => Self::MalformedFrame { reason: e.to_string() },
            ChannelError::Io(e) => Self::Connection(e),
        }
    }
}
