//! Error types for the session engine.
//!
//! Protocol-level failures (undecodable lines) are non-fatal: the engine
//! drops the offending line and stays live. The types here exist so the
//! driver and callers can tell the cases apart.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A received line could not be parsed as an IRC message.
    #[error("invalid message {string:?}: {cause}")]
    InvalidMessage {
        /// The raw line that failed to parse.
        string: String,
        /// The underlying parse failure.
        #[source]
        cause: MessageParseError,
    },

    /// A received line was not valid UTF-8.
    #[error("invalid UTF-8 in line at byte {byte_pos}")]
    InvalidUtf8 {
        /// Byte position where UTF-8 validation failed.
        byte_pos: usize,
    },

    /// Line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },
}

/// Errors raised while parsing a single IRC message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// The message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// No command token was found where one is required.
    #[error("missing command token")]
    MissingCommand,

    /// The message failed to parse at the given byte offset.
    #[error("parse error at byte {position}")]
    ParseError {
        /// Byte offset into the input where parsing stopped.
        position: usize,
    },
}

/// Errors surfaced by the connection driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Establishing the TCP connection failed.
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
}
