//! Defines the wire-level error type.

use thiserror::Error;

use super::message::Kind;

/// An error produced by the framing or message codec layer.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The peer's version line shared no version with ours.
    #[error("no common protocol version")]
    VersionMismatch,
    /// The message is invalid, truncated, or carries an unexpected kind.
    #[error("invalid message: {0}")]
    Invalid(String),
    /// A message kind that exists on the wire but isn't implemented by this
    /// core (the farewell/auth kinds reserved by the protocol).
    #[error("unimplemented message kind: {0:?}")]
    Unimplemented(Kind),
    /// A zero-length packet was read where a framed body was expected.
    #[error("empty packet")]
    EmptyPacket,
    /// An I/O error occurred reading or writing a packet.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
