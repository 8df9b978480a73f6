//! Protocol error types.

use crate::message::Direction;
use thiserror::Error;

/// Errors raised while decoding or encoding host packets.
///
/// A `MalformedPacket` is never recoverable for the packet that produced it:
/// callers drop the packet, log the error and carry on with the next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The declared structure disagrees with the bytes that are actually available
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// No header id is known for this message name in the given direction
    #[error("Unknown message '{name}' ({direction})")]
    UnknownMessage { direction: Direction, name: String },
}

impl ProtocolError {
    pub(crate) fn truncated(what: &str, needed: usize, remaining: usize) -> Self {
        Self::MalformedPacket(format!(
            "reading {what} needs {needed} bytes but only {remaining} remain"
        ))
    }
}
