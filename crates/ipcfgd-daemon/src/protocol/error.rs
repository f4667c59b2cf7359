//! Frame-level protocol errors.
//!
//! These cover malformed frames only. Authorization failures and subsystem
//! failures are not errors: they travel back to the caller as a status code
//! inside a well-formed reply.

use thiserror::Error;

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A request or reply frame that cannot be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame had no opcode tag.
    #[error("empty request frame")]
    EmptyFrame,

    /// The payload exceeded the configured decode bound.
    #[error("frame payload of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Actual payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The payload did not decode as the operation's request message.
    #[error("malformed payload: {reason}")]
    Malformed {
        /// Decoder diagnostic.
        reason: String,
    },

    /// A packed reply would overrun the fixed reply buffer.
    #[error("encoded reply of {len} bytes exceeds the {capacity} byte reply buffer")]
    ReplyTooLarge {
        /// Encoded reply length including the tag byte.
        len: usize,
        /// Fixed reply buffer capacity.
        capacity: usize,
    },
}
