//! Sender-credential extraction from the transport trailer.
//!
//! The transport appends a credential trailer after the message body,
//! identifying the sending process's user and group. The trailer is
//! untrusted input: any format or size violation resolves to the unresolved
//! sentinel identity, which the authorization gate treats as unprivileged.
//!
//! Identity is recomputed from scratch for every inbound message and threaded
//! through dispatch as a value. It is never stored anywhere a later request
//! could observe.

use crate::transport::RawMessage;

/// Recognized trailer format version.
pub const CREDENTIALS_FORMAT: u32 = 0;

/// Minimum declared trailer size: format, size, uid, gid as `u32`s.
pub const CREDENTIALS_MIN_SIZE: u32 = 16;

/// Sentinel uid/gid for an unresolved identity, the unsigned image of -1.
pub const UNRESOLVED_ID: u32 = u32::MAX;

/// The authenticated identity of a request's sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderIdentity {
    /// Sender's user id; [`UNRESOLVED_ID`] when unresolved.
    pub uid: u32,
    /// Sender's group id; [`UNRESOLVED_ID`] when unresolved.
    pub gid: u32,
    /// Whether the trailer validated and the ids are trustworthy.
    pub resolved: bool,
}

impl SenderIdentity {
    /// The sentinel identity for a missing or malformed trailer.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            uid: UNRESOLVED_ID,
            gid: UNRESOLVED_ID,
            resolved: false,
        }
    }

    /// An identity recovered from a valid trailer.
    #[must_use]
    pub const fn authenticated(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            gid,
            resolved: true,
        }
    }

    /// Whether this identity may invoke privileged operations.
    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.resolved && self.uid == 0
    }
}

/// Recovers the sender identity from a message's trailer.
///
/// Runs exactly once per inbound message, before dispatch. No side effects.
#[must_use]
pub fn extract(message: &RawMessage) -> SenderIdentity {
    parse_trailer(message.trailer())
}

/// Encodes a credential trailer, little-endian.
///
/// Used by in-process clients and tests; the kernel writes this layout on a
/// real transport.
#[must_use]
pub fn encode_trailer(uid: u32, gid: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CREDENTIALS_MIN_SIZE as usize);
    buf.extend_from_slice(&CREDENTIALS_FORMAT.to_le_bytes());
    buf.extend_from_slice(&CREDENTIALS_MIN_SIZE.to_le_bytes());
    buf.extend_from_slice(&uid.to_le_bytes());
    buf.extend_from_slice(&gid.to_le_bytes());
    buf
}

fn parse_trailer(trailer: &[u8]) -> SenderIdentity {
    if trailer.len() < CREDENTIALS_MIN_SIZE as usize {
        return SenderIdentity::unresolved();
    }

    let format = u32::from_le_bytes(trailer[0..4].try_into().expect("4-byte slice"));
    let declared_size = u32::from_le_bytes(trailer[4..8].try_into().expect("4-byte slice"));

    if format != CREDENTIALS_FORMAT
        || declared_size < CREDENTIALS_MIN_SIZE
        || declared_size as usize > trailer.len()
    {
        return SenderIdentity::unresolved();
    }

    let uid = u32::from_le_bytes(trailer[8..12].try_into().expect("4-byte slice"));
    let gid = u32::from_le_bytes(trailer[12..16].try_into().expect("4-byte slice"));
    SenderIdentity::authenticated(uid, gid)
}
