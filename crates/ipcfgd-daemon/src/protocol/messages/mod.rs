//! Wire messages for the request protocol.
//!
//! Frames are `[tag: u8][payload: protobuf]`. Request tags are the
//! [`OperationKind`] values; reply frames reuse the request's tag, with
//! tag 0 ([`ERROR_TAG`]) reserved for the generic [`ErrorReply`].
//!
//! Replies are packed into a fixed-capacity buffer
//! ([`REPLY_BUFFER_CAPACITY`]); [`pack_reply`] rejects anything larger, so a
//! handler with a variable-length result must size-check before packing.

#[cfg(test)]
mod tests;

use bytes::Bytes;
use prost::Message;

use super::error::ProtocolError;

/// Fixed reply buffer capacity in bytes, tag byte included.
pub const REPLY_BUFFER_CAPACITY: usize = 1024;

/// Reply tag for the generic error reply.
pub const ERROR_TAG: u8 = 0;

/// Largest variable-length result a reply may carry.
///
/// Leaves headroom inside [`REPLY_BUFFER_CAPACITY`] for the frame tag, the
/// status field and the data field's own key and length prefix, so a result
/// that passes this check always packs.
pub const MAX_REPLY_DATA_LEN: usize = REPLY_BUFFER_CAPACITY - 16;

// ============================================================================
// Operations
// ============================================================================

/// The eleven operations the server exposes.
///
/// A closed enum rather than a numeric switch: adding or removing an
/// operation is an exhaustive, compiler-checked change everywhere the
/// operation is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationKind {
    /// Kick a configuration pass for one interface.
    ConfigIf = 1,
    /// Kick a configuration pass for every interface.
    ConfigAll = 2,
    /// Block until one interface's configuration completes.
    WaitIf = 3,
    /// Block until every interface's configuration completes.
    WaitAll = 4,
    /// Resolve an interface index to its name.
    IfName = 5,
    /// Read an interface's IPv4 address.
    IfAddr = 6,
    /// Count the interfaces the subsystem tracks.
    IfCount = 7,
    /// Read raw option bytes the interface last received.
    GetOption = 8,
    /// Read the last configuration packet the interface received.
    GetPacket = 9,
    /// Apply a configuration method to an interface.
    Set = 10,
    /// Adjust subsystem log verbosity.
    SetVerbose = 11,
}

impl OperationKind {
    /// Attempts to parse an operation from a frame tag byte.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::ConfigIf),
            2 => Some(Self::ConfigAll),
            3 => Some(Self::WaitIf),
            4 => Some(Self::WaitAll),
            5 => Some(Self::IfName),
            6 => Some(Self::IfAddr),
            7 => Some(Self::IfCount),
            8 => Some(Self::GetOption),
            9 => Some(Self::GetPacket),
            10 => Some(Self::Set),
            11 => Some(Self::SetVerbose),
            _ => None,
        }
    }

    /// Returns the frame tag byte for this operation.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the operation mutates configuration state or waits on it, and
    /// therefore requires the superuser.
    #[must_use]
    pub const fn requires_privilege(self) -> bool {
        matches!(
            self,
            Self::WaitIf | Self::WaitAll | Self::Set | Self::SetVerbose
        )
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ConfigIf => "config_if",
            Self::ConfigAll => "config_all",
            Self::WaitIf => "wait_if",
            Self::WaitAll => "wait_all",
            Self::IfName => "if_name",
            Self::IfAddr => "if_addr",
            Self::IfCount => "if_count",
            Self::GetOption => "get_option",
            Self::GetPacket => "get_packet",
            Self::Set => "set",
            Self::SetVerbose => "set_verbose",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Bounded decoding
// ============================================================================

/// Decode bounds for inbound payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    max_payload_bytes: usize,
    max_data_bytes: usize,
}

impl DecodeConfig {
    /// Default payload bound: tag byte plus the largest request comfortably
    /// fits well under this.
    pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2048;

    /// Default bound for embedded variable-length data (`method_data`).
    pub const DEFAULT_MAX_DATA_BYTES: usize = 1024;

    /// Creates a config with explicit bounds.
    #[must_use]
    pub const fn new(max_payload_bytes: usize, max_data_bytes: usize) -> Self {
        Self {
            max_payload_bytes,
            max_data_bytes,
        }
    }

    /// Maximum accepted payload length, excluding the tag byte.
    #[must_use]
    pub const fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Maximum accepted length for variable-length data embedded in a
    /// request.
    #[must_use]
    pub const fn max_data_bytes(&self) -> usize {
        self.max_data_bytes
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_PAYLOAD_BYTES,
            Self::DEFAULT_MAX_DATA_BYTES,
        )
    }
}

/// Length-checked protobuf decoding.
pub trait BoundedDecode: Message + Default + Sized {
    /// Decodes `payload`, rejecting it outright when it exceeds the
    /// configured bound.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FrameTooLarge`] for an oversized payload,
    /// [`ProtocolError::Malformed`] when decoding fails.
    fn decode_bounded(payload: &[u8], config: &DecodeConfig) -> Result<Self, ProtocolError> {
        if payload.len() > config.max_payload_bytes() {
            return Err(ProtocolError::FrameTooLarge {
                len: payload.len(),
                max: config.max_payload_bytes(),
            });
        }
        Self::decode(payload).map_err(|e| ProtocolError::Malformed {
            reason: e.to_string(),
        })
    }
}

impl<T: Message + Default> BoundedDecode for T {}

// ============================================================================
// Request messages
// ============================================================================

/// `config_if` request.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigIfRequest {
    /// Interface to configure.
    #[prost(string, tag = "1")]
    pub name: String,
}

/// `config_all` request.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigAllRequest {}

/// `wait_if` request.
#[derive(Clone, PartialEq, Message)]
pub struct WaitIfRequest {
    /// Interface to wait for.
    #[prost(string, tag = "1")]
    pub name: String,
}

/// `wait_all` request.
#[derive(Clone, PartialEq, Message)]
pub struct WaitAllRequest {}

/// `if_name` request.
#[derive(Clone, PartialEq, Message)]
pub struct IfNameRequest {
    /// Interface index to resolve.
    #[prost(uint32, tag = "1")]
    pub index: u32,
}

/// `if_addr` request.
#[derive(Clone, PartialEq, Message)]
pub struct IfAddrRequest {
    /// Interface whose address to read.
    #[prost(string, tag = "1")]
    pub name: String,
}

/// `if_count` request.
#[derive(Clone, PartialEq, Message)]
pub struct IfCountRequest {}

/// `get_option` request.
#[derive(Clone, PartialEq, Message)]
pub struct GetOptionRequest {
    /// Interface whose option data to read.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Option code to look up.
    #[prost(uint32, tag = "2")]
    pub option_code: u32,
    /// Caller's output buffer capacity in bytes.
    #[prost(uint32, tag = "3")]
    pub max_len: u32,
}

/// `get_packet` request.
#[derive(Clone, PartialEq, Message)]
pub struct GetPacketRequest {
    /// Interface whose last packet to read.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Caller's output buffer capacity in bytes.
    #[prost(uint32, tag = "2")]
    pub max_len: u32,
}

/// `set` request.
#[derive(Clone, PartialEq, Message)]
pub struct SetRequest {
    /// Interface to reconfigure.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Configuration method identifier (`ipcfgd_core::ConfigMethod`).
    #[prost(int32, tag = "2")]
    pub method: i32,
    /// Method-specific payload, opaque to the server.
    #[prost(bytes = "vec", tag = "3")]
    pub method_data: Vec<u8>,
}

/// `set_verbose` request.
#[derive(Clone, PartialEq, Message)]
pub struct SetVerboseRequest {
    /// Desired verbosity.
    #[prost(bool, tag = "1")]
    pub verbose: bool,
}

// ============================================================================
// Reply messages
// ============================================================================

/// Status-only reply, used by every operation without result data.
#[derive(Clone, PartialEq, Message)]
pub struct AckReply {
    /// Subsystem status code.
    #[prost(int32, tag = "1")]
    pub status: i32,
}

/// `if_name` reply.
#[derive(Clone, PartialEq, Message)]
pub struct IfNameReply {
    /// Subsystem status code.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Resolved interface name; empty on failure.
    #[prost(string, tag = "2")]
    pub name: String,
}

/// `if_addr` reply.
#[derive(Clone, PartialEq, Message)]
pub struct IfAddrReply {
    /// Subsystem status code.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// IPv4 address as a 32-bit value; zero on failure.
    #[prost(fixed32, tag = "2")]
    pub addr: u32,
}

/// `if_count` reply.
#[derive(Clone, PartialEq, Message)]
pub struct IfCountReply {
    /// Subsystem status code.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Number of interfaces the subsystem tracks.
    #[prost(uint32, tag = "2")]
    pub count: u32,
}

/// `get_option` / `get_packet` reply.
#[derive(Clone, PartialEq, Message)]
pub struct OptionDataReply {
    /// Subsystem status code.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Result bytes; empty on failure.
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

/// Generic error reply (tag 0), for frames that never reached a handler.
#[derive(Clone, PartialEq, Message)]
pub struct ErrorReply {
    /// Status code describing the rejection.
    #[prost(int32, tag = "1")]
    pub status: i32,
    /// Human-readable diagnostic.
    #[prost(string, tag = "2")]
    pub message: String,
}

// ============================================================================
// Frame packing
// ============================================================================

/// Encodes a request frame: `[op tag][payload]`.
///
/// Used by in-process clients and tests.
#[must_use]
pub fn encode_request(op: OperationKind, request: &impl Message) -> Bytes {
    let mut buf = Vec::with_capacity(1 + request.encoded_len());
    buf.push(op.tag());
    request.encode(&mut buf).expect("encode cannot fail");
    Bytes::from(buf)
}

/// Packs a reply frame into the fixed reply buffer.
///
/// # Errors
///
/// [`ProtocolError::ReplyTooLarge`] when the encoded frame (tag included)
/// would exceed [`REPLY_BUFFER_CAPACITY`].
pub fn pack_reply(tag: u8, reply: &impl Message) -> Result<Bytes, ProtocolError> {
    let len = 1 + reply.encoded_len();
    if len > REPLY_BUFFER_CAPACITY {
        return Err(ProtocolError::ReplyTooLarge {
            len,
            capacity: REPLY_BUFFER_CAPACITY,
        });
    }
    let mut buf = Vec::with_capacity(len);
    buf.push(tag);
    reply.encode(&mut buf).expect("encode cannot fail");
    Ok(Bytes::from(buf))
}

/// Splits a reply frame into its tag and payload.
///
/// # Errors
///
/// [`ProtocolError::EmptyFrame`] when the frame has no tag byte.
pub fn split_reply(frame: &Bytes) -> Result<(u8, &[u8]), ProtocolError> {
    if frame.is_empty() {
        return Err(ProtocolError::EmptyFrame);
    }
    Ok((frame[0], &frame[1..]))
}
