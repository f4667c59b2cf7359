//! Operation dispatch and the authorization gate.
//!
//! The dispatcher maps a request frame's opcode tag to one of the eleven
//! handlers. Each handler unpacks and validates its payload, applies the
//! authorization gate where the operation requires privilege, calls the
//! configuration subsystem, and packs a reply. A handler's only observable
//! side effects are that delegate call and the reply itself.
//!
//! Nothing here is a hard error toward the transport: authorization and
//! subsystem failures come back as a status code inside a well-formed reply,
//! malformed frames come back as the generic error reply, and an unknown
//! opcode is logged and answered the same way. The caller always gets a
//! reply frame to deliver (or suppress).

use std::sync::Arc;

use bytes::Bytes;
use ipcfgd_core::{ConfigDelegate, ConfigMethod, InterfaceName, Status};
use prost::Message;
use tracing::{debug, info};

use super::credentials::SenderIdentity;
use super::error::ProtocolError;
use super::messages::{
    pack_reply, AckReply, BoundedDecode, ConfigAllRequest, ConfigIfRequest, DecodeConfig,
    ErrorReply, GetOptionRequest, GetPacketRequest, IfAddrReply, IfAddrRequest, IfCountReply,
    IfCountRequest, IfNameReply, IfNameRequest, OperationKind, OptionDataReply, SetRequest,
    SetVerboseRequest, WaitAllRequest, WaitIfRequest, ERROR_TAG, MAX_REPLY_DATA_LEN,
};
use super::reply::ReplyDisposition;

/// The authorization gate.
///
/// Pure predicate: an operation that requires privilege may proceed only for
/// a resolved superuser identity. Unresolved identities are unprivileged by
/// definition.
#[must_use]
pub fn authorize(identity: &SenderIdentity, requires_privilege: bool) -> bool {
    !requires_privilege || identity.is_superuser()
}

/// One dispatched request's computed reply.
#[derive(Debug)]
pub struct DispatchResult {
    /// Packed reply frame, ready for the delivery engine.
    pub frame: Bytes,
    /// The status carried in the reply; drives failure-path resource cleanup.
    pub status: Status,
    /// Whether a reply should be sent at all; one-way operations suppress it.
    pub disposition: ReplyDisposition,
}

/// Routes request frames to operation handlers.
pub struct Dispatcher {
    delegate: Arc<dyn ConfigDelegate>,
    decode_config: DecodeConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over the given configuration subsystem.
    #[must_use]
    pub fn new(delegate: Arc<dyn ConfigDelegate>) -> Self {
        Self {
            delegate,
            decode_config: DecodeConfig::default(),
        }
    }

    /// Overrides the decode bounds.
    #[must_use]
    pub fn with_decode_config(mut self, decode_config: DecodeConfig) -> Self {
        self.decode_config = decode_config;
        self
    }

    /// Dispatches one request frame under the sender's identity.
    ///
    /// The identity is recomputed per message by the caller and passed by
    /// value-reference here; the dispatcher holds no identity state between
    /// calls.
    pub fn dispatch(&self, frame: &Bytes, identity: &SenderIdentity) -> DispatchResult {
        let Some((&tag, payload)) = frame.split_first() else {
            info!("rejecting empty request frame");
            return error_result(Status::InvalidParameter, "empty request frame");
        };

        let Some(op) = OperationKind::from_tag(tag) else {
            info!(tag, "unknown operation tag in request");
            return error_result(Status::InvalidOperation, format!("unknown operation tag {tag}"));
        };

        match op {
            OperationKind::ConfigIf => self.config_if(payload),
            OperationKind::ConfigAll => self.config_all(payload),
            OperationKind::WaitIf => self.wait_if(payload, identity),
            OperationKind::WaitAll => self.wait_all(payload, identity),
            OperationKind::IfName => self.if_name(payload),
            OperationKind::IfAddr => self.if_addr(payload),
            OperationKind::IfCount => self.if_count(payload),
            OperationKind::GetOption => self.get_option(payload),
            OperationKind::GetPacket => self.get_packet(payload),
            OperationKind::Set => self.set(payload, identity),
            OperationKind::SetVerbose => self.set_verbose(payload, identity),
        }
    }

    fn config_if(&self, payload: &[u8]) -> DispatchResult {
        let request = match ConfigIfRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::ConfigIf, &e),
        };
        let Ok(name) = InterfaceName::new(request.name) else {
            return ack(OperationKind::ConfigIf, Status::InvalidParameter);
        };

        debug!(name = %name, "config_if");
        self.delegate.config_interface(&name);
        ack(OperationKind::ConfigIf, Status::Success)
    }

    fn config_all(&self, payload: &[u8]) -> DispatchResult {
        if let Err(e) = ConfigAllRequest::decode_bounded(payload, &self.decode_config) {
            return decode_failure(OperationKind::ConfigAll, &e);
        }

        debug!("config_all");
        self.delegate.config_all();
        ack(OperationKind::ConfigAll, Status::Success)
    }

    fn wait_if(&self, payload: &[u8], identity: &SenderIdentity) -> DispatchResult {
        let request = match WaitIfRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::WaitIf, &e),
        };
        if !authorize(identity, true) {
            return denied(OperationKind::WaitIf, identity);
        }
        let Ok(name) = InterfaceName::new(request.name) else {
            return ack(OperationKind::WaitIf, Status::InvalidParameter);
        };

        debug!(name = %name, "waiting for interface to complete");
        if self.delegate.wait_interface(&name) {
            ack(OperationKind::WaitIf, Status::Success)
        } else {
            ack(OperationKind::WaitIf, Status::InternalError)
        }
    }

    fn wait_all(&self, payload: &[u8], identity: &SenderIdentity) -> DispatchResult {
        if let Err(e) = WaitAllRequest::decode_bounded(payload, &self.decode_config) {
            return decode_failure(OperationKind::WaitAll, &e);
        }
        if !authorize(identity, true) {
            return denied(OperationKind::WaitAll, identity);
        }

        debug!("waiting for all interfaces to complete");
        self.delegate.wait_all();
        ack(OperationKind::WaitAll, Status::Success)
    }

    fn if_name(&self, payload: &[u8]) -> DispatchResult {
        let request = match IfNameRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::IfName, &e),
        };

        let reply = match self.delegate.interface_name(request.index) {
            Ok(name) => IfNameReply {
                status: Status::Success.code(),
                name: name.as_str().to_string(),
            },
            Err(status) => IfNameReply {
                status: status.code(),
                name: String::new(),
            },
        };
        let status = Status::from_code(reply.status).unwrap_or(Status::InternalError);
        packed(OperationKind::IfName, &reply, status)
    }

    fn if_addr(&self, payload: &[u8]) -> DispatchResult {
        let request = match IfAddrRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::IfAddr, &e),
        };
        let Ok(name) = InterfaceName::new(request.name) else {
            return packed(
                OperationKind::IfAddr,
                &IfAddrReply {
                    status: Status::InvalidParameter.code(),
                    addr: 0,
                },
                Status::InvalidParameter,
            );
        };

        let reply = match self.delegate.interface_addr(&name) {
            Ok(addr) => IfAddrReply {
                status: Status::Success.code(),
                addr: u32::from(addr),
            },
            Err(status) => IfAddrReply {
                status: status.code(),
                addr: 0,
            },
        };
        let status = Status::from_code(reply.status).unwrap_or(Status::InternalError);
        packed(OperationKind::IfAddr, &reply, status)
    }

    fn if_count(&self, payload: &[u8]) -> DispatchResult {
        if let Err(e) = IfCountRequest::decode_bounded(payload, &self.decode_config) {
            return decode_failure(OperationKind::IfCount, &e);
        }

        let reply = IfCountReply {
            status: Status::Success.code(),
            count: self.delegate.interface_count(),
        };
        packed(OperationKind::IfCount, &reply, Status::Success)
    }

    fn get_option(&self, payload: &[u8]) -> DispatchResult {
        let request = match GetOptionRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::GetOption, &e),
        };
        let Ok(name) = InterfaceName::new(request.name) else {
            return data_reply(OperationKind::GetOption, Err(Status::InvalidParameter), 0);
        };

        let result = self
            .delegate
            .interface_option(&name, request.option_code);
        data_reply(OperationKind::GetOption, result, request.max_len)
    }

    fn get_packet(&self, payload: &[u8]) -> DispatchResult {
        let request = match GetPacketRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::GetPacket, &e),
        };
        let Ok(name) = InterfaceName::new(request.name) else {
            return data_reply(OperationKind::GetPacket, Err(Status::InvalidParameter), 0);
        };

        let result = self.delegate.interface_packet(&name);
        data_reply(OperationKind::GetPacket, result, request.max_len)
    }

    fn set(&self, payload: &[u8], identity: &SenderIdentity) -> DispatchResult {
        let request = match SetRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::Set, &e),
        };
        if !authorize(identity, true) {
            return denied(OperationKind::Set, identity);
        }
        let Ok(name) = InterfaceName::new(request.name) else {
            return ack(OperationKind::Set, Status::InvalidParameter);
        };
        let Some(method) = ConfigMethod::from_code(request.method) else {
            return ack(OperationKind::Set, Status::MethodNotSupported);
        };
        if request.method_data.len() > self.decode_config.max_data_bytes() {
            return ack(OperationKind::Set, Status::InvalidParameter);
        }

        debug!(name = %name, method = %method, "set");
        let status = self
            .delegate
            .set_config(&name, method, &request.method_data);
        ack(OperationKind::Set, status)
    }

    fn set_verbose(&self, payload: &[u8], identity: &SenderIdentity) -> DispatchResult {
        let request = match SetVerboseRequest::decode_bounded(payload, &self.decode_config) {
            Ok(request) => request,
            Err(e) => return decode_failure(OperationKind::SetVerbose, &e),
        };
        if !authorize(identity, true) {
            return denied(OperationKind::SetVerbose, identity);
        }

        debug!(verbose = request.verbose, "set_verbose");
        let status = self.delegate.set_verbose(request.verbose);
        ack(OperationKind::SetVerbose, status)
    }
}

/// Packs an op-typed reply frame.
fn packed(op: OperationKind, reply: &impl Message, status: Status) -> DispatchResult {
    let frame = pack_reply(op.tag(), reply).expect("fixed-size reply fits the reply buffer");
    DispatchResult {
        frame,
        status,
        disposition: ReplyDisposition::Reply,
    }
}

/// Status-only reply.
fn ack(op: OperationKind, status: Status) -> DispatchResult {
    packed(
        op,
        &AckReply {
            status: status.code(),
        },
        status,
    )
}

/// Permission-denied short circuit: the delegate is never consulted.
fn denied(op: OperationKind, identity: &SenderIdentity) -> DispatchResult {
    debug!(
        op = %op,
        uid = identity.uid,
        resolved = identity.resolved,
        "permission denied"
    );
    ack(op, Status::PermissionDenied)
}

/// Variable-length result reply with the two-sided size check: the caller's
/// declared capacity and the fixed reply buffer. Oversized results fail with
/// `BufferTooSmall`; nothing is truncated.
fn data_reply(
    op: OperationKind,
    result: Result<Vec<u8>, Status>,
    caller_capacity: u32,
) -> DispatchResult {
    let (status, data) = match result {
        Ok(data) => {
            if data.len() > caller_capacity as usize || data.len() > MAX_REPLY_DATA_LEN {
                (Status::BufferTooSmall, Vec::new())
            } else {
                (Status::Success, data)
            }
        }
        Err(status) => (status, Vec::new()),
    };
    packed(
        op,
        &OptionDataReply {
            status: status.code(),
            data,
        },
        status,
    )
}

/// Generic error reply (tag 0) for frames that never reached a handler.
fn error_result(status: Status, message: impl Into<String>) -> DispatchResult {
    let reply = ErrorReply {
        status: status.code(),
        message: message.into(),
    };
    let frame = pack_reply(ERROR_TAG, &reply).expect("error reply fits the reply buffer");
    DispatchResult {
        frame,
        status,
        disposition: ReplyDisposition::Reply,
    }
}

/// Decode failure: recovered locally into the generic error reply.
fn decode_failure(op: OperationKind, error: &ProtocolError) -> DispatchResult {
    debug!(op = %op, error = %error, "request payload rejected");
    error_result(Status::InvalidParameter, error.to_string())
}
