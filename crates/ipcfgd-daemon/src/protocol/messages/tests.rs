//! Tests for protocol message types.

use prost::Message;

use super::*;

// ============================================================================
// Operation tags
// ============================================================================

#[test]
fn tag_roundtrip_covers_every_operation() {
    let ops = [
        OperationKind::ConfigIf,
        OperationKind::ConfigAll,
        OperationKind::WaitIf,
        OperationKind::WaitAll,
        OperationKind::IfName,
        OperationKind::IfAddr,
        OperationKind::IfCount,
        OperationKind::GetOption,
        OperationKind::GetPacket,
        OperationKind::Set,
        OperationKind::SetVerbose,
    ];
    assert_eq!(ops.len(), 11);
    for op in ops {
        assert_eq!(OperationKind::from_tag(op.tag()), Some(op));
    }
}

#[test]
fn error_tag_and_unknown_tags_parse_to_none() {
    assert_eq!(OperationKind::from_tag(ERROR_TAG), None);
    assert_eq!(OperationKind::from_tag(12), None);
    assert_eq!(OperationKind::from_tag(255), None);
}

#[test]
fn privilege_split_matches_operation_table() {
    use OperationKind::*;
    for op in [WaitIf, WaitAll, Set, SetVerbose] {
        assert!(op.requires_privilege(), "{op} must require privilege");
    }
    for op in [ConfigIf, ConfigAll, IfName, IfAddr, IfCount, GetOption, GetPacket] {
        assert!(!op.requires_privilege(), "{op} must not require privilege");
    }
}

// ============================================================================
// Request roundtrips
// ============================================================================

#[test]
fn set_request_roundtrip() {
    let request = SetRequest {
        name: "en0".to_string(),
        method: 3,
        method_data: vec![0xDE, 0xAD, 0xBE, 0xEF],
    };

    let bytes = request.encode_to_vec();
    let decoded = SetRequest::decode(bytes.as_slice()).expect("decode failed");

    assert_eq!(decoded.name, "en0");
    assert_eq!(decoded.method, 3);
    assert_eq!(decoded.method_data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn get_option_request_roundtrip() {
    let request = GetOptionRequest {
        name: "en1".to_string(),
        option_code: 53,
        max_len: 512,
    };

    let bytes = request.encode_to_vec();
    let decoded = GetOptionRequest::decode(bytes.as_slice()).expect("decode failed");

    assert_eq!(decoded.name, "en1");
    assert_eq!(decoded.option_code, 53);
    assert_eq!(decoded.max_len, 512);
}

#[test]
fn request_frame_carries_operation_tag() {
    let frame = encode_request(
        OperationKind::WaitIf,
        &WaitIfRequest {
            name: "en0".to_string(),
        },
    );
    assert_eq!(frame[0], OperationKind::WaitIf.tag());

    let decoded = WaitIfRequest::decode(&frame[1..]).expect("decode failed");
    assert_eq!(decoded.name, "en0");
}

#[test]
fn empty_payload_decodes_as_empty_request() {
    // proto3 empty messages encode to zero bytes.
    assert_eq!(ConfigAllRequest {}.encoded_len(), 0);
    assert!(IfCountRequest::decode(&[][..]).is_ok());
}

// ============================================================================
// Bounded decoding
// ============================================================================

#[test]
fn bounded_decode_accepts_within_limit() {
    let request = ConfigIfRequest {
        name: "en0".to_string(),
    };
    let bytes = request.encode_to_vec();

    let config = DecodeConfig::default();
    let decoded = ConfigIfRequest::decode_bounded(&bytes, &config).expect("decode should succeed");
    assert_eq!(decoded.name, "en0");
}

#[test]
fn bounded_decode_rejects_oversized_payload() {
    let request = SetRequest {
        name: "en0".to_string(),
        method: 1,
        method_data: vec![0u8; 256],
    };
    let bytes = request.encode_to_vec();

    let config = DecodeConfig::new(64, 64);
    let result = SetRequest::decode_bounded(&bytes, &config);
    assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
}

#[test]
fn bounded_decode_rejects_garbage() {
    let config = DecodeConfig::default();
    let result = SetRequest::decode_bounded(&[0xFF, 0xFF, 0xFF], &config);
    assert!(matches!(result, Err(ProtocolError::Malformed { .. })));
}

// ============================================================================
// Reply packing
// ============================================================================

#[test]
fn packed_reply_roundtrip() {
    let reply = IfCountReply {
        status: 0,
        count: 4,
    };
    let frame = pack_reply(OperationKind::IfCount.tag(), &reply).expect("pack failed");

    let (tag, payload) = split_reply(&frame).expect("split failed");
    assert_eq!(tag, OperationKind::IfCount.tag());

    let decoded = IfCountReply::decode(payload).expect("decode failed");
    assert_eq!(decoded.count, 4);
}

#[test]
fn reply_at_capacity_packs() {
    // Overhead: 1 frame tag + 2 bytes status field + field key/len for data.
    let reply = OptionDataReply {
        status: 0,
        data: vec![0xAB; REPLY_BUFFER_CAPACITY - 8],
    };
    assert!(pack_reply(OperationKind::GetOption.tag(), &reply).is_ok());
}

#[test]
fn oversized_reply_is_rejected_at_pack_time() {
    let reply = OptionDataReply {
        status: 0,
        data: vec![0xAB; REPLY_BUFFER_CAPACITY],
    };
    let result = pack_reply(OperationKind::GetOption.tag(), &reply);
    assert!(matches!(result, Err(ProtocolError::ReplyTooLarge { .. })));
}

#[test]
fn split_reply_rejects_empty_frame() {
    assert!(matches!(
        split_reply(&Bytes::new()),
        Err(ProtocolError::EmptyFrame)
    ));
}

#[test]
fn error_reply_uses_reserved_tag() {
    let reply = ErrorReply {
        status: 4,
        message: "unknown operation".to_string(),
    };
    let frame = pack_reply(ERROR_TAG, &reply).expect("pack failed");
    assert_eq!(frame[0], ERROR_TAG);
    assert_eq!(OperationKind::from_tag(frame[0]), None);
}
