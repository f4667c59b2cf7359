//! Fuzz target for credential-trailer parsing.
//!
//! Arbitrary trailer bytes must never panic the extractor, and must never
//! resolve to the superuser unless the trailer is a well-formed superuser
//! trailer: recognized format, adequate declared size, uid field zero.

#![no_main]

use bytes::Bytes;
use ipcfgd_daemon::credentials::{self, CREDENTIALS_FORMAT, CREDENTIALS_MIN_SIZE};
use ipcfgd_daemon::transport::{RawMessage, ReplyDest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let message = RawMessage::new(
        Bytes::new(),
        Bytes::copy_from_slice(data),
        ReplyDest::Null,
    );
    let identity = credentials::extract(&message);

    if identity.resolved {
        // Resolution implies a well-formed header and embedded ids.
        assert!(data.len() >= CREDENTIALS_MIN_SIZE as usize);
        let format = u32::from_le_bytes(data[0..4].try_into().unwrap());
        let declared = u32::from_le_bytes(data[4..8].try_into().unwrap());
        assert_eq!(format, CREDENTIALS_FORMAT);
        assert!(declared >= CREDENTIALS_MIN_SIZE);
        let uid = u32::from_le_bytes(data[8..12].try_into().unwrap());
        assert_eq!(identity.uid, uid);
        assert_eq!(identity.is_superuser(), uid == 0);
    } else {
        assert!(!identity.is_superuser());
    }
});
