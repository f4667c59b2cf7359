//! Request protocol: credential extraction, dispatch, reply delivery.
//!
//! A request frame is `[opcode tag: u8][payload: protobuf]`; the reply frame
//! uses the same envelope, with tag 0 reserved for the generic error reply.
//! Sender credentials ride in a transport-appended trailer, never in the
//! frame itself.

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod reply;

pub use error::{ProtocolError, ProtocolResult};
