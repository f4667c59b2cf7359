//! Reply delivery with bounded sends and two-layer resource cleanup.
//!
//! A reply moves through a small state machine:
//!
//! ```text
//! Unsent ──▶ Suppressed                  (no reply wanted, nothing sent)
//!    │
//!    └─────▶ AttemptedSend ──▶ Delivered (peer accepted the frame)
//!                        └───▶ Abandoned (peer gone, stalled, or send failed)
//! ```
//!
//! Two independent resource lifetimes end here, and neither may outlive the
//! message being processed:
//!
//! 1. the *request's* transferable resources, released as soon as the
//!    operation fails so they cannot leak while the failure reply is built;
//! 2. the *reply's* transferable resources, released whenever the send does
//!    not actually hand them to the peer.
//!
//! Send bounds depend on the destination: a one-shot reply right cannot
//! block, so it sends unbounded; a reusable send right could stall the single
//! dispatch thread behind a client that stopped draining, so it sends under
//! the configured timeout. A vanished or stalled peer is routine and logged
//! by nobody; any other send failure is logged once.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ipcfgd_core::Status;
use tracing::info;

use crate::transport::{
    MessageTransport, RawMessage, ReplyDest, ResourceGuard, SendOutcome, SendTimeout,
};

/// Whether the operation wants a reply sent at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDisposition {
    /// Send the reply.
    Reply,
    /// One-way operation: suppress the reply.
    NoReply,
}

/// Terminal state of one reply's delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// No send was attempted; the destination was null or nulled.
    Suppressed,
    /// The peer accepted the frame.
    Delivered,
    /// The send was attempted and did not complete; the reply (and any
    /// resources it carried) has been disposed of.
    Abandoned,
}

/// A computed reply awaiting delivery.
#[derive(Debug)]
pub struct Reply {
    dest: ReplyDest,
    frame: Bytes,
    resources: Option<ResourceGuard>,
}

impl Reply {
    /// A reply without transferable resources of its own.
    #[must_use]
    pub fn new(dest: ReplyDest, frame: Bytes) -> Self {
        Self {
            dest,
            frame,
            resources: None,
        }
    }

    /// Attaches transferable resources, marking the reply complex.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceGuard) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Whether the reply carries transferable resources.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        self.resources.is_some()
    }
}

/// Delivers replies for the request server.
pub struct ReplyEngine {
    transport: Arc<dyn MessageTransport>,
    send_timeout: Duration,
}

impl ReplyEngine {
    /// Creates an engine sending through `transport`, bounding reusable-right
    /// sends by `send_timeout`.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>, send_timeout: Duration) -> Self {
        Self {
            transport,
            send_timeout,
        }
    }

    /// Delivers one reply, driving the state machine to a terminal state.
    ///
    /// `request` is the message being answered; on a failed operation its
    /// unconsumed resources are released here, before the send. Resources the
    /// request still holds afterwards are released when the caller drops it.
    pub fn deliver(
        &self,
        request: &mut RawMessage,
        disposition: ReplyDisposition,
        status: Status,
        mut reply: Reply,
    ) -> DeliveryState {
        if !reply.is_complex() && disposition == ReplyDisposition::NoReply {
            reply.dest = ReplyDest::Null;
        } else if !status.is_success() && request.is_complex() {
            // The failed operation never consumed the request's rights;
            // release them now. The reply destination is a separate right
            // and stays intact.
            drop(request.take_resources());
        }

        let (dest, timeout) = match &reply.dest {
            ReplyDest::Null => {
                drop(reply.resources.take());
                return DeliveryState::Suppressed;
            }
            dest @ ReplyDest::Once(_) => (dest.clone(), SendTimeout::None),
            dest @ ReplyDest::Reusable(_) => {
                (dest.clone(), SendTimeout::Bounded(self.send_timeout))
            }
        };

        let frame = std::mem::take(&mut reply.frame);
        match self.transport.send(&dest, frame, timeout) {
            SendOutcome::Delivered => {
                if let Some(resources) = reply.resources.take() {
                    resources.disarm();
                }
                DeliveryState::Delivered
            }
            // The client went away or stopped draining; routine, not logged.
            SendOutcome::TimedOut | SendOutcome::InvalidDestination => {
                drop(reply.resources.take());
                DeliveryState::Abandoned
            }
            SendOutcome::Failed(reason) => {
                info!(%reason, "reply send failed");
                drop(reply.resources.take());
                DeliveryState::Abandoned
            }
        }
    }
}
