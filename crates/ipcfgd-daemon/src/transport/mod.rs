//! Kernel message-transport model.
//!
//! The real transport is an external collaborator: a kernel primitive that
//! delivers opaque request buffers and accepts a reply send with one of a
//! small set of delivery outcomes. This module models that contract —
//! [`RawMessage`], [`ReplyDest`], [`SendOutcome`], [`MessageTransport`] — and
//! provides the in-process [`LoopbackTransport`] used by the server's own
//! channel plumbing and by tests.
//!
//! # Resource ownership
//!
//! A message may carry transferable resources (rights, out-of-line data) that
//! must be explicitly consumed or released, never silently discarded. Those
//! are modeled by [`ResourceGuard`]: dropping an armed guard releases the
//! resources, and [`ResourceGuard::disarm`] marks them consumed by a
//! successful transfer. Every exit path of message processing therefore runs
//! exactly one of {release, disarm}.

mod loopback;

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

pub use loopback::LoopbackTransport;

/// Identifies a reply port within a transport.
pub type PortId = u64;

/// Destination of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDest {
    /// No destination; the reply is suppressed.
    Null,
    /// One-shot reply right. The transport holds buffer for exactly one
    /// message, so a send cannot block.
    Once(PortId),
    /// Reusable send right. A send may block indefinitely if the peer is not
    /// draining, so sends to it must be bounded.
    Reusable(PortId),
}

impl ReplyDest {
    /// Returns `true` when no destination is set.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// How long a send may wait for queue space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTimeout {
    /// No bound; only valid for destinations that cannot block.
    None,
    /// Give up after the given duration.
    Bounded(Duration),
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was handed to the destination.
    Delivered,
    /// The bounded wait elapsed with the peer's queue still full.
    TimedOut,
    /// The destination no longer exists.
    InvalidDestination,
    /// Any other transport failure, with a description.
    Failed(String),
}

/// Transferable message resources with scoped-ownership release.
///
/// The guard is armed on construction. Dropping an armed guard invokes the
/// release action; [`disarm`](Self::disarm) skips it, for resources whose
/// ownership moved to the peer in a successful send.
pub struct ResourceGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ResourceGuard {
    /// Creates a guard that runs `release` unless disarmed.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Marks the resources consumed; the release action will not run.
    pub fn disarm(mut self) {
        self.release.take();
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// An inbound request message as delivered by the transport.
///
/// `frame` is the opaque request buffer (`[opcode tag][payload]`); `trailer`
/// is the sender-credential metadata the kernel appends after the body.
#[derive(Debug)]
pub struct RawMessage {
    frame: Bytes,
    trailer: Bytes,
    reply_dest: ReplyDest,
    resources: Option<ResourceGuard>,
}

impl RawMessage {
    /// Builds a message without transferable resources.
    #[must_use]
    pub fn new(frame: Bytes, trailer: Bytes, reply_dest: ReplyDest) -> Self {
        Self {
            frame,
            trailer,
            reply_dest,
            resources: None,
        }
    }

    /// Attaches transferable resources, marking the message complex.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceGuard) -> Self {
        self.resources = Some(resources);
        self
    }

    /// The request buffer.
    #[must_use]
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }

    /// The kernel-appended credential trailer, possibly empty.
    #[must_use]
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    /// Where the reply should go.
    #[must_use]
    pub fn reply_dest(&self) -> &ReplyDest {
        &self.reply_dest
    }

    /// Whether the message still carries unconsumed transferable resources.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        self.resources.is_some()
    }

    /// Takes ownership of the message's resources, if any.
    ///
    /// The reply destination is unaffected; releasing request resources must
    /// never tear down the channel the reply goes out on.
    pub fn take_resources(&mut self) -> Option<ResourceGuard> {
        self.resources.take()
    }
}

/// The send half of the transport contract.
///
/// `send` never blocks the calling thread: a full destination queue resolves
/// immediately to [`SendOutcome::TimedOut`] under a bounded timeout, matching
/// a zero-length kernel send timeout.
pub trait MessageTransport: Send + Sync {
    /// Attempts to deliver `frame` to `dest`.
    fn send(&self, dest: &ReplyDest, frame: Bytes, timeout: SendTimeout) -> SendOutcome;
}

/// The server's receive endpoint, bound into the event loop.
///
/// Inbound messages queue here and are drained strictly sequentially by the
/// server loop. [`ChannelEndpoint`] is the advertisable handle the transport
/// (or an in-process client) delivers messages through.
#[derive(Debug)]
pub struct ReceiveChannel {
    rx: mpsc::Receiver<RawMessage>,
}

impl ReceiveChannel {
    /// Creates a channel with the given inbound queue depth, returning the
    /// receive side and its first deliverable endpoint.
    #[must_use]
    pub fn new(queue_depth: usize) -> (Self, ChannelEndpoint) {
        let (tx, rx) = mpsc::channel(queue_depth);
        (Self { rx }, ChannelEndpoint { tx })
    }

    /// Receives the next inbound message; `None` once every endpoint is gone.
    pub async fn recv(&mut self) -> Option<RawMessage> {
        self.rx.recv().await
    }
}

/// Cloneable delivery handle for a [`ReceiveChannel`].
#[derive(Debug, Clone)]
pub struct ChannelEndpoint {
    tx: mpsc::Sender<RawMessage>,
}

impl ChannelEndpoint {
    /// Delivers a message, waiting for queue space.
    ///
    /// Returns `false` if the receive side has shut down.
    pub async fn deliver(&self, message: RawMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn dropped_guard_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let guard = ResourceGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(guard);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disarmed_guard_does_not_release() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let guard = ResourceGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        guard.disarm();
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn take_resources_clears_complex_flag() {
        let msg = RawMessage::new(Bytes::new(), Bytes::new(), ReplyDest::Null)
            .with_resources(ResourceGuard::new(|| {}));
        let mut msg = msg;
        assert!(msg.is_complex());
        let guard = msg.take_resources();
        assert!(guard.is_some());
        assert!(!msg.is_complex());
        assert!(msg.take_resources().is_none());
    }

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (mut channel, endpoint) = ReceiveChannel::new(4);

        for tag in [1u8, 2, 3] {
            let delivered = endpoint
                .deliver(RawMessage::new(
                    Bytes::copy_from_slice(&[tag]),
                    Bytes::new(),
                    ReplyDest::Null,
                ))
                .await;
            assert!(delivered);
        }

        for expected in [1u8, 2, 3] {
            let msg = channel.recv().await.expect("message");
            assert_eq!(msg.frame()[0], expected);
        }
    }

    #[tokio::test]
    async fn recv_ends_when_endpoints_drop() {
        let (mut channel, endpoint) = ReceiveChannel::new(1);
        drop(endpoint);
        assert!(channel.recv().await.is_none());
    }
}
