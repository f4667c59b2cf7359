//! In-process transport backed by a port table and bounded queues.
//!
//! Reply ports are entries in a shared table: a one-shot right has exactly
//! one reserved buffer slot and disappears after a successful send; a
//! reusable right keeps a bounded queue and survives any number of sends.
//! A deallocated or closed port is an invalid destination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{MessageTransport, PortId, ReplyDest, SendOutcome, SendTimeout};

struct PortEntry {
    tx: mpsc::Sender<Bytes>,
    once: bool,
}

/// In-process [`MessageTransport`].
pub struct LoopbackTransport {
    ports: Mutex<HashMap<PortId, PortEntry>>,
    next_id: AtomicU64,
}

impl LoopbackTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ports: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates a one-shot reply right.
    ///
    /// The single buffer slot is reserved up front, so the first send cannot
    /// block; the right is consumed by that send.
    pub fn allocate_once_right(&self) -> (PortId, mpsc::Receiver<Bytes>) {
        self.allocate(1, true)
    }

    /// Allocates a reusable send right with the given queue depth.
    pub fn allocate_send_right(&self, queue_depth: usize) -> (PortId, mpsc::Receiver<Bytes>) {
        self.allocate(queue_depth.max(1), false)
    }

    /// Drops a right, making the port an invalid destination.
    pub fn deallocate(&self, id: PortId) {
        self.ports.lock().expect("port table poisoned").remove(&id);
    }

    fn allocate(&self, depth: usize, once: bool) -> (PortId, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(depth);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.ports
            .lock()
            .expect("port table poisoned")
            .insert(id, PortEntry { tx, once });
        (id, rx)
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTransport for LoopbackTransport {
    fn send(&self, dest: &ReplyDest, frame: Bytes, timeout: SendTimeout) -> SendOutcome {
        let id = match dest {
            ReplyDest::Null => return SendOutcome::InvalidDestination,
            ReplyDest::Once(id) | ReplyDest::Reusable(id) => *id,
        };

        let mut ports = self.ports.lock().expect("port table poisoned");
        let Some(entry) = ports.get(&id) else {
            return SendOutcome::InvalidDestination;
        };

        match entry.tx.try_send(frame) {
            Ok(()) => {
                if entry.once {
                    ports.remove(&id);
                }
                SendOutcome::Delivered
            }
            Err(TrySendError::Closed(_)) => {
                ports.remove(&id);
                SendOutcome::InvalidDestination
            }
            // A full queue within the bound is reported as timed out; the
            // loopback never actually waits, matching a zero-length kernel
            // send timeout.
            Err(TrySendError::Full(_)) => match timeout {
                SendTimeout::Bounded(_) => SendOutcome::TimedOut,
                SendTimeout::None => {
                    SendOutcome::Failed("one-shot reply buffer already occupied".to_string())
                }
            },
        }
    }
}
