//! Privileged request server for the ipcfgd daemon.
//!
//! This crate is the daemon's control-plane front door: it receives requests
//! over a kernel message-passing channel, authenticates the caller from
//! kernel-attached sender credentials, authorizes privileged operations,
//! dispatches into the configuration subsystem, and delivers a bounded reply
//! without leaking message resources or blocking on an unresponsive client.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────────────────────────────────────┐
//! │ transport  │──▶│ RequestServer::serve (strictly sequential)  │
//! │ (channel)  │   │                                             │
//! └────────────┘   │  credentials::extract                       │
//!                  │        │                                    │
//!                  │        ▼                                    │
//!                  │  Dispatcher ──▶ ConfigDelegate (external)   │
//!                  │        │                                    │
//!                  │        ▼                                    │
//!                  │  ReplyEngine ──▶ transport send             │
//!                  └─────────────────────────────────────────────┘
//! ```
//!
//! The [`registrar`] wires the receive channel up once at startup: it refuses
//! to start when another instance already holds the well-known service name,
//! and keeps serving (unadvertised) when advertisement fails.
//!
//! The configuration subsystem itself, the network protocols it speaks, and
//! the kernel transport are all external collaborators; this crate only
//! models their contracts ([`ipcfgd_core::ConfigDelegate`],
//! [`transport::MessageTransport`], [`registrar::NameService`]).

pub mod protocol;
pub mod registrar;
pub mod server;
pub mod transport;

pub use protocol::credentials::{self, SenderIdentity};
pub use protocol::dispatch::{authorize, DispatchResult, Dispatcher};
pub use protocol::messages::{DecodeConfig, OperationKind, REPLY_BUFFER_CAPACITY};
pub use protocol::reply::{DeliveryState, Reply, ReplyDisposition, ReplyEngine};
pub use registrar::{LookupOutcome, NameService, RegisterOutcome, SERVICE_NAME};
pub use server::{RequestServer, ServerConfig, StartupError};
