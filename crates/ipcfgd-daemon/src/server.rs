//! The request server: configuration, startup, and the sequential loop.
//!
//! One inbound message is fully processed — credentials extracted, operation
//! dispatched, reply delivered — before the next is dequeued. There is no
//! concurrent in-flight request handling; a privileged wait that blocks
//! inside the configuration subsystem delays everything queued behind it,
//! which is this design's documented trade-off.

use std::sync::Arc;
use std::time::Duration;

use ipcfgd_core::ConfigDelegate;
use thiserror::Error;
use tracing::{debug, error};

use crate::protocol::credentials;
use crate::protocol::dispatch::Dispatcher;
use crate::protocol::messages::DecodeConfig;
use crate::protocol::reply::{DeliveryState, Reply, ReplyEngine};
use crate::registrar::{self, NameService, RegisterOutcome, SERVICE_NAME};
use crate::transport::{ChannelEndpoint, MessageTransport, RawMessage, ReceiveChannel};

/// Server configuration.
///
/// Deserializable so an embedding daemon can read it straight from its
/// config file; every field has a default.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    service_name: String,
    reply_send_timeout: Duration,
    queue_depth: usize,
    decode_config: DecodeConfig,
}

impl ServerConfig {
    /// Default bound on a reply send to a reusable right.
    pub const DEFAULT_REPLY_SEND_TIMEOUT: Duration = Duration::from_millis(100);

    /// Default inbound queue depth.
    pub const DEFAULT_QUEUE_DEPTH: usize = 32;

    /// Configuration with defaults and the well-known service name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service_name: SERVICE_NAME.to_string(),
            reply_send_timeout: Self::DEFAULT_REPLY_SEND_TIMEOUT,
            queue_depth: Self::DEFAULT_QUEUE_DEPTH,
            decode_config: DecodeConfig::default(),
        }
    }

    /// Overrides the advertised service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Overrides the reply-send timeout for reusable rights.
    #[must_use]
    pub fn with_reply_send_timeout(mut self, timeout: Duration) -> Self {
        self.reply_send_timeout = timeout;
        self
    }

    /// Overrides the inbound queue depth.
    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Overrides the request decode bounds.
    #[must_use]
    pub fn with_decode_config(mut self, decode_config: DecodeConfig) -> Self {
        self.decode_config = decode_config;
        self
    }

    /// The advertised service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Startup failures surfaced to the embedding daemon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    /// Another instance already serves the well-known name.
    #[error("\"{name}\" is currently active")]
    AlreadyActive {
        /// The contested service name.
        name: String,
    },

    /// The name service could not be queried.
    #[error("name service registration failed for \"{name}\"")]
    RegistrationFailed {
        /// The service name being registered.
        name: String,
    },
}

/// The privileged request server.
pub struct RequestServer {
    config: ServerConfig,
    dispatcher: Dispatcher,
    engine: ReplyEngine,
}

impl RequestServer {
    /// Builds a server over the given transport and configuration subsystem.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        transport: Arc<dyn MessageTransport>,
        delegate: Arc<dyn ConfigDelegate>,
    ) -> Self {
        let dispatcher = Dispatcher::new(delegate).with_decode_config(config.decode_config);
        let engine = ReplyEngine::new(transport, config.reply_send_timeout);
        Self {
            config,
            dispatcher,
            engine,
        }
    }

    /// Registers with the name service and returns the bound receive channel.
    ///
    /// Refuses to start when another instance holds the service name,
    /// emitting the startup diagnostic; never creates a second channel.
    ///
    /// # Errors
    ///
    /// [`StartupError::AlreadyActive`] when the name is taken,
    /// [`StartupError::RegistrationFailed`] when the name service cannot be
    /// queried.
    pub fn register(
        &self,
        name_service: &dyn NameService,
    ) -> Result<(ReceiveChannel, ChannelEndpoint), StartupError> {
        let name = self.config.service_name();
        match registrar::register(name_service, name, self.config.queue_depth) {
            RegisterOutcome::AlreadyActive => {
                let err = StartupError::AlreadyActive {
                    name: name.to_string(),
                };
                error!("{err}");
                Err(err)
            }
            RegisterOutcome::RegistrationFailed => Err(StartupError::RegistrationFailed {
                name: name.to_string(),
            }),
            RegisterOutcome::Registered(channel, endpoint) => Ok((channel, endpoint)),
        }
    }

    /// Serves the channel until every endpoint is gone.
    ///
    /// Strictly sequential: the next message is not dequeued until the
    /// current one's reply has reached a terminal delivery state.
    pub async fn serve(&self, mut channel: ReceiveChannel) {
        while let Some(message) = channel.recv().await {
            self.handle_message(message);
        }
        debug!("request channel closed; server loop ending");
    }

    /// Processes one message end to end: extract, dispatch, deliver.
    ///
    /// Any transferable resources the message still owns when this returns
    /// are released as it drops; nothing survives the call.
    pub fn handle_message(&self, mut message: RawMessage) -> DeliveryState {
        let identity = credentials::extract(&message);
        let result = self.dispatcher.dispatch(message.frame(), &identity);
        let reply = Reply::new(message.reply_dest().clone(), result.frame);
        self.engine
            .deliver(&mut message, result.disposition, result.status, reply)
    }
}
