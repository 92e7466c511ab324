//! serialosc discovery session.
//!
//! # How discovery works (for beginners)
//!
//! serialosc listens on a well-known UDP port (12002).  A client binds its
//! own port and then:
//!
//! 1. Sends `/serialosc/list <host> <port>`.  serialosc answers with one
//!    `/serialosc/device <id> <type> <port>` per attached device.
//! 2. Sends `/serialosc/notify <host> <port>`.  serialosc will send exactly
//!    one `/serialosc/add` or `/serialosc/remove` to that address the next
//!    time a device comes or goes.
//!
//! Because a notify subscription is single-shot, the session re-sends it
//! every time it receives an add or remove, *before* the event is handed to
//! the reader.  That keeps the subscription alive without the reader having
//! to remember.

use std::net::SocketAddr;

use async_trait::async_trait;
use monome_core::protocol::address::DEFAULT_PREFIX;
use monome_core::protocol::{discovery_table, HandlerTable};
use monome_core::{Command, ControlEvent, ControlEventKind};
use rosc::OscMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::endpoint::{CommandSender, Endpoint, MessageHandler, SessionError};
use super::SessionConfig;

/// Builds list and notify requests that point serialosc back at us.
#[derive(Debug, Clone)]
struct ReplyTo {
    host: String,
    port: u16,
}

impl ReplyTo {
    fn list(&self) -> Command {
        Command::List {
            host: self.host.clone(),
            port: self.port,
        }
    }

    fn notify(&self) -> Command {
        Command::Notify {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// Connection to the serialosc daemon.
#[derive(Debug)]
pub struct SerialOscSession {
    endpoint: Endpoint,
    reply_to: ReplyTo,
    events: tokio::sync::Mutex<mpsc::Receiver<ControlEvent>>,
}

impl SerialOscSession {
    /// Binds a local endpoint, starts receiving, and requests the device
    /// list.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Bind`] if no local port is available, or a
    /// send error if the list request cannot be delivered.
    pub async fn start(config: &SessionConfig) -> Result<Self, SessionError> {
        let target = SocketAddr::new(config.host, config.discovery_port);
        // Discovery addresses are absolute; the prefix is never applied.
        let endpoint = Endpoint::bind(config.host, target, DEFAULT_PREFIX).await?;
        let reply_to = ReplyTo {
            host: config.host.to_string(),
            port: endpoint.local_port(),
        };
        let (tx, rx) = mpsc::channel(config.queue_depth());

        endpoint.spawn_receiver(
            "serialosc",
            DiscoveryInbox {
                table: discovery_table(),
                sender: endpoint.sender().clone(),
                reply_to: reply_to.clone(),
                events: tx,
            },
        );
        info!(local_port = endpoint.local_port(), %target, "serialosc session bound");

        let session = Self {
            endpoint,
            reply_to,
            events: tokio::sync::Mutex::new(rx),
        };
        if let Err(e) = session.list().await {
            session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    /// Waits for the next control event.  Returns `None` once closed.
    pub async fn read(&self) -> Option<ControlEvent> {
        self.events.lock().await.recv().await
    }

    /// Asks serialosc to list attached devices.
    pub async fn list(&self) -> Result<(), SessionError> {
        self.endpoint.send(&self.reply_to.list()).await
    }

    /// Asks serialosc for the next add/remove notification.
    pub async fn subscribe(&self) -> Result<(), SessionError> {
        self.endpoint.send(&self.reply_to.notify()).await
    }

    pub fn local_port(&self) -> u16 {
        self.endpoint.local_port()
    }

    /// Where serialosc is expected to listen.
    pub fn serialosc_addr(&self) -> SocketAddr {
        self.endpoint.sender().target()
    }

    /// Closes the session.  Safe to call repeatedly.
    pub async fn close(&self) {
        if self.endpoint.close(None).await {
            info!(local_port = self.local_port(), "serialosc session closed");
        }
    }
}

/// Publishes control events, renewing the notify subscription on every
/// add or remove.
struct DiscoveryInbox {
    table: HandlerTable<ControlEvent>,
    sender: CommandSender,
    reply_to: ReplyTo,
    events: mpsc::Sender<ControlEvent>,
}

#[async_trait]
impl MessageHandler for DiscoveryInbox {
    async fn handle(&mut self, msg: OscMessage) -> bool {
        let event = match self.table.route(&msg) {
            None => return true,
            Some(Err(e)) => {
                warn!("dropping malformed serialosc message: {e}");
                return true;
            }
            Some(Ok(event)) => event,
        };

        if matches!(event.kind, ControlEventKind::Add | ControlEventKind::Remove) {
            match self.sender.send(&self.reply_to.notify()).await {
                Ok(()) => debug!(kind = %event.kind, "notify subscription renewed"),
                Err(e) => warn!("failed to renew notify subscription: {e}"),
            }
        }

        trace!(%event, "publishing");
        self.events.send(event).await.is_ok()
    }
}
