//! Ephemeral UDP endpoint shared by every session type.
//!
//! An [`Endpoint`] owns one socket bound to an OS-assigned port.  It is used
//! in two directions:
//!
//! - **Send**: a [`CommandSender`] encodes a [`Command`] and fires it at the
//!   session's target with `send_to`.  There is no acknowledgement and no
//!   retry; a failed send is returned to the caller.
//!
//! - **Receive**: [`Endpoint::spawn_receiver`] starts a Tokio task that reads
//!   datagrams, decodes them, and hands each message to a
//!   [`MessageHandler`].  Handlers run inline, one message at a time, so
//!   events reach the session queue in datagram arrival order.
//!
//! # Shutdown
//!
//! Closing an endpoint flips a `watch` flag.  The receive loop selects on
//! that flag next to `recv_from`, so an intentional close ends the loop
//! cleanly and is logged at `debug`.  A `ConnectionReset` (a send to a
//! port nobody listens on, as reported by Windows) is logged at `warn` and
//! the loop keeps going.  Any other socket error is a fault: it is logged at
//! `error` and the loop ends.  Either way the handler is dropped,
//! which closes the session's event queue and lets pending readers see
//! end-of-stream.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use monome_core::protocol::{decode_datagram, encode_command, Command, ProtocolError};
use rosc::OscMessage;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// Errors surfaced by session construction and the send path.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The local UDP endpoint could not be allocated.
    #[error("failed to bind session endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// A datagram could not be sent.
    #[error("failed to send to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The socket failed while the receive loop was waiting for a datagram.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),
    /// A command could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The session has been closed.
    #[error("session is closed")]
    Closed,
}

/// Why a receive loop stopped without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The endpoint was closed (or dropped) by its owner.
    Shutdown,
    /// The session's event queue has no reader any more.
    ReaderGone,
}

/// Receives every decoded message on an endpoint.
#[async_trait]
pub trait MessageHandler: Send + 'static {
    /// Handles one message.
    ///
    /// Returns `false` once the session's reader has gone away, which ends
    /// the receive loop.
    async fn handle(&mut self, msg: OscMessage) -> bool;
}

// ── Send path ─────────────────────────────────────────────────────────────────

/// Stateless send half of an endpoint.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandSender {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    prefix: String,
}

impl CommandSender {
    /// Encodes `command` and sends it to the target as one datagram.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] if encoding fails and
    /// [`SessionError::Send`] if the socket rejects the datagram.
    pub async fn send(&self, command: &Command) -> Result<(), SessionError> {
        let bytes = encode_command(command, &self.prefix)?;
        self.socket
            .send_to(&bytes, self.target)
            .await
            .map_err(|source| SessionError::Send {
                target: self.target,
                source,
            })?;
        trace!(peer = %self.target, ?command, "sent");
        Ok(())
    }

    /// Where commands are sent.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// One session's UDP socket, its send half, and its shutdown switch.
#[derive(Debug)]
pub struct Endpoint {
    sender: CommandSender,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
}

impl Endpoint {
    /// Binds `host:0` and targets `target` for outbound commands.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Bind`] if the socket cannot be allocated.
    pub async fn bind(host: IpAddr, target: SocketAddr, prefix: &str) -> Result<Self, SessionError> {
        let addr = SocketAddr::new(host, 0);
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| SessionError::Bind { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| SessionError::Bind { addr, source })?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            sender: CommandSender {
                socket: Arc::new(socket),
                target,
                prefix: prefix.to_string(),
            },
            local_addr,
            shutdown,
            closed: AtomicBool::new(false),
        })
    }

    /// The OS-assigned local port devices should send events to.
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// A clone-able handle on the send path, for use inside handlers.
    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    /// Sends `command` unless the endpoint has been closed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] after [`close`](Self::close), or any
    /// error from [`CommandSender::send`].
    pub async fn send(&self, command: &Command) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.sender.send(command).await
    }

    /// Starts the receive loop on a Tokio task.
    pub fn spawn_receiver<H: MessageHandler>(&self, session: &'static str, handler: H) -> JoinHandle<()> {
        let socket = Arc::clone(&self.sender.socket);
        let shutdown = self.shutdown.subscribe();
        let port = self.local_port();

        tokio::spawn(async move {
            match receive_loop(socket, shutdown, handler).await {
                Ok(exit) => debug!(session, port, ?exit, "receive loop stopped"),
                Err(e) => error!(session, port, "receive loop failed: {e}"),
            }
        })
    }

    /// Closes the endpoint.  `farewell` is sent first, if given.
    ///
    /// Returns `false` if the endpoint was already closed; the farewell is
    /// only ever sent once.
    pub async fn close(&self, farewell: Option<&Command>) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(command) = farewell {
            if let Err(e) = self.sender.send(command).await {
                warn!(port = self.local_port(), "failed to send closing command: {e}");
            }
        }
        self.shutdown.send_replace(true);
        true
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ── Receive loop ──────────────────────────────────────────────────────────────

async fn receive_loop<H: MessageHandler>(
    socket: Arc<UdpSocket>,
    mut shutdown: watch::Receiver<bool>,
    mut handler: H,
) -> Result<LoopExit, SessionError> {
    let mut buf = vec![0u8; rosc::decoder::MTU];

    loop {
        if *shutdown.borrow() {
            return Ok(LoopExit::Shutdown);
        }

        let reader_alive = tokio::select! {
            biased;
            // Err means the Endpoint was dropped, which is also a shutdown.
            _ = shutdown.changed() => return Ok(LoopExit::Shutdown),
            received = receive_one(&socket, &mut buf, &mut handler) => received?,
        };

        if !reader_alive {
            return Ok(LoopExit::ReaderGone);
        }
    }
}

/// Reads one datagram and dispatches the messages it carries.
async fn receive_one<H: MessageHandler>(
    socket: &UdpSocket,
    buf: &mut [u8],
    handler: &mut H,
) -> Result<bool, SessionError> {
    let (len, src) = match socket.recv_from(buf).await {
        Ok(received) => received,
        Err(e) if is_peer_reset(&e) => {
            warn!("peer unreachable, still listening: {e}");
            return Ok(true);
        }
        Err(e) => return Err(SessionError::Receive(e)),
    };

    let messages = match decode_datagram(&buf[..len]) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(%src, "dropping undecodable datagram: {e}");
            return Ok(true);
        }
    };

    for msg in messages {
        if !handler.handle(msg).await {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Windows reports an ICMP port-unreachable for an earlier `send_to` as
/// `ConnectionReset` on the next receive.  The socket itself is still fine.
fn is_peer_reset(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::ConnectionReset
}

// ── Tests ─────────────────────────────────────────────────────────────────────
