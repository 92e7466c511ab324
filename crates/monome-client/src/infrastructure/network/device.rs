//! Shared plumbing for grid and arc sessions.
//!
//! A [`DeviceLink`] binds the endpoint, starts the receive loop with a
//! [`DeviceInbox`], sends the handshake, and tracks readiness plus the
//! session lifecycle.  [`GridSession`](super::GridSession) and
//! [`ArcSession`](super::ArcSession) are thin typed wrappers over it.
//!
//! # Handshake
//!
//! ```text
//! /sys/host  <host>
//! /sys/port  <our local port>
//! /sys/prefix <prefix>
//! /sys/info/id
//! /sys/info/size        (grid only)
//! ```
//!
//! Each step is its own datagram, sent in that order.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use monome_core::protocol::address::normalize_prefix;
use monome_core::protocol::{arc_table, grid_table, DeviceInbound, HandlerTable};
use monome_core::{Command, DeviceEvent, DeviceKind, Readiness, SessionState};
use rosc::OscMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::endpoint::{Endpoint, MessageHandler, SessionError};
use super::SessionConfig;

/// Readiness plus lifecycle, shared between the session and its receive loop.
#[derive(Debug)]
struct DeviceState {
    readiness: Readiness,
    lifecycle: SessionState,
}

type SharedState = Arc<Mutex<DeviceState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, DeviceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One connection to a grid or arc.
#[derive(Debug)]
pub(crate) struct DeviceLink {
    kind: DeviceKind,
    host: IpAddr,
    prefix: String,
    endpoint: Endpoint,
    state: SharedState,
    events: tokio::sync::Mutex<mpsc::Receiver<DeviceEvent>>,
}

impl DeviceLink {
    /// Binds, starts receiving, and sends the handshake.
    ///
    /// The receive loop is running before the first handshake datagram
    /// leaves, so early replies are never missed.
    pub(crate) async fn start(
        kind: DeviceKind,
        device_port: u16,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let prefix = normalize_prefix(&config.prefix).to_string();
        let target = SocketAddr::new(config.host, device_port);
        let endpoint = Endpoint::bind(config.host, target, &prefix).await?;

        let (table, readiness) = match kind {
            DeviceKind::Grid => (grid_table(&prefix), Readiness::grid()),
            DeviceKind::Arc => (arc_table(&prefix), Readiness::arc()),
        };
        let state = Arc::new(Mutex::new(DeviceState {
            readiness,
            lifecycle: SessionState::Created,
        }));
        let (tx, rx) = mpsc::channel(config.queue_depth());

        endpoint.spawn_receiver(
            session_label(kind),
            DeviceInbox {
                kind,
                table,
                state: Arc::clone(&state),
                events: tx,
            },
        );

        info!(
            device = %kind,
            local_port = endpoint.local_port(),
            device_port,
            "device session bound"
        );

        let link = Self {
            kind,
            host: config.host,
            prefix,
            endpoint,
            state,
            events: tokio::sync::Mutex::new(rx),
        };

        if let Err(e) = link.handshake().await {
            link.close(None).await;
            return Err(e);
        }
        Ok(link)
    }

    async fn handshake(&self) -> Result<(), SessionError> {
        self.advance(SessionState::Connecting);

        let mut steps = vec![
            Command::SysHost(self.host.to_string()),
            Command::SysPort(self.endpoint.local_port()),
            Command::SysPrefix(self.prefix.clone()),
            Command::InfoId,
        ];
        if self.kind == DeviceKind::Grid {
            steps.push(Command::InfoSize);
        }

        for step in &steps {
            self.endpoint.send(step).await?;
        }
        debug!(device = %self.kind, steps = steps.len(), "handshake sent");
        Ok(())
    }

    /// Waits for the next event.  `None` once the session has closed.
    pub(crate) async fn read(&self) -> Option<DeviceEvent> {
        self.events.lock().await.recv().await
    }

    pub(crate) async fn send(&self, command: &Command) -> Result<(), SessionError> {
        self.endpoint.send(command).await
    }

    /// Closes the link, sending `farewell` first on the first call only.
    pub(crate) async fn close(&self, farewell: Option<&Command>) {
        if self.endpoint.close(farewell).await {
            self.advance(SessionState::Closed);
            info!(device = %self.kind, local_port = self.endpoint.local_port(), "device session closed");
        }
    }

    pub(crate) fn id(&self) -> Option<String> {
        lock(&self.state).readiness.id().map(str::to_string)
    }

    pub(crate) fn size(&self) -> Option<(i32, i32)> {
        lock(&self.state).readiness.size()
    }

    pub(crate) fn state(&self) -> SessionState {
        lock(&self.state).lifecycle
    }

    pub(crate) fn local_port(&self) -> u16 {
        self.endpoint.local_port()
    }

    pub(crate) fn device_addr(&self) -> SocketAddr {
        self.endpoint.sender().target()
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    fn advance(&self, to: SessionState) {
        let mut state = lock(&self.state);
        state.lifecycle = state.lifecycle.advance(to);
    }
}

fn session_label(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Grid => "grid",
        DeviceKind::Arc => "arc",
    }
}

// ── Receive side ──────────────────────────────────────────────────────────────

/// Turns routed device messages into queued [`DeviceEvent`]s.
struct DeviceInbox {
    kind: DeviceKind,
    table: HandlerTable<DeviceInbound>,
    state: SharedState,
    events: mpsc::Sender<DeviceEvent>,
}

impl DeviceInbox {
    /// Folds one inbound report into the shared state.  Returns the event
    /// to publish, if any.
    fn absorb(&self, inbound: DeviceInbound) -> Option<DeviceEvent> {
        let mut state = lock(&self.state);
        let event = match inbound {
            DeviceInbound::Id(id) => state.readiness.record_id(id),
            DeviceInbound::Size { width, height } => state.readiness.record_size(width, height),
            DeviceInbound::Event(event) => Some(event),
        };
        if matches!(event, Some(DeviceEvent::Ready { .. })) {
            state.lifecycle = state.lifecycle.advance(SessionState::Ready);
        }
        event
    }
}

#[async_trait]
impl MessageHandler for DeviceInbox {
    async fn handle(&mut self, msg: OscMessage) -> bool {
        let inbound = match self.table.route(&msg) {
            None => return true,
            Some(Err(e)) => {
                warn!(device = %self.kind, "dropping malformed message: {e}");
                return true;
            }
            Some(Ok(inbound)) => inbound,
        };

        match self.absorb(inbound) {
            Some(event) => {
                trace!(device = %self.kind, %event, "publishing");
                self.events.send(event).await.is_ok()
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::OscType;

    fn inbox(kind: DeviceKind) -> (DeviceInbox, mpsc::Receiver<DeviceEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let (table, readiness) = match kind {
            DeviceKind::Grid => (grid_table("monome"), Readiness::grid()),
            DeviceKind::Arc => (arc_table("monome"), Readiness::arc()),
        };
        let state = Arc::new(Mutex::new(DeviceState {
            readiness,
            lifecycle: SessionState::Connecting,
        }));
        (
            DeviceInbox {
                kind,
                table,
                state,
                events: tx,
            },
            rx,
        )
    }

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[tokio::test]
    async fn test_grid_inbox_marks_ready_after_id_and_size() {
        // Arrange
        let (mut inbox, mut rx) = inbox(DeviceKind::Grid);

        // Act
        assert!(inbox.handle(msg("/sys/id", vec![OscType::String("m0000001".into())])).await);
        assert!(inbox.handle(msg("/sys/size", vec![OscType::Int(8), OscType::Int(8)])).await);

        // Assert
        assert_eq!(
            rx.try_recv().ok(),
            Some(DeviceEvent::Ready {
                id: "m0000001".into()
            })
        );
        assert!(rx.try_recv().is_err(), "exactly one event");
        assert_eq!(lock(&inbox.state).lifecycle, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_arc_inbox_is_ready_on_id_alone() {
        let (mut inbox, mut rx) = inbox(DeviceKind::Arc);

        inbox.handle(msg("/sys/id", vec![OscType::String("a1".into())])).await;

        assert_eq!(rx.try_recv().ok(), Some(DeviceEvent::Ready { id: "a1".into() }));
    }

    #[tokio::test]
    async fn test_inbox_drops_malformed_and_keeps_going() {
        let (mut inbox, mut rx) = inbox(DeviceKind::Grid);

        let kept = inbox
            .handle(msg("/monome/grid/key", vec![OscType::String("x".into())]))
            .await;

        assert!(kept);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_inbox_reports_reader_gone() {
        let (mut inbox, rx) = inbox(DeviceKind::Grid);
        drop(rx);

        let alive = inbox
            .handle(msg(
                "/monome/grid/key",
                vec![OscType::Int(1), OscType::Int(2), OscType::Int(1)],
            ))
            .await;

        assert!(!alive);
    }
}
