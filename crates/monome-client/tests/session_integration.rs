//! Integration tests for the session layer over real loopback UDP.
//!
//! Each test plays the other side of the conversation with a plain
//! `UdpSocket`: a fake serialosc daemon for discovery, a fake grid or arc
//! for the device sessions.  Every wait is bounded by a timeout so a broken
//! session fails the test instead of hanging it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use monome_client::infrastructure::network::{ArcSession, GridSession, SerialOscSession, SessionConfig};
use monome_core::protocol::address::LOOPBACK;
use monome_core::{decode_datagram, ControlEventKind, DeviceEvent, DeviceKind, SessionState};
use rosc::{OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A socket standing in for serialosc or a device.
struct Peer {
    socket: UdpSocket,
}

impl Peer {
    async fn bind() -> Self {
        Self {
            socket: UdpSocket::bind((LOOPBACK, 0)).await.unwrap(),
        }
    }

    fn port(&self) -> u16 {
        self.socket.local_addr().unwrap().port()
    }

    async fn recv(&self) -> OscMessage {
        let mut buf = [0u8; 1536];
        let (len, _) = timeout(WAIT, self.socket.recv_from(&mut buf))
            .await
            .expect("peer timed out waiting for a datagram")
            .unwrap();
        decode_datagram(&buf[..len]).unwrap().remove(0)
    }

    /// Returns `None` if nothing arrives within a short quiet period.
    async fn try_recv(&self) -> Option<OscMessage> {
        let mut buf = [0u8; 1536];
        let (len, _) = timeout(Duration::from_millis(150), self.socket.recv_from(&mut buf))
            .await
            .ok()?
            .ok()?;
        decode_datagram(&buf[..len]).ok()?.into_iter().next()
    }

    async fn send(&self, port: u16, addr: &str, args: Vec<OscType>) {
        let bytes = rosc::encoder::encode(&OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        }))
        .unwrap();
        self.socket
            .send_to(&bytes, SocketAddr::new(LOOPBACK, port))
            .await
            .unwrap();
    }

    async fn drain_handshake(&self, steps: usize) {
        for _ in 0..steps {
            self.recv().await;
        }
    }
}

fn config_for(serialosc: &Peer) -> SessionConfig {
    SessionConfig {
        discovery_port: serialosc.port(),
        ..Default::default()
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_reply_is_published_as_list_event() {
    // Arrange
    let serialosc = Peer::bind().await;
    let session = SerialOscSession::start(&config_for(&serialosc)).await.unwrap();
    let list = serialosc.recv().await;
    assert_eq!(list.addr, "/serialosc/list");

    // Act
    serialosc
        .send(
            session.local_port(),
            "/serialosc/device",
            vec![
                OscType::String("m0000001".into()),
                OscType::String("monome 128".into()),
                OscType::Int(13001),
            ],
        )
        .await;
    let event = timeout(WAIT, session.read()).await.unwrap().unwrap();

    // Assert
    assert_eq!(event.kind, ControlEventKind::List);
    assert_eq!(event.id, "m0000001");
    assert_eq!(event.port, 13001);
    assert_eq!(event.device_kind(), DeviceKind::Grid);
    assert!(serialosc.try_recv().await.is_none(), "a list reply does not renew the subscription");
}

#[tokio::test]
async fn test_add_renews_subscription_before_event_is_visible() {
    // Arrange
    let serialosc = Peer::bind().await;
    let session = SerialOscSession::start(&config_for(&serialosc)).await.unwrap();
    serialosc.recv().await; // list

    // Act
    serialosc
        .send(
            session.local_port(),
            "/serialosc/add",
            vec![
                OscType::String("m2".into()),
                OscType::String("monome arc 4".into()),
                OscType::Int(13002),
            ],
        )
        .await;
    let event = timeout(WAIT, session.read()).await.unwrap().unwrap();

    // Assert: the notify was already on the wire when the event was read.
    let notify = serialosc.recv().await;
    assert_eq!(notify.addr, "/serialosc/notify");
    assert_eq!(
        notify.args,
        vec![
            OscType::String("127.0.0.1".into()),
            OscType::Int(i32::from(session.local_port())),
        ]
    );
    assert!(serialosc.try_recv().await.is_none(), "exactly one notify");
    assert_eq!(event.kind, ControlEventKind::Add);
    assert_eq!(event.device_kind(), DeviceKind::Arc);
}

#[tokio::test]
async fn test_remove_renews_subscription_before_event_is_visible() {
    // Arrange
    let serialosc = Peer::bind().await;
    let session = SerialOscSession::start(&config_for(&serialosc)).await.unwrap();
    serialosc.recv().await; // list

    // Act
    serialosc
        .send(
            session.local_port(),
            "/serialosc/remove",
            vec![
                OscType::String("m0000001".into()),
                OscType::String("monome 128".into()),
                OscType::Int(13001),
            ],
        )
        .await;
    let event = timeout(WAIT, session.read()).await.unwrap().unwrap();

    // Assert
    let notify = serialosc.recv().await;
    assert_eq!(notify.addr, "/serialosc/notify");
    assert_eq!(
        notify.args,
        vec![
            OscType::String("127.0.0.1".into()),
            OscType::Int(i32::from(session.local_port())),
        ]
    );
    assert!(serialosc.try_recv().await.is_none(), "exactly one notify");
    assert_eq!(event.kind, ControlEventKind::Remove);
    assert_eq!(event.id, "m0000001");
}

#[tokio::test]
async fn test_malformed_discovery_message_is_skipped() {
    let serialosc = Peer::bind().await;
    let session = SerialOscSession::start(&config_for(&serialosc)).await.unwrap();
    serialosc.recv().await;

    serialosc
        .send(session.local_port(), "/serialosc/device", vec![OscType::Int(1)])
        .await;
    serialosc
        .send(
            session.local_port(),
            "/serialosc/remove",
            vec![
                OscType::String("m3".into()),
                OscType::String("monome 64".into()),
                OscType::Int(13003),
            ],
        )
        .await;

    let event = timeout(WAIT, session.read()).await.unwrap().unwrap();
    assert_eq!(event.kind, ControlEventKind::Remove);
    assert_eq!(event.id, "m3");
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_grid_handshake_points_device_at_session() {
    // Arrange
    let device = Peer::bind().await;
    let config = SessionConfig {
        prefix: "/box".to_string(),
        ..Default::default()
    };

    // Act
    let session = GridSession::start(device.port(), &config).await.unwrap();

    // Assert
    let host = device.recv().await;
    let port = device.recv().await;
    let prefix = device.recv().await;
    let id = device.recv().await;
    let size = device.recv().await;
    assert_eq!((host.addr.as_str(), host.args), ("/sys/host", vec![OscType::String("127.0.0.1".into())]));
    assert_eq!(port.args, vec![OscType::Int(i32::from(session.local_port()))]);
    assert_eq!(prefix.args, vec![OscType::String("box".into())]);
    assert_eq!(id.addr, "/sys/info/id");
    assert_eq!(size.addr, "/sys/info/size");
}

#[tokio::test]
async fn test_grid_ready_once_after_id_and_size() {
    // Arrange
    let device = Peer::bind().await;
    let session = GridSession::start(device.port(), &SessionConfig::default()).await.unwrap();
    device.drain_handshake(5).await;
    let port = session.local_port();

    // Act
    device.send(port, "/sys/id", vec![OscType::String("m0000001".into())]).await;
    device.send(port, "/sys/size", vec![OscType::Int(8), OscType::Int(8)]).await;
    device.send(port, "/sys/size", vec![OscType::Int(8), OscType::Int(8)]).await;
    device
        .send(port, "/monome/grid/key", vec![OscType::Int(3), OscType::Int(5), OscType::Int(1)])
        .await;

    // Assert
    let first = timeout(WAIT, session.read()).await.unwrap();
    let second = timeout(WAIT, session.read()).await.unwrap();
    assert_eq!(first, Some(DeviceEvent::Ready { id: "m0000001".into() }));
    assert_eq!(second, Some(DeviceEvent::Key { x: 3, y: 5, state: 1 }));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.id().as_deref(), Some("m0000001"));
    assert_eq!(session.size(), Some((8, 8)));
}

#[tokio::test]
async fn test_grid_key_events_arrive_in_order() {
    let device = Peer::bind().await;
    let session = GridSession::start(device.port(), &SessionConfig::default()).await.unwrap();
    device.drain_handshake(5).await;

    for x in 0..10 {
        device
            .send(
                session.local_port(),
                "/monome/grid/key",
                vec![OscType::Int(x), OscType::Int(0), OscType::Int(1)],
            )
            .await;
    }

    for x in 0..10 {
        let event = timeout(WAIT, session.read()).await.unwrap();
        assert_eq!(event, Some(DeviceEvent::Key { x, y: 0, state: 1 }));
    }
}

#[tokio::test]
async fn test_grid_led_set_sends_arrive_in_order() {
    // Arrange
    let device = Peer::bind().await;
    let session = GridSession::start(device.port(), &SessionConfig::default()).await.unwrap();
    device.drain_handshake(5).await;

    // Act
    session.led_set(1, 2, 1).await.unwrap();
    session.led_set(3, 4, 0).await.unwrap();

    // Assert
    let a = device.recv().await;
    let b = device.recv().await;
    assert_eq!(a.addr, "/monome/grid/led/set");
    assert_eq!(a.args, vec![OscType::Int(1), OscType::Int(2), OscType::Int(1)]);
    assert_eq!(b.args, vec![OscType::Int(3), OscType::Int(4), OscType::Int(0)]);
}

#[tokio::test]
async fn test_close_unblocks_pending_grid_read() {
    // Arrange
    let device = Peer::bind().await;
    let session = Arc::new(GridSession::start(device.port(), &SessionConfig::default()).await.unwrap());
    let reader = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.read().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Act
    session.close().await;

    // Assert
    let result = timeout(WAIT, reader).await.expect("read must return after close");
    assert_eq!(result.unwrap(), None);
    assert_eq!(session.state(), SessionState::Closed);
}

// ── Discovery to grid ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovered_grid_becomes_ready_once() {
    // Arrange: serialosc lists one grid whose port is a fake device.
    let serialosc = Peer::bind().await;
    let device = Peer::bind().await;
    let config = config_for(&serialosc);
    let discovery = SerialOscSession::start(&config).await.unwrap();
    serialosc.recv().await; // list
    serialosc
        .send(
            discovery.local_port(),
            "/serialosc/device",
            vec![
                OscType::String("m0000001".into()),
                OscType::String("monome zero".into()),
                OscType::Int(i32::from(device.port())),
            ],
        )
        .await;
    let listed = timeout(WAIT, discovery.read()).await.unwrap().unwrap();
    assert_eq!(listed.device_kind(), DeviceKind::Grid);

    // Act
    let grid = GridSession::start(listed.port, &config).await.unwrap();
    device.drain_handshake(5).await;
    device
        .send(grid.local_port(), "/sys/id", vec![OscType::String("m0000001".into())])
        .await;
    device
        .send(grid.local_port(), "/sys/size", vec![OscType::Int(8), OscType::Int(8)])
        .await;

    // Assert
    let ready = timeout(WAIT, grid.read()).await.unwrap();
    assert_eq!(ready, Some(DeviceEvent::Ready { id: "m0000001".into() }));
    let next = timeout(Duration::from_millis(150), grid.read()).await;
    assert!(next.is_err(), "nothing follows the single Ready");
    assert_eq!(grid.device_addr(), SocketAddr::new(LOOPBACK, device.port()));
    assert_eq!(grid.state(), SessionState::Ready);

    grid.close().await;
    discovery.close().await;
}

// ── Arc ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_arc_ready_on_id_then_press_and_delta() {
    // Arrange
    let device = Peer::bind().await;
    let session = ArcSession::start(device.port(), &SessionConfig::default()).await.unwrap();
    device.drain_handshake(4).await;
    assert!(device.try_recv().await.is_none(), "arc never asks for size");
    let port = session.local_port();

    // Act
    device.send(port, "/sys/id", vec![OscType::String("a0000001".into())]).await;
    device.send(port, "/monome/enc/key", vec![OscType::Int(1), OscType::Int(1)]).await;
    device.send(port, "/monome/enc/key", vec![OscType::Int(1), OscType::Int(0)]).await;
    device.send(port, "/monome/enc/delta", vec![OscType::Int(2), OscType::Int(-4)]).await;

    // Assert
    let mut events = Vec::new();
    for _ in 0..4 {
        events.push(timeout(WAIT, session.read()).await.unwrap().unwrap());
    }
    assert_eq!(
        events,
        vec![
            DeviceEvent::Ready { id: "a0000001".into() },
            DeviceEvent::RingPress { encoder: 1, state: 1 },
            DeviceEvent::RingPress { encoder: 1, state: 0 },
            DeviceEvent::RingDelta { encoder: 2, delta: -4 },
        ]
    );
}

#[tokio::test]
async fn test_arc_ring_commands_use_prefix() {
    let device = Peer::bind().await;
    let config = SessionConfig {
        prefix: "knobs".to_string(),
        ..Default::default()
    };
    let session = ArcSession::start(device.port(), &config).await.unwrap();
    device.drain_handshake(4).await;

    session.ring_all(1, 15).await.unwrap();
    session.ring_set(0, 63, 7).await.unwrap();

    let all = device.recv().await;
    let set = device.recv().await;
    assert_eq!(all.addr, "/knobs/ring/all");
    assert_eq!(all.args, vec![OscType::Int(1), OscType::Int(15)]);
    assert_eq!(set.addr, "/knobs/ring/set");
    assert_eq!(set.args, vec![OscType::Int(0), OscType::Int(63), OscType::Int(7)]);
}
