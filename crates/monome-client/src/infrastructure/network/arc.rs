//! Arc session.
//!
//! The handshake is the grid's minus the size query: an arc is ready as
//! soon as it reports its id.  Encoder presses and turns are published as
//! [`DeviceEvent::RingPress`] and [`DeviceEvent::RingDelta`].
//!
//! Closing sends nothing to the device.  The handshake never learns how many
//! encoders the arc has, so there is no safe set of rings to blank.

use std::net::SocketAddr;

use async_trait::async_trait;
use monome_core::{Command, DeviceEvent, DeviceKind, SessionState};

use super::device::DeviceLink;
use super::endpoint::SessionError;
use super::SessionConfig;
use crate::application::surface::{ArcSurface, EventSource};

/// Connection to one arc.
#[derive(Debug)]
pub struct ArcSession {
    link: DeviceLink,
}

impl ArcSession {
    /// Binds a local endpoint and sends the handshake to the arc on
    /// `device_port`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Bind`] if no local port is available, or a
    /// send error if the handshake cannot be delivered.
    pub async fn start(device_port: u16, config: &SessionConfig) -> Result<Self, SessionError> {
        let link = DeviceLink::start(DeviceKind::Arc, device_port, config).await?;
        Ok(Self { link })
    }

    pub async fn read(&self) -> Option<DeviceEvent> {
        self.link.read().await
    }

    /// Sets every LED on ring `encoder` to `level`.
    pub async fn ring_all(&self, encoder: i32, level: i32) -> Result<(), SessionError> {
        self.link.send(&Command::RingAll { encoder, level }).await
    }

    /// Sets LED `led` on ring `encoder` to `level`.
    pub async fn ring_set(&self, encoder: i32, led: i32, level: i32) -> Result<(), SessionError> {
        self.link
            .send(&Command::RingSet {
                encoder,
                led,
                level,
            })
            .await
    }

    pub fn id(&self) -> Option<String> {
        self.link.id()
    }

    pub fn state(&self) -> SessionState {
        self.link.state()
    }

    pub fn local_port(&self) -> u16 {
        self.link.local_port()
    }

    pub fn device_addr(&self) -> SocketAddr {
        self.link.device_addr()
    }

    pub async fn close(&self) {
        self.link.close(None).await;
    }
}

#[async_trait]
impl ArcSurface for ArcSession {
    async fn ring_all(&self, encoder: i32, level: i32) -> Result<(), String> {
        ArcSession::ring_all(self, encoder, level)
            .await
            .map_err(|e| e.to_string())
    }

    async fn ring_set(&self, encoder: i32, led: i32, level: i32) -> Result<(), String> {
        ArcSession::ring_set(self, encoder, led, level)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl EventSource for ArcSession {
    async fn next_event(&self) -> Option<DeviceEvent> {
        self.read().await
    }
}
