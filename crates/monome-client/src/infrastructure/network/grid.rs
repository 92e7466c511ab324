//! Grid session.
//!
//! Starts with a five-step handshake (host, port, prefix, id query, size
//! query).  The session becomes ready once the grid has reported its id and
//! a non-zero size, in either order, and publishes exactly one
//! [`DeviceEvent::Ready`] at that point.
//!
//! On close the grid is blanked with `led_all(false)` before the endpoint
//! shuts, so a demo that exits never leaves LEDs lit.

use std::net::SocketAddr;

use async_trait::async_trait;
use monome_core::{Command, DeviceEvent, DeviceKind, SessionState};

use super::device::DeviceLink;
use super::endpoint::SessionError;
use super::SessionConfig;
use crate::application::surface::{EventSource, GridSurface};

/// Connection to one grid.
#[derive(Debug)]
pub struct GridSession {
    link: DeviceLink,
}

impl GridSession {
    /// Binds a local endpoint and sends the handshake to the grid on
    /// `device_port`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Bind`] if no local port is available, or a
    /// send error if the handshake cannot be delivered.
    pub async fn start(device_port: u16, config: &SessionConfig) -> Result<Self, SessionError> {
        let link = DeviceLink::start(DeviceKind::Grid, device_port, config).await?;
        Ok(Self { link })
    }

    /// Waits for the next grid event.  Returns `None` once the session is
    /// closed.
    pub async fn read(&self) -> Option<DeviceEvent> {
        self.link.read().await
    }

    /// Turns every LED on or off.
    pub async fn led_all(&self, on: bool) -> Result<(), SessionError> {
        self.link.send(&Command::LedAll { on }).await
    }

    /// Sets the LED at `(x, y)`.
    pub async fn led_set(&self, x: i32, y: i32, state: i32) -> Result<(), SessionError> {
        self.link.send(&Command::LedSet { x, y, state }).await
    }

    /// The id reported by the grid, if it has answered yet.
    pub fn id(&self) -> Option<String> {
        self.link.id()
    }

    /// The `(width, height)` reported by the grid, if it has answered yet.
    pub fn size(&self) -> Option<(i32, i32)> {
        self.link.size()
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

    pub fn prefix(&self) -> &str {
        self.link.prefix()
    }

    /// Blanks the grid and closes the session.  Safe to call repeatedly and
    /// from another task while a `read()` is pending.
    pub async fn close(&self) {
        self.link.close(Some(&Command::LedAll { on: false })).await;
    }
}

#[async_trait]
impl GridSurface for GridSession {
    async fn led_all(&self, on: bool) -> Result<(), String> {
        GridSession::led_all(self, on).await.map_err(|e| e.to_string())
    }

    async fn led_set(&self, x: i32, y: i32, state: i32) -> Result<(), String> {
        GridSession::led_set(self, x, y, state)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl EventSource for GridSession {
    async fn next_event(&self) -> Option<DeviceEvent> {
        self.read().await
    }
}
