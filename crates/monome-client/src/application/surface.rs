//! Traits the demo policies drive.
//!
//! Infrastructure sessions implement these; tests implement them with
//! recording doubles.  Errors cross the seam as plain strings so this layer
//! never names an infrastructure type.

use async_trait::async_trait;
use monome_core::DeviceEvent;
use thiserror::Error;

/// Error type for the demo use cases.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("surface error: {0}")]
    Surface(String),
}

/// LED output of a grid.
#[async_trait]
pub trait GridSurface: Send + Sync {
    /// Turns every LED on or off.
    async fn led_all(&self, on: bool) -> Result<(), String>;

    /// Sets one LED.
    async fn led_set(&self, x: i32, y: i32, state: i32) -> Result<(), String>;
}

/// Ring output of an arc.
#[async_trait]
pub trait ArcSurface: Send + Sync {
    /// Sets every LED of one ring to `level`.
    async fn ring_all(&self, encoder: i32, level: i32) -> Result<(), String>;

    /// Sets one LED of one ring.
    async fn ring_set(&self, encoder: i32, led: i32, level: i32) -> Result<(), String>;
}

/// A stream of device events.  `None` means the stream has ended.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn next_event(&self) -> Option<DeviceEvent>;
}
