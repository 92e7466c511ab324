//! Grid demo policy.
//!
//! | Event            | Reaction                                    |
//! |------------------|---------------------------------------------|
//! | `Ready`          | all LEDs on, wait `flash`, all LEDs off      |
//! | `Key` state 1    | light that key                              |
//! | `Key` state 0    | nothing                                     |
//! | `Tilt`           | log it                                      |
//!
//! Anything else (encoder events cannot come from a grid) is ignored.

use std::sync::Arc;
use std::time::Duration;

use monome_core::DeviceEvent;
use tracing::{debug, info, warn};

use super::surface::{DemoError, EventSource, GridSurface};

/// Reacts to grid events by driving a [`GridSurface`].
pub struct GridDemo {
    surface: Arc<dyn GridSurface>,
    flash: Duration,
}

impl GridDemo {
    pub fn new(surface: Arc<dyn GridSurface>, flash: Duration) -> Self {
        Self { surface, flash }
    }

    /// Applies the policy to one event.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Surface`] if an LED command fails.
    pub async fn handle(&self, event: &DeviceEvent) -> Result<(), DemoError> {
        match event {
            DeviceEvent::Ready { id } => {
                info!(%id, "grid ready");
                self.surface.led_all(true).await.map_err(DemoError::Surface)?;
                tokio::time::sleep(self.flash).await;
                self.surface.led_all(false).await.map_err(DemoError::Surface)?;
            }
            DeviceEvent::Key { x, y, state: 1 } => {
                self.surface.led_set(*x, *y, 1).await.map_err(DemoError::Surface)?;
            }
            DeviceEvent::Tilt { .. } => info!(%event, "tilt"),
            other => debug!(%other, "ignored"),
        }
        Ok(())
    }

    /// Drains `source`, handling each event on its own task, until the
    /// stream ends.
    pub async fn run(self: Arc<Self>, source: Arc<dyn EventSource>) {
        while let Some(event) = source.next_event().await {
            let demo = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = demo.handle(&event).await {
                    warn!(%event, "grid demo: {e}");
                }
            });
        }
        debug!("grid event stream ended");
    }
}
