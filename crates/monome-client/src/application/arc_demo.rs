//! Arc demo policy.
//!
//! On `Ready`, rings 0 and 1 flash full brightness.  While an encoder is
//! held its ring is lit at 15; on release it goes dark.  The press state is
//! taken from the event as is, so any state other than 1 counts as release.

use std::sync::Arc;
use std::time::Duration;

use monome_core::DeviceEvent;
use tracing::{debug, info, warn};

use super::surface::{ArcSurface, DemoError, EventSource};

/// Brightest ring level.
pub const FULL: i32 = 15;

/// Rings lit by the ready flash.
const FLASH_RINGS: [i32; 2] = [0, 1];

/// Reacts to arc events by driving an [`ArcSurface`].
pub struct ArcDemo {
    surface: Arc<dyn ArcSurface>,
    flash: Duration,
}

impl ArcDemo {
    pub fn new(surface: Arc<dyn ArcSurface>, flash: Duration) -> Self {
        Self { surface, flash }
    }

    /// Applies the policy to one event.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Surface`] if a ring command fails.
    pub async fn handle(&self, event: &DeviceEvent) -> Result<(), DemoError> {
        match event {
            DeviceEvent::Ready { id } => {
                info!(%id, "arc ready");
                self.fill(FULL).await?;
                tokio::time::sleep(self.flash).await;
                self.fill(0).await?;
            }
            DeviceEvent::RingPress { encoder, state } => {
                let level = if *state == 1 { FULL } else { 0 };
                self.surface
                    .ring_all(*encoder, level)
                    .await
                    .map_err(DemoError::Surface)?;
            }
            other => debug!(%other, "ignored"),
        }
        Ok(())
    }

    async fn fill(&self, level: i32) -> Result<(), DemoError> {
        for encoder in FLASH_RINGS {
            self.surface
                .ring_all(encoder, level)
                .await
                .map_err(DemoError::Surface)?;
        }
        Ok(())
    }

    /// Drains `source`, handling each event on its own task.
    pub async fn run(self: Arc<Self>, source: Arc<dyn EventSource>) {
        while let Some(event) = source.next_event().await {
            let demo = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = demo.handle(&event).await {
                    warn!(%event, "arc demo: {e}");
                }
            });
        }
        debug!("arc event stream ended");
    }
}
