//! Two-phase readiness record.
//!
//! After the handshake a grid answers `/sys/info/id` and `/sys/info/size`
//! in whatever order it likes.  The session is ready once the id is known
//! and (for grids) a non-zero size has been reported.  The Ready event is
//! emitted exactly once, no matter how many reports arrive afterwards.
//!
//! ```text
//!   id ──┐
//!        ├──► is_ready() ──► Ready{id}   (first time only)
//! size ──┘
//! ```

use crate::protocol::messages::DeviceEvent;

/// Pending id/size reports plus the one-shot guard for the Ready event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    id: Option<String>,
    size: Option<(i32, i32)>,
    requires_size: bool,
    announced: bool,
}

impl Readiness {
    /// Grid rule: id and non-zero size.
    pub fn grid() -> Self {
        Self::with_size_gate(true)
    }

    /// Arc rule: id only.
    pub fn arc() -> Self {
        Self::with_size_gate(false)
    }

    fn with_size_gate(requires_size: bool) -> Self {
        Self {
            id: None,
            size: None,
            requires_size,
            announced: false,
        }
    }

    /// Stores the reported id and returns the Ready event if this report
    /// completes the readiness condition.
    pub fn record_id(&mut self, id: String) -> Option<DeviceEvent> {
        self.id = Some(id);
        self.poll()
    }

    /// Stores the reported size and returns the Ready event if this report
    /// completes the readiness condition.
    pub fn record_size(&mut self, width: i32, height: i32) -> Option<DeviceEvent> {
        self.size = Some((width, height));
        self.poll()
    }

    /// Returns `true` once every required report has arrived.
    pub fn is_ready(&self) -> bool {
        let size_ok = !self.requires_size || matches!(self.size, Some((w, h)) if w != 0 && h != 0);
        self.id.is_some() && size_ok
    }

    /// The reported device id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The reported `(width, height)`, if any.
    pub fn size(&self) -> Option<(i32, i32)> {
        self.size
    }

    fn poll(&mut self) -> Option<DeviceEvent> {
        if self.announced || !self.is_ready() {
            return None;
        }
        self.announced = true;
        self.id.clone().map(|id| DeviceEvent::Ready { id })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(id: &str) -> Option<DeviceEvent> {
        Some(DeviceEvent::Ready { id: id.to_string() })
    }

    #[test]
    fn test_grid_ready_when_size_then_id() {
        // Arrange
        let mut r = Readiness::grid();

        // Act
        let after_size = r.record_size(8, 8);
        let after_id = r.record_id("m0000001".into());

        // Assert
        assert_eq!(after_size, None);
        assert_eq!(after_id, ready("m0000001"));
    }

    #[test]
    fn test_grid_ready_when_id_then_size() {
        let mut r = Readiness::grid();
        assert_eq!(r.record_id("m0000001".into()), None);
        assert_eq!(r.record_size(16, 8), ready("m0000001"));
    }

    #[test]
    fn test_grid_not_ready_with_id_only() {
        let mut r = Readiness::grid();
        assert_eq!(r.record_id("m1".into()), None);
        assert!(!r.is_ready());
    }

    #[test]
    fn test_grid_zero_size_does_not_complete_readiness() {
        let mut r = Readiness::grid();
        r.record_id("m1".into());
        assert_eq!(r.record_size(0, 0), None);
        assert_eq!(r.record_size(8, 0), None);
        assert_eq!(r.record_size(8, 8), ready("m1"));
    }

    #[test]
    fn test_ready_fires_exactly_once() {
        // Arrange
        let mut r = Readiness::grid();
        let mut fired = Vec::new();

        // Act: repeated reports in both orders
        fired.extend(r.record_size(8, 8));
        fired.extend(r.record_id("m1".into()));
        fired.extend(r.record_id("m1".into()));
        fired.extend(r.record_size(16, 16));

        // Assert
        assert_eq!(fired.len(), 1);
        assert_eq!(r.size(), Some((16, 16)));
    }

    #[test]
    fn test_arc_ready_on_id_alone() {
        let mut r = Readiness::arc();
        assert_eq!(r.record_id("a1".into()), ready("a1"));
        assert_eq!(r.record_id("a1".into()), None);
        assert_eq!(r.id(), Some("a1"));
    }
}
