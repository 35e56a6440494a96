//! Container-height negotiation.
//!
//! Converts widget-reported content heights into applied container heights
//! under mode-dependent constraints, suppressing redundant updates so the
//! surface and the widget cannot oscillate against each other.

use oriel_contract::DisplayMode;

/// Buffer added to measured heights in auto-resize-eligible modes to avoid
/// sub-pixel scroll artifacts.
const AUTO_RESIZE_BUFFER_PX: f64 = 2.0;

/// Per-session height negotiation state.
#[derive(Debug, Default)]
pub struct HeightNegotiator {
    measured: Option<f64>,
    applied: Option<u32>,
}

impl HeightNegotiator {
    /// Process a raw content-height report.
    ///
    /// Returns the height to apply to the container, or `None` when the
    /// report is invalid (non-finite or non-positive) or the buffered value
    /// equals the last applied one.
    pub fn negotiate(&mut self, raw: f64, mode: DisplayMode, max: Option<u32>) -> Option<u32> {
        if !raw.is_finite() || raw <= 0.0 {
            return None;
        }
        self.measured = Some(raw);

        let mut buffered = raw.ceil();
        if mode.auto_resizes() {
            buffered += AUTO_RESIZE_BUFFER_PX;
        }
        let mut px = buffered as u32;
        if let Some(max) = max {
            px = px.min(max);
        }

        if self.applied == Some(px) {
            return None;
        }
        self.applied = Some(px);
        Some(px)
    }

    /// Re-derive an applied height from the last measurement, bypassing the
    /// dedupe check. Used when switching back to inline so transient sizing
    /// from pip/fullscreen is corrected without waiting for the widget to
    /// re-report.
    pub fn reapply(&mut self, mode: DisplayMode, max: Option<u32>) -> Option<u32> {
        let raw = self.measured?;
        self.applied = None;
        self.negotiate(raw, mode, max)
    }

    /// Last applied container height.
    pub fn applied(&self) -> Option<u32> {
        self.applied
    }

    /// Last raw measurement accepted from the widget.
    pub fn last_measured(&self) -> Option<f64> {
        self.measured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_reports() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(f64::NAN, DisplayMode::Inline, None), None);
        assert_eq!(h.negotiate(f64::INFINITY, DisplayMode::Inline, None), None);
        assert_eq!(h.negotiate(0.0, DisplayMode::Inline, None), None);
        assert_eq!(h.negotiate(-40.0, DisplayMode::Inline, None), None);
        assert_eq!(h.applied(), None);
        assert_eq!(h.last_measured(), None);
    }

    #[test]
    fn rounds_up_and_buffers_inline() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(240.3, DisplayMode::Inline, None), Some(243));
    }

    #[test]
    fn no_buffer_in_expanded_modes() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(240.3, DisplayMode::Pip, None), Some(241));
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(240.0, DisplayMode::Fullscreen, None), Some(240));
    }

    #[test]
    fn dedupes_equal_buffered_values() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(100.0, DisplayMode::Inline, None), Some(102));
        assert_eq!(h.negotiate(100.0, DisplayMode::Inline, None), None);
        assert_eq!(h.negotiate(99.2, DisplayMode::Inline, None), None);
        assert_eq!(h.negotiate(101.0, DisplayMode::Inline, None), Some(103));
    }

    #[test]
    fn clamps_to_max() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(900.0, DisplayMode::Inline, Some(480)), Some(480));
        // A taller report clamps to the same value and is deduped.
        assert_eq!(h.negotiate(1200.0, DisplayMode::Inline, Some(480)), None);
        assert_eq!(h.negotiate(120.0, DisplayMode::Inline, Some(480)), Some(122));
    }

    #[test]
    fn reapply_bypasses_dedupe() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.negotiate(300.0, DisplayMode::Inline, None), Some(302));
        // Same buffered value, but a mode round-trip must re-assert it.
        assert_eq!(h.reapply(DisplayMode::Inline, None), Some(302));
        assert_eq!(h.reapply(DisplayMode::Inline, Some(200)), Some(200));
    }

    #[test]
    fn reapply_without_measurement_is_noop() {
        let mut h = HeightNegotiator::default();
        assert_eq!(h.reapply(DisplayMode::Inline, None), None);
    }
}
