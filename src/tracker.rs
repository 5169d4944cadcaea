//! Maps page scroll position onto region progress, once per rendered frame.

use tracing::trace;

use crate::page::PageGeometry;
use crate::region::AnimatedRegion;
use crate::scroll::{FrameGate, overlay_revealed};

/// Result of one tracker computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerUpdate {
    /// Whether the caption overlay should be mounted.
    pub caption_visible: bool,
    /// The caption flag differs from the previous computation.
    pub caption_toggled: bool,
    /// Number of regions that published a new progress value.
    pub published: usize,
}

#[derive(Debug)]
pub struct ScrollTracker {
    gate: FrameGate,
    reveal_threshold_px: f32,
    caption_visible: bool,
}

impl ScrollTracker {
    pub fn new(reveal_threshold_px: f32) -> Self {
        Self {
            gate: FrameGate::new(),
            reveal_threshold_px,
            caption_visible: false,
        }
    }

    pub fn on_scroll(&mut self) {
        self.gate.request();
    }

    pub fn on_resize(&mut self) {
        self.gate.request();
    }

    pub fn is_scheduled(&self) -> bool {
        self.gate.is_scheduled()
    }

    pub fn caption_visible(&self) -> bool {
        self.caption_visible
    }

    /// Run the scheduled computation, if any. Called once per frame.
    pub fn flush(
        &mut self,
        geometry: &PageGeometry,
        regions: &mut [AnimatedRegion],
    ) -> Option<TrackerUpdate> {
        let ticket = self.gate.take()?;
        trace!(ticket, "running scheduled scroll computation");
        Some(self.compute(geometry, regions))
    }

    /// Compute immediately, bypassing the gate. Used for the initial state.
    pub fn compute(
        &mut self,
        geometry: &PageGeometry,
        regions: &mut [AnimatedRegion],
    ) -> TrackerUpdate {
        let vh = geometry.viewport_height;
        let mut published = 0;
        for region in regions.iter_mut() {
            if region.track(geometry.rect(region.kind()), vh) {
                published += 1;
            }
        }
        let caption_visible = overlay_revealed(geometry.hero.bottom, self.reveal_threshold_px);
        let caption_toggled = caption_visible != self.caption_visible;
        self.caption_visible = caption_visible;
        TrackerUpdate {
            caption_visible,
            caption_toggled,
            published,
        }
    }

    /// Stop reacting to input and drop any scheduled computation.
    pub fn detach(&mut self) {
        self.gate.detach();
    }

    pub fn is_detached(&self) -> bool {
        self.gate.is_detached()
    }
}
