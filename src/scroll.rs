//! Scroll progress formulas and per-frame coalescing of scroll work.

use serde::Deserialize;

/// Viewport-relative vertical extent of a tracked region, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRect {
    pub top: f32,
    pub bottom: f32,
}

impl RegionRect {
    pub fn new(top: f32, height: f32) -> Self {
        Self {
            top,
            bottom: top + height,
        }
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn intersects_viewport(&self, viewport_height: f32) -> bool {
        self.top < viewport_height && self.bottom > 0.0
    }
}

/// Which progress formula a region is tracked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressFormula {
    /// Progress over the whole pass of the section through the viewport.
    #[default]
    Section,
    /// Progress through a tall spacer behind a fixed overlay.
    Spacer,
}

/// Progress of a section passing through the viewport: 0 while it is fully
/// below, 1 once it is fully above.
pub fn section_progress(rect: RegionRect, viewport_height: f32) -> f32 {
    if rect.top > viewport_height {
        return 0.0;
    }
    if rect.bottom < 0.0 {
        return 1.0;
    }
    let span = viewport_height + rect.height();
    if span <= 0.0 {
        return 0.0;
    }
    ((viewport_height - rect.top) / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacerReading {
    pub progress: f32,
    pub overlay_visible: bool,
}

/// Progress through a spacer region. `held` is returned once the spacer has
/// scrolled completely past the top of the viewport.
pub fn spacer_progress(rect: RegionRect, viewport_height: f32, held: f32) -> SpacerReading {
    if rect.top > 0.0 {
        return SpacerReading {
            progress: 0.0,
            overlay_visible: false,
        };
    }
    if rect.bottom <= 0.0 {
        return SpacerReading {
            progress: held,
            overlay_visible: false,
        };
    }
    let scrolled_past = -rect.top;
    let scrollable = rect.height() - viewport_height;
    let progress = if scrollable <= 0.0 {
        1.0
    } else {
        (scrolled_past / scrollable).clamp(0.0, 1.0)
    };
    SpacerReading {
        progress,
        overlay_visible: true,
    }
}

/// Whether a reference element has scrolled far enough up to reveal an overlay.
pub fn overlay_revealed(reference_bottom: f32, threshold_px: f32) -> bool {
    reference_bottom < threshold_px
}

/// At most one scheduled computation per rendered frame.
///
/// Requesting while a computation is already scheduled replaces it, so a
/// burst of scroll events collapses into a single run on the next frame.
#[derive(Debug, Default)]
pub struct FrameGate {
    scheduled: Option<u64>,
    next_ticket: u64,
    detached: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a computation for the next frame, cancelling any pending one.
    /// Returns `None` once the gate has been detached.
    pub fn request(&mut self) -> Option<u64> {
        if self.detached {
            return None;
        }
        self.next_ticket += 1;
        self.scheduled = Some(self.next_ticket);
        self.scheduled
    }

    /// Consume the pending computation, if any.
    pub fn take(&mut self) -> Option<u64> {
        self.scheduled.take()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Drop any pending work and ignore all further requests.
    pub fn detach(&mut self) {
        self.detached = true;
        self.scheduled = None;
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}
