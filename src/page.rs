//! Geometry of the scrolling page.
//!
//! The page is a vertical stack of bands measured in viewport heights. Only
//! the hero band, the animation section and the footer spacer matter to the
//! animation engine; the static sections in between are a single interlude
//! band and the footer content closes the document.

use serde::Deserialize;

use crate::region::RegionKind;
use crate::scroll::RegionRect;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PageLayout {
    /// Height of the hero band, in viewport heights.
    pub hero_vh: f32,
    /// Height of the main animation section, in viewport heights.
    pub animation_vh: f32,
    /// Combined height of the static sections between the two animations.
    pub interlude_vh: f32,
    /// Height of the spacer that drives the footer animation.
    pub footer_spacer_vh: f32,
    /// Height of the footer content below the spacer.
    pub footer_vh: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            hero_vh: 1.0,
            animation_vh: 4.0,
            interlude_vh: 3.0,
            footer_spacer_vh: 3.0,
            footer_vh: 0.6,
        }
    }
}

impl PageLayout {
    pub fn document_height(&self, viewport_height: f32) -> f32 {
        (self.hero_vh + self.animation_vh + self.interlude_vh + self.footer_spacer_vh + self.footer_vh)
            * viewport_height
    }

    pub fn max_scroll(&self, viewport_height: f32) -> f32 {
        (self.document_height(viewport_height) - viewport_height).max(0.0)
    }

    /// Viewport-relative rectangles for a scroll offset.
    pub fn geometry(&self, scroll_offset: f32, viewport_height: f32) -> PageGeometry {
        let vh = viewport_height;
        let hero_top = 0.0;
        let animation_top = hero_top + self.hero_vh * vh;
        let spacer_top = animation_top + (self.animation_vh + self.interlude_vh) * vh;
        PageGeometry {
            viewport_height: vh,
            hero: RegionRect::new(hero_top - scroll_offset, self.hero_vh * vh),
            animation: RegionRect::new(animation_top - scroll_offset, self.animation_vh * vh),
            footer_spacer: RegionRect::new(spacer_top - scroll_offset, self.footer_spacer_vh * vh),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub viewport_height: f32,
    pub hero: RegionRect,
    pub animation: RegionRect,
    pub footer_spacer: RegionRect,
}

impl PageGeometry {
    /// The rectangle whose position drives the given region's progress.
    pub fn rect(&self, kind: RegionKind) -> RegionRect {
        match kind {
            RegionKind::Main => self.animation,
            RegionKind::Footer => self.footer_spacer,
        }
    }
}

/// Scroll position of the page, clamped to the scrollable range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageScroll {
    offset: f32,
}

impl PageScroll {
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Move by `delta` pixels (positive scrolls down). Returns whether the
    /// offset changed.
    pub fn scroll_by(&mut self, delta: f32, max_scroll: f32) -> bool {
        self.scroll_to(self.offset + delta, max_scroll)
    }

    pub fn scroll_to(&mut self, offset: f32, max_scroll: f32) -> bool {
        let target = if offset.is_finite() {
            offset.clamp(0.0, max_scroll.max(0.0))
        } else {
            self.offset
        };
        let changed = (target - self.offset).abs() > f32::EPSILON;
        self.offset = target;
        changed
    }
}
