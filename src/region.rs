//! One scroll-driven image-sequence animation.
//!
//! The page has two of these: the main section and the footer. Both are the
//! same component, parameterised by [`RegionConfig`]; each owns its own
//! progress cell, frames and renderer.

use std::fmt;
use std::time::{Duration, Instant};

use image::Rgba;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::RegionConfig;
use crate::frames::FrameSet;
use crate::progress::{ProgressReader, ProgressWriter, progress_channel};
use crate::scroll::{ProgressFormula, RegionRect, section_progress, spacer_progress};
use crate::tasks::loader::PreloadReport;
use crate::tasks::renderer::{DrawOutcome, RegionRenderer, RendererOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    Main,
    Footer,
}

impl RegionKind {
    pub const ALL: [Self; 2] = [Self::Main, Self::Footer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct AnimatedRegion {
    kind: RegionKind,
    formula: ProgressFormula,
    writer: ProgressWriter,
    renderer: RegionRenderer,
    overlay_visible: bool,
}

impl AnimatedRegion {
    pub fn new(
        kind: RegionKind,
        cfg: &RegionConfig,
        background: Rgba<u8>,
        resize_debounce: Duration,
        size: (u32, u32),
    ) -> Self {
        let (writer, reader) = progress_channel(0.0);
        let opts = RendererOptions {
            frame_count: cfg.frame_count,
            fit: cfg.fit,
            background,
            resize_debounce,
        };
        Self {
            kind,
            formula: cfg.progress,
            writer,
            renderer: RegionRenderer::new(opts, reader, size.0, size.1),
            overlay_visible: false,
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn progress_reader(&self) -> ProgressReader {
        self.writer.reader()
    }

    pub fn progress(&self) -> f32 {
        self.writer.last_published()
    }

    /// Recompute progress from the region's current rectangle. Returns whether
    /// a new value was published.
    pub fn track(&mut self, rect: RegionRect, viewport_height: f32) -> bool {
        let progress = match self.formula {
            ProgressFormula::Section => {
                self.overlay_visible = rect.intersects_viewport(viewport_height);
                section_progress(rect, viewport_height)
            }
            ProgressFormula::Spacer => {
                let reading = spacer_progress(rect, viewport_height, self.writer.last_published());
                self.overlay_visible = reading.overlay_visible;
                reading.progress
            }
        };
        self.writer.publish(progress)
    }

    /// Whether the region's canvas is on screen after the last `track`.
    pub fn is_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn attach_frames(&mut self, frames: FrameSet, report: &PreloadReport) {
        info!(
            region = %self.kind,
            loaded = report.loaded,
            failed = report.failed,
            pending = report.pending,
            "frames ready"
        );
        self.renderer.attach_frames(frames);
    }

    pub fn is_ready(&self) -> bool {
        self.renderer.is_ready()
    }

    pub fn on_resize(&mut self, width: u32, height: u32, now: Instant) {
        self.renderer.on_resize(width, height, now);
    }

    /// Size the canvas to the viewport without waiting for the debounce.
    pub fn fit_viewport(&mut self, width: u32, height: u32) {
        self.renderer.resize_now(width, height);
    }

    pub fn tick(&mut self, now: Instant) -> DrawOutcome {
        self.renderer.tick(now)
    }

    pub fn renderer(&self) -> &RegionRenderer {
        &self.renderer
    }

    pub fn teardown(&mut self) {
        debug!(region = %self.kind, "tearing down region");
        self.renderer.stop();
        self.overlay_visible = false;
    }
}
