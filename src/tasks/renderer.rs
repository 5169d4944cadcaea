//! Per-region draw loop.
//!
//! The viewer calls [`RegionRenderer::tick`] once per displayed frame. A tick
//! re-reads the shared progress value, maps it to a frame index and repaints
//! the canvas only when that index differs from the one last painted.

use std::time::{Duration, Instant};

use image::Rgba;
use tracing::debug;

use crate::easing::frame_index;
use crate::frames::{FrameSet, FrameStatus};
use crate::processing::canvas::Canvas;
use crate::processing::layout::FitMode;
use crate::progress::ProgressReader;

#[derive(Debug, Clone, Copy)]
pub struct RendererOptions {
    pub frame_count: usize,
    pub fit: FitMode,
    pub background: Rgba<u8>,
    pub resize_debounce: Duration,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The renderer has been torn down.
    Stopped,
    /// Frames have not finished preloading.
    NotReady,
    /// Same frame as last time; nothing was painted.
    Unchanged { frame: usize },
    /// The frame image was painted over the background.
    Drawn { frame: usize },
    /// Only the background was painted (frame unavailable or draw failed).
    Background { frame: usize },
}

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    width: u32,
    height: u32,
    due: Instant,
}

pub struct RegionRenderer {
    opts: RendererOptions,
    progress: ProgressReader,
    frames: Option<FrameSet>,
    canvas: Canvas,
    last_rendered: Option<usize>,
    pending_resize: Option<PendingResize>,
    generation: u64,
    running: bool,
}

impl RegionRenderer {
    pub fn new(opts: RendererOptions, progress: ProgressReader, width: u32, height: u32) -> Self {
        Self {
            opts,
            progress,
            frames: None,
            canvas: Canvas::new(width, height),
            last_rendered: None,
            pending_resize: None,
            generation: 0,
            running: true,
        }
    }

    /// Hand over the preloaded frames; the next tick paints.
    pub fn attach_frames(&mut self, frames: FrameSet) {
        self.frames = Some(frames);
        self.invalidate();
    }

    pub fn is_ready(&self) -> bool {
        self.frames.is_some()
    }

    /// Record a viewport size change. The canvas is resized once no further
    /// resize has arrived for the debounce period.
    pub fn on_resize(&mut self, width: u32, height: u32, now: Instant) {
        if !self.running {
            return;
        }
        self.pending_resize = Some(PendingResize {
            width,
            height,
            due: now + self.opts.resize_debounce,
        });
    }

    /// Resize the canvas right away, dropping any debounced resize.
    pub fn resize_now(&mut self, width: u32, height: u32) {
        self.pending_resize = None;
        self.canvas.resize(width, height);
        self.generation += 1;
        self.invalidate();
    }

    /// Force the next tick to repaint.
    pub fn invalidate(&mut self) {
        self.last_rendered = None;
    }

    pub fn tick(&mut self, now: Instant) -> DrawOutcome {
        if !self.running {
            return DrawOutcome::Stopped;
        }
        self.apply_due_resize(now);

        let Some(frames) = self.frames.as_ref() else {
            return DrawOutcome::NotReady;
        };

        let frame = frame_index(self.progress.get(), self.opts.frame_count);
        if self.last_rendered == Some(frame) {
            return DrawOutcome::Unchanged { frame };
        }

        self.canvas.fill(self.opts.background);
        self.generation += 1;

        // A pending slot may still arrive after a preload timeout; keep
        // retrying it instead of caching the blank result.
        let settled = !matches!(frames.status(frame), Some(FrameStatus::Pending));
        self.last_rendered = settled.then_some(frame);

        let Some(image) = frames.drawable(frame) else {
            return DrawOutcome::Background { frame };
        };
        match self.canvas.draw_fitted(&image, self.opts.fit) {
            Ok(()) => DrawOutcome::Drawn { frame },
            Err(err) => {
                if cfg!(debug_assertions) {
                    debug!(frame, error = %err, "canvas draw failed");
                }
                DrawOutcome::Background { frame }
            }
        }
    }

    /// Cancel pending work and release the frames. Further ticks are no-ops.
    pub fn stop(&mut self) {
        self.running = false;
        self.pending_resize = None;
        self.frames = None;
        self.last_rendered = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Incremented every time the canvas contents change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_rendered(&self) -> Option<usize> {
        self.last_rendered
    }

    pub fn has_pending_resize(&self) -> bool {
        self.pending_resize.is_some()
    }

    fn apply_due_resize(&mut self, now: Instant) {
        let Some(pending) = self.pending_resize else {
            return;
        };
        if now < pending.due {
            return;
        }
        self.pending_resize = None;
        self.canvas.resize(pending.width, pending.height);
        self.generation += 1;
        self.invalidate();
        debug!(
            width = pending.width,
            height = pending.height,
            "canvas resized"
        );
    }
}
