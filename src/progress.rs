use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Changes at or below this magnitude are not published.
pub const PUBLISH_EPSILON: f32 = 0.001;

/// Create a progress holder: one writer for the scroll tracker, any number of
/// readers for the renderer and caption overlay.
pub fn progress_channel(initial: f32) -> (ProgressWriter, ProgressReader) {
    let initial = sanitize(initial);
    let cell = Arc::new(AtomicU32::new(initial.to_bits()));
    (
        ProgressWriter {
            cell: Arc::clone(&cell),
            last_published: initial,
        },
        ProgressReader { cell },
    )
}

/// Sole writer of a region's scroll progress; not `Clone`.
#[derive(Debug)]
pub struct ProgressWriter {
    cell: Arc<AtomicU32>,
    last_published: f32,
}

impl ProgressWriter {
    /// Publish a new value unless it is within [`PUBLISH_EPSILON`] of the last
    /// published one. Returns whether readers will observe the new value.
    pub fn publish(&mut self, value: f32) -> bool {
        let value = sanitize(value);
        if (value - self.last_published).abs() <= PUBLISH_EPSILON {
            return false;
        }
        self.cell.store(value.to_bits(), Ordering::Release);
        self.last_published = value;
        true
    }

    pub fn last_published(&self) -> f32 {
        self.last_published
    }

    pub fn reader(&self) -> ProgressReader {
        ProgressReader {
            cell: Arc::clone(&self.cell),
        }
    }
}

/// Read handle that always observes the most recently published value.
#[derive(Debug, Clone)]
pub struct ProgressReader {
    cell: Arc<AtomicU32>,
}

impl ProgressReader {
    pub fn get(&self) -> f32 {
        f32::from_bits(self.cell.load(Ordering::Acquire))
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
