//! Preloaded image sequences.
//!
//! A [`FrameSet`] is allocated once per animated region with a fixed number of
//! slots. Slot `i` holds the asset numbered `i + 1`. Each slot is written at
//! most once, by the fetch task responsible for it, and can be read from any
//! thread at any time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use serde::Deserialize;

/// Placeholder expanded to the zero-padded, 1-based frame number.
pub const FRAME_PLACEHOLDER: &str = "{frame}";

/// Final state of a slot once its fetch settled.
#[derive(Debug, Clone)]
pub enum SlotState {
    Loaded(Arc<RgbaImage>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub loaded: usize,
    pub failed: usize,
    pub pending: usize,
}

impl FrameCounts {
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }
}

/// How a decode that succeeded with a zero width or height is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimensionPolicy {
    /// Treat the frame as a load failure.
    #[default]
    Strict,
    /// Keep the frame as loaded; it simply never passes the draw check.
    Lenient,
}

#[derive(Clone)]
pub struct FrameSet {
    slots: Arc<[OnceLock<SlotState>]>,
}

impl FrameSet {
    /// Allocate `len` pending slots.
    pub fn new(len: usize) -> Self {
        let slots: Vec<OnceLock<SlotState>> = (0..len).map(|_| OnceLock::new()).collect();
        Self {
            slots: Arc::from(slots),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record the outcome for a slot. Returns `false` if the slot was already
    /// settled or the index is out of range.
    pub fn settle(&self, index: usize, state: SlotState) -> bool {
        match self.slots.get(index) {
            Some(slot) => slot.set(state).is_ok(),
            None => false,
        }
    }

    pub fn status(&self, index: usize) -> Option<FrameStatus> {
        let slot = self.slots.get(index)?;
        Some(match slot.get() {
            None => FrameStatus::Pending,
            Some(SlotState::Loaded(_)) => FrameStatus::Loaded,
            Some(SlotState::Failed) => FrameStatus::Failed,
        })
    }

    /// The image for a slot, if it loaded and is ready to be drawn.
    pub fn drawable(&self, index: usize) -> Option<Arc<RgbaImage>> {
        match self.slots.get(index)?.get()? {
            SlotState::Loaded(image) if image.width() > 0 && image.height() > 0 => {
                Some(Arc::clone(image))
            }
            _ => None,
        }
    }

    pub fn counts(&self) -> FrameCounts {
        self.slots
            .iter()
            .fold(FrameCounts::default(), |mut counts, slot| {
                match slot.get() {
                    None => counts.pending += 1,
                    Some(SlotState::Loaded(_)) => counts.loaded += 1,
                    Some(SlotState::Failed) => counts.failed += 1,
                }
                counts
            })
    }
}

impl fmt::Debug for FrameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.counts();
        f.debug_struct("FrameSet")
            .field("len", &self.len())
            .field("loaded", &counts.loaded)
            .field("failed", &counts.failed)
            .field("pending", &counts.pending)
            .finish()
    }
}

/// Where a region's frames live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    root: PathBuf,
    template: String,
}

impl FrameSource {
    pub fn new(root: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            template: template.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Asset name for the 0-based slot `index`, e.g. `/frames/ezgif-frame-001.jpg`.
    pub fn asset_name(&self, index: usize) -> String {
        self.template
            .replace(FRAME_PLACEHOLDER, &format!("{:03}", index + 1))
    }

    /// Filesystem path for the 0-based slot `index`, resolved under the root.
    pub fn path_for(&self, index: usize) -> PathBuf {
        let name = self.asset_name(index);
        self.root.join(name.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_index_maps_to_one_based_asset_number() {
        let source = FrameSource::new("public", "/frames/ezgif-frame-{frame}.jpg");
        assert_eq!(source.asset_name(0), "/frames/ezgif-frame-001.jpg");
        assert_eq!(source.asset_name(191), "/frames/ezgif-frame-192.jpg");
        assert_eq!(
            source.path_for(9),
            PathBuf::from("public/frames/ezgif-frame-010.jpg")
        );
    }

    #[test]
    fn slots_settle_once() {
        let set = FrameSet::new(3);
        assert_eq!(set.status(0), Some(FrameStatus::Pending));
        assert!(set.settle(0, SlotState::Failed));
        assert!(!set.settle(0, SlotState::Loaded(Arc::new(RgbaImage::new(1, 1)))));
        assert_eq!(set.status(0), Some(FrameStatus::Failed));
        assert!(!set.settle(7, SlotState::Failed));
        assert_eq!(set.status(7), None);
    }

    #[test]
    fn zero_sized_loaded_frame_is_not_drawable() {
        let set = FrameSet::new(2);
        set.settle(0, SlotState::Loaded(Arc::new(RgbaImage::new(0, 0))));
        set.settle(1, SlotState::Loaded(Arc::new(RgbaImage::new(4, 2))));
        assert_eq!(set.status(0), Some(FrameStatus::Loaded));
        assert!(set.drawable(0).is_none());
        assert!(set.drawable(1).is_some());
    }

    #[test]
    fn counts_track_each_state() {
        let set = FrameSet::new(4);
        set.settle(0, SlotState::Failed);
        set.settle(2, SlotState::Loaded(Arc::new(RgbaImage::new(1, 1))));
        let counts = set.counts();
        assert_eq!(
            counts,
            FrameCounts {
                loaded: 1,
                failed: 1,
                pending: 2
            }
        );
        assert_eq!(counts.settled(), 2);

        let clone = set.clone();
        clone.settle(3, SlotState::Failed);
        assert_eq!(set.counts().failed, 2);
    }
}
