use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use praline_reel::caption::CaptionOverlay;
use praline_reel::config::Configuration;
use praline_reel::easing::frame_index;
use praline_reel::frames::{FrameSet, SlotState};
use praline_reel::page::{PageLayout, PageScroll};
use praline_reel::region::{AnimatedRegion, RegionKind};
use praline_reel::tasks::loader::PreloadReport;
use praline_reel::tasks::renderer::DrawOutcome;
use praline_reel::tracker::ScrollTracker;

const VH: f32 = 800.0;

struct Page {
    layout: PageLayout,
    scroll: PageScroll,
    tracker: ScrollTracker,
    regions: Vec<AnimatedRegion>,
}

impl Page {
    fn new(cfg: &Configuration) -> Self {
        let regions = RegionKind::ALL
            .iter()
            .map(|&kind| {
                AnimatedRegion::new(
                    kind,
                    cfg.region(kind),
                    Rgba([0, 0, 0, 255]),
                    Duration::from_millis(150),
                    (16, 9),
                )
            })
            .collect();
        Self {
            layout: cfg.page.clone(),
            scroll: PageScroll::default(),
            tracker: ScrollTracker::new(cfg.caption_reveal_threshold_px),
            regions,
        }
    }

    fn region(&self, kind: RegionKind) -> &AnimatedRegion {
        self.regions.iter().find(|r| r.kind() == kind).unwrap()
    }

    fn region_mut(&mut self, kind: RegionKind) -> &mut AnimatedRegion {
        self.regions.iter_mut().find(|r| r.kind() == kind).unwrap()
    }

    fn scroll_to(&mut self, offset: f32) {
        let max = self.layout.max_scroll(VH);
        if self.scroll.scroll_to(offset, max) {
            self.tracker.on_scroll();
        }
    }

    fn frame(&mut self) -> Option<praline_reel::tracker::TrackerUpdate> {
        let geometry = self.layout.geometry(self.scroll.offset(), VH);
        self.tracker.flush(&geometry, &mut self.regions)
    }
}

fn loaded_frames(count: usize) -> FrameSet {
    let frames = FrameSet::new(count);
    for index in 0..count {
        let img = RgbaImage::from_pixel(4, 3, Rgba([index as u8, 0, 0, 255]));
        frames.settle(index, SlotState::Loaded(Arc::new(img)));
    }
    frames
}

#[test]
fn initial_state_is_computed_without_input() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);
    let geometry = page.layout.geometry(0.0, VH);

    let update = page.tracker.compute(&geometry, &mut page.regions);
    assert!(!update.caption_visible);
    assert_eq!(page.region(RegionKind::Main).progress(), 0.0);
    // The animation section starts exactly at the fold.
    assert!(!page.region(RegionKind::Main).is_visible());
    assert!(page.frame().is_none());
}

#[test]
fn burst_of_scrolls_runs_once_per_frame() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);

    for offset in [100.0, 200.0, 300.0, 400.0] {
        page.scroll_to(offset);
    }
    assert!(page.tracker.is_scheduled());
    let update = page.frame().expect("one scheduled computation");
    assert_eq!(update.published, 1);
    assert!(page.frame().is_none());

    // Section top at 400px in an 800px viewport, 3200px tall.
    let expected = 400.0 / (VH + 3200.0);
    assert!((page.region(RegionKind::Main).progress() - expected).abs() < 1e-4);
}

#[test]
fn caption_appears_once_hero_has_scrolled_away() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);
    let mut captions = CaptionOverlay::new(
        cfg.caption_track().unwrap(),
        page.region(RegionKind::Main).progress_reader(),
    );

    page.scroll_to(700.0);
    let update = page.frame().unwrap();
    assert!(!update.caption_visible);
    captions.set_mounted(update.caption_visible);
    assert!(captions.current().is_none());

    page.scroll_to(701.0);
    let update = page.frame().unwrap();
    assert!(update.caption_visible);
    assert!(update.caption_toggled);
    captions.set_mounted(update.caption_visible);
    let caption = captions.current().unwrap();
    assert_eq!(caption.text, "Indulgence Begins.");

    page.scroll_to(0.0);
    let update = page.frame().unwrap();
    assert!(update.caption_toggled);
    captions.set_mounted(update.caption_visible);
    assert!(captions.current().is_none());
}

#[test]
fn main_progress_drives_rendered_frame() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);
    page.region_mut(RegionKind::Main)
        .attach_frames(loaded_frames(192), &PreloadReport::default());

    // Halfway through the pass: top at vh - 0.5 * (vh + height).
    let section_top = VH;
    let offset = section_top - (VH - 0.5 * (VH + 3200.0));
    page.scroll_to(offset);
    page.frame().unwrap();

    let progress = page.region(RegionKind::Main).progress();
    assert!((progress - 0.5).abs() < 1e-3);
    let outcome = page.region_mut(RegionKind::Main).tick(Instant::now());
    assert_eq!(
        outcome,
        DrawOutcome::Drawn {
            frame: frame_index(progress, 192)
        }
    );
}

#[test]
fn footer_overlay_tracks_spacer_and_holds_at_end() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);
    let spacer_top = (1.0 + 4.0 + 3.0) * VH;
    let spacer_height = 3.0 * VH;

    page.scroll_to(spacer_top - 10.0);
    page.frame().unwrap();
    assert!(!page.region(RegionKind::Footer).is_visible());
    assert_eq!(page.region(RegionKind::Footer).progress(), 0.0);

    page.scroll_to(spacer_top + (spacer_height - VH) / 2.0);
    page.frame().unwrap();
    let footer = page.region(RegionKind::Footer);
    assert!(footer.is_visible());
    assert!((footer.progress() - 0.5).abs() < 1e-3);

    // The document ends 0.6vh below the spacer, so the spacer never fully
    // leaves the viewport; at the bottom the progress is complete.
    let bottom = page.layout.max_scroll(VH);
    page.scroll_to(bottom);
    page.frame().unwrap();
    assert_eq!(page.region(RegionKind::Footer).progress(), 1.0);
}

#[test]
fn detached_tracker_ignores_scrolls() {
    let cfg = Configuration::default();
    let mut page = Page::new(&cfg);
    page.tracker.detach();
    for region in &mut page.regions {
        region.teardown();
    }

    page.scroll_to(2000.0);
    assert!(!page.tracker.is_scheduled());
    assert!(page.frame().is_none());
    assert_eq!(page.region(RegionKind::Main).progress(), 0.0);
    assert_eq!(
        page.region_mut(RegionKind::Main).tick(Instant::now()),
        DrawOutcome::Stopped
    );
}
