mod font;
mod gpu;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowAttributes},
};

use crate::caption::{CaptionOverlay, CaptionState};
use crate::config::Configuration;
use crate::events::{FramesReady, ViewerEvent};
use crate::page::{PageGeometry, PageLayout, PageScroll};
use crate::region::{AnimatedRegion, RegionKind};
use crate::tracker::ScrollTracker;

use gpu::{OverlayText, Presenter, RenderError};

const LOADING_MESSAGE: &str = "Preparing your cinematic experience...";

/// How a key press moves the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    By(f32),
    To(f32),
}

/// Map navigation keys onto scroll movements for a viewport of `viewport_height`.
pub fn key_scroll(key: &Key, viewport_height: f32, line_px: f32) -> Option<ScrollAction> {
    let page = viewport_height * 0.9;
    match key {
        Key::Named(NamedKey::ArrowDown) => Some(ScrollAction::By(line_px)),
        Key::Named(NamedKey::ArrowUp) => Some(ScrollAction::By(-line_px)),
        Key::Named(NamedKey::PageDown) | Key::Named(NamedKey::Space) => {
            Some(ScrollAction::By(page))
        }
        Key::Named(NamedKey::PageUp) => Some(ScrollAction::By(-page)),
        Key::Named(NamedKey::Home) => Some(ScrollAction::To(0.0)),
        Key::Named(NamedKey::End) => Some(ScrollAction::To(f32::MAX)),
        _ => None,
    }
}

/// Pixels to scroll for a wheel event. Positive scrolls the page down.
pub fn wheel_scroll(delta: MouseScrollDelta, line_px: f32) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * line_px,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}

/// Which canvas is on screen for the current scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Region(RegionKind),
    Background,
}

/// Text drawn over the visible layer.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Overlay<'a> {
    Loading,
    Caption(CaptionState<'a>),
}

/// Pick the layer and overlay for one frame. Captions belong to the main
/// section and are never drawn over the footer or the bare background.
fn compose<'a>(
    footer_visible: bool,
    main_visible: bool,
    main_ready: bool,
    caption: Option<CaptionState<'a>>,
) -> (Layer, Option<Overlay<'a>>) {
    if footer_visible {
        return (Layer::Region(RegionKind::Footer), None);
    }
    if !main_visible {
        return (Layer::Background, None);
    }
    let overlay = if main_ready {
        caption.map(Overlay::Caption)
    } else {
        Some(Overlay::Loading)
    };
    (Layer::Region(RegionKind::Main), overlay)
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    page: PageLayout,
    scroll: PageScroll,
    tracker: ScrollTracker,
    regions: Vec<AnimatedRegion>,
    captions: CaptionOverlay,
    uploaded: Option<(RegionKind, u64)>,
    closed: bool,
}

impl ViewerApp {
    fn new(cfg: Configuration, cancel: CancellationToken) -> Result<Self> {
        let background = cfg.background();
        let regions: Vec<AnimatedRegion> = RegionKind::ALL
            .iter()
            .map(|&kind| {
                AnimatedRegion::new(kind, cfg.region(kind), background, cfg.resize_debounce, (1, 1))
            })
            .collect();
        let main_progress = regions
            .iter()
            .find(|region| region.kind() == RegionKind::Main)
            .map(AnimatedRegion::progress_reader)
            .context("main region missing")?;
        let captions = CaptionOverlay::new(cfg.caption_track()?, main_progress);
        Ok(Self {
            page: cfg.page.clone(),
            scroll: PageScroll::default(),
            tracker: ScrollTracker::new(cfg.caption_reveal_threshold_px),
            regions,
            captions,
            cfg,
            cancel,
            window: None,
            presenter: None,
            uploaded: None,
            closed: false,
        })
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let mut attrs = WindowAttributes::default().with_title(self.cfg.window_title.clone());
        if self.cfg.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create viewer window");
                None
            }
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let font = font::resolve_caption_font(self.cfg.caption_font.as_deref());
        let presenter = Presenter::new(window, self.cfg.background(), font)?;
        let (width, height) = presenter.size();
        for region in &mut self.regions {
            region.fit_viewport(width, height);
        }
        self.presenter = Some(presenter);

        // Initial state before any input arrives.
        let geometry = self.geometry();
        let update = self.tracker.compute(&geometry, &mut self.regions);
        self.captions.set_mounted(update.caption_visible);
        Ok(())
    }

    fn viewport_height(&self) -> f32 {
        self.presenter
            .as_ref()
            .map(|p| p.size().1 as f32)
            .unwrap_or(1.0)
    }

    fn geometry(&self) -> PageGeometry {
        let vh = self.viewport_height();
        self.page.geometry(self.scroll.offset(), vh)
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        presenter.resize(new_size);
        let (width, height) = presenter.size();
        let now = Instant::now();
        for region in &mut self.regions {
            region.on_resize(width, height, now);
        }
        // Keep the same offset valid for the new document height.
        let max = self.page.max_scroll(height as f32);
        self.scroll.scroll_to(self.scroll.offset(), max);
        self.tracker.on_resize();
        self.request_redraw();
    }

    fn scroll_by(&mut self, delta: f32) {
        let max = self.page.max_scroll(self.viewport_height());
        if self.scroll.scroll_by(delta, max) {
            self.tracker.on_scroll();
        }
    }

    fn scroll_to(&mut self, offset: f32) {
        let max = self.page.max_scroll(self.viewport_height());
        if self.scroll.scroll_to(offset, max) {
            self.tracker.on_scroll();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        if event.logical_key == Key::Named(NamedKey::Escape) {
            info!("escape pressed; closing viewer");
            event_loop.exit();
            return;
        }
        match key_scroll(&event.logical_key, self.viewport_height(), self.cfg.scroll_line_px) {
            Some(ScrollAction::By(delta)) => self.scroll_by(delta),
            Some(ScrollAction::To(offset)) => self.scroll_to(offset),
            None => {}
        }
    }

    fn frames_ready(&mut self, ready: FramesReady) {
        let FramesReady {
            region,
            frames,
            report,
        } = ready;
        match self.regions.iter_mut().find(|r| r.kind() == region) {
            Some(target) => target.attach_frames(frames, &report),
            None => warn!(%region, "frames arrived for unknown region"),
        }
        self.request_redraw();
    }

    fn region(&self, kind: RegionKind) -> Option<&AnimatedRegion> {
        self.regions.iter().find(|region| region.kind() == kind)
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_none() {
            return;
        }
        let now = Instant::now();

        let geometry = self.geometry();
        if let Some(update) = self.tracker.flush(&geometry, &mut self.regions) {
            if update.caption_toggled {
                self.captions.set_mounted(update.caption_visible);
                debug!(visible = update.caption_visible, "caption visibility changed");
            }
        }

        for region in &mut self.regions {
            region.tick(now);
        }

        let visible = |kind| self.region(kind).is_some_and(AnimatedRegion::is_visible);
        let (layer, overlay) = compose(
            visible(RegionKind::Footer),
            visible(RegionKind::Main),
            self.region(RegionKind::Main).is_some_and(AnimatedRegion::is_ready),
            self.captions.current(),
        );
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };

        let mut show_canvas = false;
        if let Layer::Region(kind) = layer {
            if let Some(region) = self.regions.iter().find(|r| r.kind() == kind) {
                if region.is_ready() {
                    let stamp = (kind, region.renderer().generation());
                    if self.uploaded != Some(stamp) {
                        presenter.upload(region.renderer().canvas().image());
                        self.uploaded = Some(stamp);
                    }
                    show_canvas = true;
                }
            }
        }

        let (_, height) = presenter.size();
        let scale = (height as f32 * 0.06).clamp(24.0, 96.0);
        let overlay = overlay.map(|overlay| match overlay {
            Overlay::Loading => OverlayText {
                text: LOADING_MESSAGE,
                opacity: 1.0,
                anchor_y: 0.5,
                scale: scale * 0.6,
            },
            Overlay::Caption(state) => OverlayText {
                text: state.text,
                opacity: state.opacity,
                anchor_y: 0.82,
                scale,
            },
        });

        match presenter.render(show_canvas, overlay) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost))
            | Err(RenderError::Surface(wgpu::SurfaceError::Outdated)) => {
                info!("surface lost; reconfiguring");
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                error!("surface out of memory; exiting event loop");
                event_loop.exit();
            }
            Err(RenderError::Surface(other)) => {
                warn!(error = ?other, "surface error");
            }
            Err(RenderError::Glyph(err)) => {
                warn!(error = %err, "caption render failed");
            }
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.tracker.detach();
        for region in &mut self.regions {
            region.teardown();
        }
        self.captions.set_mounted(false);
        self.cancel.cancel();
        debug!("viewer torn down");
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.presenter.is_none() {
            if let Err(err) = self.init_gpu(window) {
                error!(error = ?err, "failed to initialize GPU state");
                event_loop.exit();
                return;
            }
        }

        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id || self.closed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("viewer window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_by(wheel_scroll(delta, self.cfg.scroll_line_px));
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, event);
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.closed {
            self.request_redraw();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::FramesReady(ready) => self.frames_ready(ready),
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

pub fn run_windowed(
    cfg: Configuration,
    mut ready_rx: mpsc::Receiver<FramesReady>,
    cancel: CancellationToken,
) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let forward_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = proxy.send_event(ViewerEvent::Cancelled);
                        break;
                    }
                    ready = ready_rx.recv() => match ready {
                        Some(ready) => {
                            if proxy.send_event(ViewerEvent::FramesReady(ready)).is_err() {
                                break;
                            }
                        }
                        None => {
                            cancel.cancelled().await;
                            let _ = proxy.send_event(ViewerEvent::Cancelled);
                            break;
                        }
                    },
                }
            }
        })
    };

    let mut app = ViewerApp::new(cfg, cancel)?;
    let run_result = event_loop.run_app(&mut app);
    app.teardown();
    forward_task.abort();

    run_result.context("viewer event loop failed")
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn navigation_keys_scroll_the_page() {
        let down = key_scroll(&Key::Named(NamedKey::ArrowDown), 800.0, 60.0);
        assert_eq!(down, Some(ScrollAction::By(60.0)));
        let page_up = key_scroll(&Key::Named(NamedKey::PageUp), 800.0, 60.0);
        assert_eq!(page_up, Some(ScrollAction::By(-720.0)));
        let home = key_scroll(&Key::Named(NamedKey::Home), 800.0, 60.0);
        assert_eq!(home, Some(ScrollAction::To(0.0)));
        assert_eq!(key_scroll(&Key::Character("x".into()), 800.0, 60.0), None);
    }

    #[test]
    fn wheel_deltas_scroll_opposite_to_content_motion() {
        assert_eq!(wheel_scroll(MouseScrollDelta::LineDelta(0.0, -2.0), 60.0), 120.0);
        assert_eq!(wheel_scroll(MouseScrollDelta::LineDelta(0.0, 1.0), 60.0), -60.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 35.0));
        assert_eq!(wheel_scroll(pixels, 60.0), -35.0);
    }

    const CAPTION: CaptionState<'static> = CaptionState {
        text: "Pure Melted Perfection.",
        stage: 2,
        opacity: 1.0,
    };

    #[test]
    fn hero_shows_background_only() {
        assert_eq!(compose(false, false, true, None), (Layer::Background, None));
    }

    #[test]
    fn main_section_carries_its_caption() {
        assert_eq!(
            compose(false, true, true, Some(CAPTION)),
            (Layer::Region(RegionKind::Main), Some(Overlay::Caption(CAPTION)))
        );
        assert_eq!(
            compose(false, true, true, None),
            (Layer::Region(RegionKind::Main), None)
        );
    }

    #[test]
    fn caption_stays_off_the_interlude_background() {
        // Past the hero the caption flag stays set while the section is off screen.
        assert_eq!(
            compose(false, false, true, Some(CAPTION)),
            (Layer::Background, None)
        );
    }

    #[test]
    fn footer_wins_and_hides_caption() {
        assert_eq!(
            compose(true, true, true, Some(CAPTION)),
            (Layer::Region(RegionKind::Footer), None)
        );
        assert_eq!(
            compose(true, false, false, None),
            (Layer::Region(RegionKind::Footer), None)
        );
    }

    #[test]
    fn loading_message_replaces_caption_until_frames_arrive() {
        assert_eq!(
            compose(false, true, false, Some(CAPTION)),
            (Layer::Region(RegionKind::Main), Some(Overlay::Loading))
        );
        assert_eq!(compose(false, false, false, None), (Layer::Background, None));
    }
}
