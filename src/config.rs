use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use image::Rgba;
use palette::{Srgb, Srgba};
use serde::Deserialize;

use crate::caption::{CaptionStage, CaptionTrack, default_stages};
use crate::easing::DEFAULT_FRAME_COUNT;
use crate::frames::{DimensionPolicy, FRAME_PLACEHOLDER, FrameSource};
use crate::page::PageLayout;
use crate::processing::layout::FitMode;
use crate::region::RegionKind;
use crate::scroll::ProgressFormula;

const DEFAULT_PRELOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one animated region.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegionConfig {
    /// Frame path template; `{frame}` expands to the 3-digit, 1-based number.
    pub frames: String,
    #[serde(default = "RegionConfig::default_frame_count")]
    pub frame_count: usize,
    #[serde(default)]
    pub fit: FitMode,
    #[serde(default)]
    pub progress: ProgressFormula,
    #[serde(default)]
    pub dimension_policy: DimensionPolicy,
    #[serde(
        default = "RegionConfig::default_preload_timeout",
        with = "humantime_serde"
    )]
    pub preload_timeout: Duration,
}

impl RegionConfig {
    fn default_frame_count() -> usize {
        DEFAULT_FRAME_COUNT
    }

    fn default_preload_timeout() -> Duration {
        DEFAULT_PRELOAD_TIMEOUT
    }

    pub fn main_default() -> Self {
        Self {
            frames: "/frames/ezgif-frame-{frame}.jpg".into(),
            frame_count: DEFAULT_FRAME_COUNT,
            fit: FitMode::Contain,
            progress: ProgressFormula::Section,
            dimension_policy: DimensionPolicy::Strict,
            preload_timeout: DEFAULT_PRELOAD_TIMEOUT,
        }
    }

    pub fn footer_default() -> Self {
        Self {
            frames: "/footer/ezgif-frame-{frame}.jpg".into(),
            frame_count: DEFAULT_FRAME_COUNT,
            fit: FitMode::Cover,
            progress: ProgressFormula::Spacer,
            dimension_policy: DimensionPolicy::Lenient,
            preload_timeout: DEFAULT_PRELOAD_TIMEOUT,
        }
    }

    fn validate(&self, kind: RegionKind) -> Result<()> {
        ensure!(
            self.frames.contains(FRAME_PLACEHOLDER),
            "{kind} frames template '{}' must contain {FRAME_PLACEHOLDER}",
            self.frames
        );
        ensure!(
            self.frame_count > 0,
            "{kind} frame-count must be greater than zero"
        );
        ensure!(
            !self.preload_timeout.is_zero(),
            "{kind} preload-timeout must be greater than zero"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory that absolute frame templates are resolved against.
    pub asset_root: PathBuf,
    /// Canvas fill behind every frame, `#rrggbb` or `#rrggbbaa`.
    pub background_color: String,
    pub window_title: String,
    pub fullscreen: bool,
    /// Pixels scrolled per mouse-wheel line.
    pub scroll_line_px: f32,
    #[serde(with = "humantime_serde")]
    pub resize_debounce: Duration,
    /// The caption appears once the hero's bottom edge rises above this.
    pub caption_reveal_threshold_px: f32,
    /// System font family used for captions; the default sans-serif otherwise.
    pub caption_font: Option<String>,
    pub page: PageLayout,
    pub main: RegionConfig,
    pub footer: RegionConfig,
    pub captions: Vec<CaptionStage>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("public"),
            background_color: "#000000".into(),
            window_title: "Praline".into(),
            fullscreen: false,
            scroll_line_px: 60.0,
            resize_debounce: Duration::from_millis(150),
            caption_reveal_threshold_px: 100.0,
            caption_font: None,
            page: PageLayout::default(),
            main: RegionConfig::main_default(),
            footer: RegionConfig::footer_default(),
            captions: default_stages(),
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&s).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.main.validate(RegionKind::Main)?;
        self.footer.validate(RegionKind::Footer)?;
        ensure!(
            self.scroll_line_px.is_finite() && self.scroll_line_px > 0.0,
            "scroll-line-px must be positive"
        );
        ensure!(
            self.caption_reveal_threshold_px.is_finite(),
            "caption-reveal-threshold-px must be finite"
        );
        let page = &self.page;
        for (name, value) in [
            ("hero-vh", page.hero_vh),
            ("animation-vh", page.animation_vh),
            ("interlude-vh", page.interlude_vh),
            ("footer-spacer-vh", page.footer_spacer_vh),
            ("footer-vh", page.footer_vh),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "page.{name} must be a non-negative number"
            );
        }
        ensure!(
            page.animation_vh > 0.0 && page.footer_spacer_vh > 0.0,
            "page.animation-vh and page.footer-spacer-vh must be greater than zero"
        );
        parse_hex_color(&self.background_color).with_context(|| {
            format!(
                "background-color '{}' is not a #rrggbb or #rrggbbaa colour",
                self.background_color
            )
        })?;
        self.caption_track().context("invalid captions")?;
        Ok(self)
    }

    pub fn region(&self, kind: RegionKind) -> &RegionConfig {
        match kind {
            RegionKind::Main => &self.main,
            RegionKind::Footer => &self.footer,
        }
    }

    pub fn frame_source(&self, kind: RegionKind) -> FrameSource {
        FrameSource::new(self.asset_root.clone(), self.region(kind).frames.clone())
    }

    pub fn background(&self) -> Rgba<u8> {
        parse_hex_color(&self.background_color).unwrap_or(Rgba([0, 0, 0, 255]))
    }

    pub fn caption_track(&self) -> Result<CaptionTrack> {
        CaptionTrack::new(self.captions.clone(), self.main.frame_count)
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let rgb = Srgb::<u8>::from_str(hex).ok()?;
            Some(Rgba([rgb.red, rgb.green, rgb.blue, 255]))
        }
        8 => {
            let rgba = Srgba::<u8>::from_str(hex).ok()?;
            Some(Rgba([rgba.red, rgba.green, rgba.blue, rgba.alpha]))
        }
        _ => None,
    }
}
