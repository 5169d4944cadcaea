//! Timed caption stages layered over the main animation.

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::easing::frame_index;
use crate::progress::ProgressReader;

/// Portion of a stage's span used for each of the fade-in and fade-out ramps.
const RAMP: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CaptionStage {
    pub frame_start: usize,
    pub frame_end: usize,
    pub text: String,
}

impl CaptionStage {
    pub fn new(frame_start: usize, frame_end: usize, text: impl Into<String>) -> Self {
        Self {
            frame_start,
            frame_end,
            text: text.into(),
        }
    }

    fn contains(&self, frame: usize) -> bool {
        (self.frame_start..=self.frame_end).contains(&frame)
    }
}

pub fn default_stages() -> Vec<CaptionStage> {
    vec![
        CaptionStage::new(0, 40, "Indulgence Begins."),
        CaptionStage::new(41, 80, "A Crack of Desire."),
        CaptionStage::new(81, 140, "Golden Hazelnut Praline Bliss Flows."),
        CaptionStage::new(141, 191, "Pure Melted Perfection."),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionState<'a> {
    pub text: &'a str,
    /// Index of the active stage; `0` for the fallback.
    pub stage: usize,
    pub opacity: f32,
}

/// Validated, ordered set of caption stages for one frame range.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    stages: Vec<CaptionStage>,
    frame_count: usize,
}

impl CaptionTrack {
    pub fn new(stages: Vec<CaptionStage>, frame_count: usize) -> Result<Self> {
        validate_stages(&stages, frame_count)?;
        Ok(Self {
            stages,
            frame_count,
        })
    }

    pub fn stages(&self) -> &[CaptionStage] {
        &self.stages
    }

    /// Caption for a frame index. Frames outside every stage fall back to the
    /// first stage's text at full opacity.
    pub fn caption_at(&self, frame: usize) -> CaptionState<'_> {
        for (idx, stage) in self.stages.iter().enumerate() {
            if stage.contains(frame) {
                let span = stage.frame_end - stage.frame_start;
                let opacity = if span == 0 {
                    1.0
                } else {
                    stage_opacity((frame - stage.frame_start) as f32 / span as f32)
                };
                return CaptionState {
                    text: &stage.text,
                    stage: idx,
                    opacity,
                };
            }
        }
        CaptionState {
            text: &self.stages[0].text,
            stage: 0,
            opacity: 1.0,
        }
    }

    pub fn caption_for_progress(&self, progress: f32) -> CaptionState<'_> {
        self.caption_at(frame_index(progress, self.frame_count))
    }
}

/// Opacity at a stage-relative position in `[0, 1]`: linear fade in over the
/// first 20%, full in the middle, linear fade out over the last 20%.
pub fn stage_opacity(stage_progress: f32) -> f32 {
    let t = stage_progress.clamp(0.0, 1.0);
    if t < RAMP {
        t / RAMP
    } else if t > 1.0 - RAMP {
        (1.0 - t) / RAMP
    } else {
        1.0
    }
}

fn validate_stages(stages: &[CaptionStage], frame_count: usize) -> Result<()> {
    ensure!(!stages.is_empty(), "captions must include at least one stage");
    let mut previous_end: Option<usize> = None;
    for stage in stages {
        ensure!(
            stage.frame_start <= stage.frame_end,
            "caption '{}' starts after it ends ({} > {})",
            stage.text,
            stage.frame_start,
            stage.frame_end
        );
        ensure!(
            stage.frame_end < frame_count,
            "caption '{}' ends at frame {} but only {} frames exist",
            stage.text,
            stage.frame_end,
            frame_count
        );
        if let Some(end) = previous_end {
            ensure!(
                stage.frame_start > end,
                "caption '{}' overlaps or precedes the previous stage",
                stage.text
            );
        }
        previous_end = Some(stage.frame_end);
    }
    Ok(())
}

/// The caption layer: mounted only while the page has scrolled past the hero.
#[derive(Debug)]
pub struct CaptionOverlay {
    track: CaptionTrack,
    progress: ProgressReader,
    mounted: bool,
}

impl CaptionOverlay {
    pub fn new(track: CaptionTrack, progress: ProgressReader) -> Self {
        Self {
            track,
            progress,
            mounted: false,
        }
    }

    /// Returns whether the mount state changed.
    pub fn set_mounted(&mut self, mounted: bool) -> bool {
        let changed = self.mounted != mounted;
        self.mounted = mounted;
        changed
    }

    /// Current caption, or `None` while unmounted.
    pub fn current(&self) -> Option<CaptionState<'_>> {
        self.mounted
            .then(|| self.track.caption_for_progress(self.progress.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::DEFAULT_FRAME_COUNT;
    use crate::progress::progress_channel;

    fn default_track() -> CaptionTrack {
        CaptionTrack::new(default_stages(), DEFAULT_FRAME_COUNT).unwrap()
    }

    #[test]
    fn every_covered_frame_has_exactly_one_stage() {
        let track = default_track();
        for frame in 0..DEFAULT_FRAME_COUNT {
            let matching = track
                .stages()
                .iter()
                .filter(|stage| stage.contains(frame))
                .count();
            assert_eq!(matching, 1, "frame {frame}");
            let state = track.caption_at(frame);
            assert_eq!(state.text, track.stages()[state.stage].text);
            assert!((0.0..=1.0).contains(&state.opacity));
        }
    }

    #[test]
    fn uncovered_frames_fall_back_to_first_stage() {
        let stages = vec![
            CaptionStage::new(10, 20, "first"),
            CaptionStage::new(30, 40, "second"),
        ];
        let track = CaptionTrack::new(stages, 50).unwrap();
        for frame in [0, 25, 45] {
            let state = track.caption_at(frame);
            assert_eq!(state.text, "first");
            assert_eq!(state.stage, 0);
            assert_eq!(state.opacity, 1.0);
        }
    }

    #[test]
    fn ramp_boundaries_reach_full_opacity() {
        assert_eq!(stage_opacity(0.2), 1.0);
        assert_eq!(stage_opacity(0.8), 1.0);
        assert_eq!(stage_opacity(0.0), 0.0);
        assert_eq!(stage_opacity(1.0), 0.0);
        assert!((stage_opacity(0.1) - 0.5).abs() < 1e-6);
        assert!((stage_opacity(0.9) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn stage_relative_boundaries_from_frames() {
        // Stage 0..=40: frame 8 is 20% in, frame 32 is 80% in.
        let track = default_track();
        assert_eq!(track.caption_at(8).opacity, 1.0);
        assert_eq!(track.caption_at(32).opacity, 1.0);
        assert_eq!(track.caption_at(0).opacity, 0.0);
        assert_eq!(track.caption_at(40).opacity, 0.0);
    }

    #[test]
    fn single_frame_stage_is_fully_visible() {
        let track = CaptionTrack::new(vec![CaptionStage::new(5, 5, "blink")], 10).unwrap();
        let state = track.caption_at(5);
        assert_eq!(state.opacity, 1.0);
        assert_eq!(state.text, "blink");
    }

    #[test]
    fn rejects_invalid_stage_lists() {
        assert!(CaptionTrack::new(Vec::new(), 10).is_err());
        assert!(CaptionTrack::new(vec![CaptionStage::new(5, 2, "x")], 10).is_err());
        assert!(CaptionTrack::new(vec![CaptionStage::new(0, 10, "x")], 10).is_err());
        let overlapping = vec![CaptionStage::new(0, 5, "a"), CaptionStage::new(5, 9, "b")];
        assert!(CaptionTrack::new(overlapping, 10).is_err());
    }

    #[test]
    fn overlay_is_absent_while_unmounted() {
        let (mut writer, reader) = progress_channel(0.0);
        let mut overlay = CaptionOverlay::new(default_track(), reader);
        assert!(overlay.current().is_none());

        assert!(overlay.set_mounted(true));
        assert!(!overlay.set_mounted(true));
        writer.publish(1.0);
        let state = overlay.current().unwrap();
        assert_eq!(state.text, "Pure Melted Perfection.");
        assert_eq!(state.stage, 3);

        overlay.set_mounted(false);
        assert!(overlay.current().is_none());
    }
}
