//! Scroll progress to frame index mapping.
//!
//! Both the canvas renderer and the caption overlay go through [`frame_index`],
//! so the frame they derive for a given progress value is always the same.

/// Number of frames in each shipped image sequence.
pub const DEFAULT_FRAME_COUNT: usize = 192;

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Map a scroll progress value to a frame index in `[0, frame_count - 1]`.
///
/// Out-of-range progress is clamped; NaN is treated as `0.0`.
pub fn frame_index(progress: f32, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let progress = if progress.is_nan() {
        0.0
    } else {
        f64::from(progress).clamp(0.0, 1.0)
    };
    let eased = ease_in_out_cubic(progress);
    let last = frame_count - 1;
    let raw = (eased * last as f64).floor();
    (raw.max(0.0) as usize).min(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_midpoint() {
        assert_eq!(frame_index(0.0, DEFAULT_FRAME_COUNT), 0);
        assert_eq!(frame_index(0.5, DEFAULT_FRAME_COUNT), 95);
        assert_eq!(frame_index(1.0, DEFAULT_FRAME_COUNT), 191);
    }

    #[test]
    fn clamps_out_of_range_progress() {
        assert_eq!(
            frame_index(-0.5, DEFAULT_FRAME_COUNT),
            frame_index(0.0, DEFAULT_FRAME_COUNT)
        );
        assert_eq!(
            frame_index(1.5, DEFAULT_FRAME_COUNT),
            frame_index(1.0, DEFAULT_FRAME_COUNT)
        );
        assert_eq!(frame_index(f32::NAN, DEFAULT_FRAME_COUNT), 0);
    }

    #[test]
    fn non_decreasing_across_progress() {
        let mut previous = 0;
        for step in 0..=10_000 {
            let p = step as f32 / 10_000.0;
            let idx = frame_index(p, DEFAULT_FRAME_COUNT);
            assert!(idx >= previous, "index regressed at p={p}: {idx} < {previous}");
            assert!(idx < DEFAULT_FRAME_COUNT);
            previous = idx;
        }
        assert_eq!(previous, DEFAULT_FRAME_COUNT - 1);
    }

    #[test]
    fn repeated_calls_agree() {
        for p in [0.0_f32, 0.13, 0.5, 0.77, 1.0] {
            assert_eq!(
                frame_index(p, DEFAULT_FRAME_COUNT),
                frame_index(p, DEFAULT_FRAME_COUNT)
            );
        }
    }

    #[test]
    fn easing_is_symmetric_around_midpoint() {
        let a = ease_in_out_cubic(0.25);
        let b = ease_in_out_cubic(0.75);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
    }

    #[test]
    fn degenerate_frame_counts() {
        assert_eq!(frame_index(0.7, 0), 0);
        assert_eq!(frame_index(0.7, 1), 0);
    }
}
