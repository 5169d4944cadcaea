use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::{BoxFuture, join_all};
use image::RgbaImage;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::FrameError;
use crate::events::FramesReady;
use crate::frames::{DimensionPolicy, FrameSet, FrameSource, SlotState};
use crate::region::RegionKind;

/// Source of decoded frames. `index` is the 0-based slot.
pub trait FrameFetch: Send + Sync + 'static {
    fn fetch(&self, index: usize) -> BoxFuture<'static, Result<RgbaImage, FrameError>>;
}

/// Reads frames from the asset root and decodes them on the blocking pool.
#[derive(Debug, Clone)]
pub struct DiskFetcher {
    source: FrameSource,
}

impl DiskFetcher {
    pub fn new(source: FrameSource) -> Self {
        Self { source }
    }
}

impl FrameFetch for DiskFetcher {
    fn fetch(&self, index: usize) -> BoxFuture<'static, Result<RgbaImage, FrameError>> {
        let number = index + 1;
        let path = self.source.path_for(index);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || decode_rgba8(number, &path))
                .await
                .map_err(|source| FrameError::Aborted { number, source })?
        })
    }
}

fn decode_rgba8(number: usize, path: &Path) -> Result<RgbaImage, FrameError> {
    let io_err = |source| FrameError::Io {
        number,
        path: path.to_path_buf(),
        source,
    };
    let img = image::ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .decode()
        .map_err(|source| FrameError::Decode {
            number,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img.to_rgba8())
}

#[derive(Debug, Clone, Copy)]
pub struct PreloadOptions {
    pub frame_count: usize,
    pub timeout: Duration,
    pub policy: DimensionPolicy,
}

/// Slot tallies at the moment a preload resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Slots still in flight; they may settle later.
    pub pending: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Decide the final state of a slot from its fetch outcome.
pub fn classify(
    outcome: Result<RgbaImage, FrameError>,
    policy: DimensionPolicy,
    index: usize,
) -> SlotState {
    let number = index + 1;
    match outcome {
        Ok(img) if img.width() == 0 || img.height() == 0 => {
            let err = FrameError::MissingDimensions {
                number,
                width: img.width(),
                height: img.height(),
            };
            match policy {
                DimensionPolicy::Strict => {
                    warn!(error = %err, "frame rejected");
                    SlotState::Failed
                }
                DimensionPolicy::Lenient => {
                    warn!(error = %err, "frame kept but will not be drawn");
                    SlotState::Loaded(Arc::new(img))
                }
            }
        }
        Ok(img) => {
            debug!(frame = number, width = img.width(), height = img.height(), "frame loaded");
            SlotState::Loaded(Arc::new(img))
        }
        Err(err) => {
            warn!(error = %err, "frame failed to load");
            SlotState::Failed
        }
    }
}

/// Start one fetch per slot and resolve once every slot settled or the
/// timeout elapsed, whichever is first. Fetches still running at the timeout
/// are detached and keep filling their slots.
pub async fn preload<F: FrameFetch>(
    fetcher: Arc<F>,
    opts: &PreloadOptions,
) -> (FrameSet, PreloadReport) {
    let started = Instant::now();
    let frames = FrameSet::new(opts.frame_count);
    let policy = opts.policy;

    let handles: Vec<_> = (0..opts.frame_count)
        .map(|index| {
            let fetcher = Arc::clone(&fetcher);
            let frames = frames.clone();
            tokio::spawn(async move {
                let state = classify(fetcher.fetch(index).await, policy, index);
                frames.settle(index, state);
            })
        })
        .collect();

    let timed_out = select! {
        results = join_all(handles) => {
            for res in results {
                if let Err(err) = res {
                    warn!(error = %err, "frame task ended abnormally");
                }
            }
            false
        }
        _ = tokio::time::sleep(opts.timeout) => true,
    };

    let counts = frames.counts();
    let report = PreloadReport {
        total: frames.len(),
        loaded: counts.loaded,
        failed: counts.failed,
        pending: counts.pending,
        timed_out,
        elapsed: started.elapsed(),
    };

    if timed_out {
        warn!(
            pending = report.pending,
            timeout_ms = opts.timeout.as_millis() as u64,
            "frame preload timed out"
        );
    }
    info!(
        loaded = report.loaded,
        total = report.total,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "frames preloaded"
    );
    if report.failed > 0 {
        warn!(failed = report.failed, "some frames failed to load");
    }

    (frames, report)
}

/// Preload one region and announce the result to the viewer.
pub async fn run<F: FrameFetch>(
    region: RegionKind,
    fetcher: Arc<F>,
    opts: PreloadOptions,
    ready_tx: Sender<FramesReady>,
    cancel: CancellationToken,
) -> Result<()> {
    let preload = preload(fetcher, &opts).instrument(info_span!("preload", %region));
    let (frames, report) = select! {
        _ = cancel.cancelled() => {
            debug!(%region, "preload cancelled");
            return Ok(());
        }
        out = preload => out,
    };

    let ready = FramesReady {
        region,
        frames,
        report,
    };
    if ready_tx.send(ready).await.is_err() {
        debug!(%region, "viewer gone before frames were ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameStatus;

    fn io_error() -> FrameError {
        FrameError::Io {
            number: 1,
            path: "missing.jpg".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    #[test]
    fn successful_fetch_is_loaded() {
        let state = classify(Ok(RgbaImage::new(2, 2)), DimensionPolicy::Strict, 0);
        assert!(matches!(state, SlotState::Loaded(img) if img.dimensions() == (2, 2)));
    }

    #[test]
    fn errors_are_failed_under_any_policy() {
        for policy in [DimensionPolicy::Strict, DimensionPolicy::Lenient] {
            assert!(matches!(classify(Err(io_error()), policy, 0), SlotState::Failed));
        }
    }

    #[test]
    fn zero_dimensions_follow_policy() {
        let strict = classify(Ok(RgbaImage::new(0, 4)), DimensionPolicy::Strict, 3);
        assert!(matches!(strict, SlotState::Failed));

        let lenient = classify(Ok(RgbaImage::new(0, 4)), DimensionPolicy::Lenient, 3);
        assert!(matches!(lenient, SlotState::Loaded(_)));

        let frames = FrameSet::new(1);
        frames.settle(0, lenient);
        assert_eq!(frames.status(0), Some(FrameStatus::Loaded));
        assert!(frames.drawable(0).is_none());
    }

    #[tokio::test]
    async fn disk_fetcher_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DiskFetcher::new(FrameSource::new(dir.path(), "/f-{frame}.png"));
        let err = fetcher.fetch(6).await.unwrap_err();
        assert!(matches!(err, FrameError::Io { number: 7, .. }));
    }

    #[tokio::test]
    async fn disk_fetcher_reports_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f-001.png"), b"not an image").unwrap();
        let fetcher = DiskFetcher::new(FrameSource::new(dir.path(), "f-{frame}.png"));
        let err = fetcher.fetch(0).await.unwrap_err();
        assert!(matches!(err, FrameError::Decode { number: 1, .. }));
    }
}
