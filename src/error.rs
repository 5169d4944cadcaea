use std::path::PathBuf;

use thiserror::Error;

/// Why a single frame slot ended up `Failed`.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame file could not be opened or read.
    #[error("failed to read frame {number:03} at {}", path.display())]
    Io {
        number: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but could not be decoded as an image.
    #[error("failed to decode frame {number:03} at {}", path.display())]
    Decode {
        number: usize,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Decoding succeeded but produced an image with a zero dimension.
    #[error("frame {number:03} decoded without usable dimensions ({width}x{height})")]
    MissingDimensions {
        number: usize,
        width: u32,
        height: u32,
    },

    /// The blocking decode task was cancelled or panicked.
    #[error("decode task for frame {number:03} did not complete")]
    Aborted {
        number: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}
