//! Media tooling used by the video pipeline: duration probing, audio track
//! extraction and fixed-length segment cutting.

mod ffmpeg;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use ffmpeg::FfmpegToolkit;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{tool} is not available: {source}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Could not determine media duration: {0}")]
    InvalidDuration(String),

    #[error("Extracted audio is too small ({size} bytes)")]
    AudioTooSmall { size: u64 },

    #[error("Media process limiter closed")]
    LimiterClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// External media operations. All paths are local files owned by the caller.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    async fn probe_duration(&self, input: &Path) -> Result<Duration, MediaError>;

    /// Writes a mono 16 kHz PCM WAV track to `output` and returns its size.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<u64, MediaError>;

    /// Copies `length` of `input` starting at `start` into `output` without re-encoding.
    async fn cut_segment(
        &self,
        input: &Path,
        start: Duration,
        length: Duration,
        output: &Path,
    ) -> Result<(), MediaError>;
}

/// Start offset and length of each fixed-length segment covering `total`.
/// The last segment is shortened to end at `total`.
pub fn segment_bounds(total: Duration, segment: Duration) -> Vec<(Duration, Duration)> {
    if segment.is_zero() {
        return vec![(Duration::ZERO, total)];
    }

    let mut bounds = Vec::new();
    let mut start = Duration::ZERO;
    while start < total {
        let length = segment.min(total - start);
        bounds.push((start, length));
        start += segment;
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_bounds_with_remainder() {
        let bounds = segment_bounds(Duration::from_secs(1500), Duration::from_secs(600));
        assert_eq!(
            bounds,
            vec![
                (Duration::from_secs(0), Duration::from_secs(600)),
                (Duration::from_secs(600), Duration::from_secs(600)),
                (Duration::from_secs(1200), Duration::from_secs(300)),
            ]
        );
    }

    #[test]
    fn test_segment_bounds_exact_multiple() {
        let bounds = segment_bounds(Duration::from_secs(1200), Duration::from_secs(600));
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[1], (Duration::from_secs(600), Duration::from_secs(600)));
    }

    #[test]
    fn test_segment_bounds_zero_length() {
        assert!(segment_bounds(Duration::ZERO, Duration::from_secs(600)).is_empty());
        assert_eq!(
            segment_bounds(Duration::from_secs(30), Duration::ZERO),
            vec![(Duration::ZERO, Duration::from_secs(30))]
        );
    }
}
