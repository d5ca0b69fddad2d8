use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::{MediaError, MediaToolkit};

const STDERR_LIMIT: usize = 500;

/// [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` binaries. The number
/// of concurrent child processes is bounded by a semaphore.
pub struct FfmpegToolkit {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    limiter: Arc<Semaphore>,
}

impl FfmpegToolkit {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>, max_processes: usize) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            limiter: Arc::new(Semaphore::new(max_processes.max(1))),
        }
    }

    async fn run(&self, tool: &'static str, mut command: Command) -> Result<Vec<u8>, MediaError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| MediaError::LimiterClosed)?;

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaError::ToolUnavailable { tool, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(STDERR_LIMIT)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(MediaError::CommandFailed {
                tool,
                status: output.status.to_string(),
                stderr: tail.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", num_cpus::get())
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, input: &Path) -> Result<Duration, MediaError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "quiet", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(input);

        let stdout = self.run("ffprobe", command).await?;
        parse_duration(&String::from_utf8_lossy(&stdout))
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<u64, MediaError> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y"])
            .arg(output);

        self.run("ffmpeg", command).await?;
        let size = tokio::fs::metadata(output).await?.len();
        debug!("Extracted {} bytes of audio", size);
        Ok(size)
    }

    async fn cut_segment(
        &self,
        input: &Path,
        start: Duration,
        length: Duration,
        output: &Path,
    ) -> Result<(), MediaError> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-ss")
            .arg(format!("{:.3}", start.as_secs_f64()))
            .arg("-i")
            .arg(input)
            .arg("-t")
            .arg(format!("{:.3}", length.as_secs_f64()))
            .args(["-c", "copy", "-y"])
            .arg(output);

        self.run("ffmpeg", command).await?;
        Ok(())
    }
}

fn parse_duration(raw: &str) -> Result<Duration, MediaError> {
    let trimmed = raw.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| MediaError::InvalidDuration(trimmed.to_string()))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(MediaError::InvalidDuration(trimmed.to_string()));
    }
    Ok(Duration::from_secs_f64(seconds))
}
