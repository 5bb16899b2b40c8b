use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use async_trait::async_trait;
use tokio::task;
use tracing::{debug, info};

use super::{AudioMix, MediaToolkit};
use crate::error::{CompositorError, Result};

/// Media toolkit backed by the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg: String,
    ffprobe: String,
    /// Constant rate factor used when reencoding
    crf: u8,
    fps: u32,
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            crf: 23,
            fps: 24,
        }
    }

    /// Use executables from a specific location
    pub fn with_binaries<S: Into<String>>(ffmpeg: S, ffprobe: S) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            ..Self::new()
        }
    }

    /// Check if the configured ffmpeg executable runs
    pub fn check_ffmpeg_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn run(&self, stage: &'static str, mut cmd: Command) -> Result<Output> {
        debug!("Running {:?}", cmd);

        let output = task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| CompositorError::stage(stage, format!("Failed to spawn process: {}", e)))?
            .map_err(|e| CompositorError::stage(stage, format!("Execution failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompositorError::stage(stage, format!("FFmpeg failed: {}", stderr.trim())));
        }

        Ok(output)
    }

    async fn has_audio_stream(&self, media: &Path) -> Result<bool> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v", "error",
            "-select_streams", "a",
            "-show_entries", "stream=index",
            "-of", "csv=p=0",
        ])
        .arg(media);

        let output = self.run("probe", cmd).await?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        info!("🎞️ Concatenating {} clips into {}", inputs.len(), output.display());

        let mut list = String::new();
        for input in inputs {
            let absolute = if input.is_absolute() {
                input.clone()
            } else {
                std::env::current_dir()?.join(input)
            };
            // Single quotes are escaped as '\'' in concat lists
            let escaped = absolute.display().to_string().replace('\'', "'\\''");
            list.push_str(&format!("file '{}'\n", escaped));
        }

        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, list).await?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy", "-y"])
            .arg(output);

        let result = self.run("concatenation", cmd).await;
        let _ = tokio::fs::remove_file(&list_path).await;
        result.map(|_| ())
    }

    async fn merge_audio(&self, video: &Path, audio: &Path, mix: AudioMix, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-i").arg(video).arg("-i").arg(audio);

        match mix {
            AudioMix::Replace => {
                cmd.args(["-map", "0:v", "-map", "1:a"]);
            }
            AudioMix::Background | AudioMix::Voice => {
                let filter = if self.has_audio_stream(video).await? {
                    format!(
                        "[1:a]volume={}[m];[0:a][m]amix=inputs=2:duration=first[a]",
                        mix.volume()
                    )
                } else {
                    format!("[1:a]volume={}[a]", mix.volume())
                };
                cmd.args(["-filter_complex", &filter, "-map", "0:v", "-map", "[a]"]);
            }
        }

        cmd.args(["-c:v", "copy", "-c:a", "aac", "-shortest", "-y"]).arg(output);
        self.run("audio_merge", cmd).await?;
        Ok(())
    }

    async fn reencode(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-i")
            .arg(input)
            .args([
                "-c:v", "libx264",
                "-preset", "medium",
                "-crf", &self.crf.to_string(),
                "-r", &self.fps.to_string(),
                "-pix_fmt", "yuv420p",
                "-c:a", "aac",
                "-y",
            ])
            .arg(output);

        self.run("reencoding", cmd).await?;
        Ok(())
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v", "error",
            "-show_entries", "format=duration",
            "-of", "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(media);

        let output = self.run("probe", cmd).await?;
        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|e| CompositorError::stage("probe", format!("Unreadable duration '{}': {}", text.trim(), e)))
    }
}
