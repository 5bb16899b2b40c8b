use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{AudioMix, MediaToolkit};
use crate::error::Result;

/// Seconds of footage a single placeholder clip stands for
pub const CLIP_SECONDS: f64 = 2.0;

const CLIP_PREFIX: &str = "clip: ";

/// Placeholder line for one generated clip
pub fn clip_line(description: &str) -> String {
    format!("{}{}\n", CLIP_PREFIX, description.trim())
}

/// Media toolkit over text placeholders
///
/// A placeholder video is a text file with one `clip:` line per generated
/// clip; audio tracks show up as extra lines naming the mixed file.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderToolkit;

impl PlaceholderToolkit {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaToolkit for PlaceholderToolkit {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut content = String::new();
        for input in inputs {
            content.push_str(&tokio::fs::read_to_string(input).await?);
        }
        tokio::fs::write(output, content).await?;
        Ok(())
    }

    async fn merge_audio(&self, video: &Path, audio: &Path, mix: AudioMix, output: &Path) -> Result<()> {
        let mut content = tokio::fs::read_to_string(video).await?;
        let track = audio.file_name().unwrap_or_default().to_string_lossy();
        content.push_str(&format!("audio: {} ({:?})\n", track, mix));
        tokio::fs::write(output, content).await?;
        Ok(())
    }

    async fn reencode(&self, input: &Path, output: &Path) -> Result<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let content = tokio::fs::read_to_string(media).await?;
        let clips = content.lines().filter(|l| l.starts_with(CLIP_PREFIX)).count();
        Ok(clips as f64 * CLIP_SECONDS)
    }
}
