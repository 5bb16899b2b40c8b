//! Local media transforms
//!
//! Stitching, audio mixing, reencoding and duration probing all run on the
//! local machine. [`FfmpegToolkit`] shells out to `ffmpeg`/`ffprobe`;
//! [`PlaceholderToolkit`] works on the text placeholders written by the
//! fake gateway.

pub mod ffmpeg;
pub mod placeholder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::BuildSettings;
use crate::error::Result;

pub use ffmpeg::FfmpegToolkit;
pub use placeholder::PlaceholderToolkit;

/// How an audio track is laid over a video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMix {
    /// Replace the soundtrack entirely
    Replace,
    /// Mix in quietly under the existing soundtrack
    Background,
    /// Mix in at full volume over the existing soundtrack
    Voice,
}

impl AudioMix {
    pub fn volume(&self) -> f32 {
        match self {
            AudioMix::Replace | AudioMix::Voice => 1.0,
            AudioMix::Background => 0.25,
        }
    }
}

#[async_trait]
pub trait MediaToolkit: Send + Sync {
    fn name(&self) -> &str;

    /// Stitch `inputs` in order into `output`
    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;

    /// Lay `audio` over `video` into `output`
    async fn merge_audio(&self, video: &Path, audio: &Path, mix: AudioMix, output: &Path) -> Result<()>;

    /// Reencode `input` into a stitchable format
    async fn reencode(&self, input: &Path, output: &Path) -> Result<()>;

    /// Duration of a media file in seconds
    async fn probe_duration(&self, media: &Path) -> Result<f64>;
}

/// Placeholder toolkit in test mode, ffmpeg otherwise
pub fn toolkit_for(settings: &BuildSettings) -> Arc<dyn MediaToolkit> {
    if settings.test_mode {
        Arc::new(PlaceholderToolkit::new())
    } else {
        let toolkit = FfmpegToolkit::new();
        if !toolkit.check_ffmpeg_available() {
            warn!("⚠️ ffmpeg is not available, media stages will fail");
        }
        Arc::new(toolkit)
    }
}
