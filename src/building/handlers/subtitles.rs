use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::building::{current_media, BuildContext, BuildHandler};
use crate::error::{CompositorError, Result};
use crate::prompt::{to_srt, Subtitle};
use crate::video::{Video, VideoMetadata};

/// Extension of the subtitle file written next to a subtitled video
pub const SUBTITLE_EXTENSION: &str = "srt";

/// Writes the prompt subtitles as a sidecar of the video
///
/// Subtitles already carried by the prompt are used as they are; otherwise
/// the prompt recording is transcribed by the gateway.
pub struct SubtitlesHandler {
    recording: Option<PathBuf>,
    subtitles: Vec<Subtitle>,
}

impl SubtitlesHandler {
    pub fn new(recording: Option<PathBuf>, subtitles: Vec<Subtitle>) -> Self {
        Self {
            recording,
            subtitles,
        }
    }

    async fn resolve(&self, ctx: &BuildContext) -> Result<Vec<Subtitle>> {
        if !self.subtitles.is_empty() {
            return Ok(self.subtitles.clone());
        }

        let recording = self
            .recording
            .as_ref()
            .ok_or_else(|| CompositorError::stage(self.name(), "no recording to transcribe"))?;
        let gateway = ctx.gateway();

        ctx.retry()
            .run(self.name(), || gateway.get_subtitles(recording))
            .await
    }
}

#[async_trait]
impl BuildHandler for SubtitlesHandler {
    fn name(&self) -> &str {
        "subtitles"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_subtitled()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        let subtitles = self.resolve(ctx).await?;

        ctx.ensure_work_dir().await?;
        let target = ctx.next_artifact_path(video, VideoMetadata::mark_subtitled)?;

        info!("💬 Writing {} subtitles", subtitles.len());
        tokio::fs::copy(&media, &target).await?;
        tokio::fs::write(target.with_extension(SUBTITLE_EXTENSION), to_srt(&subtitles)).await?;

        ctx.commit(video, VideoMetadata::mark_subtitled, target);
        Ok(())
    }
}
