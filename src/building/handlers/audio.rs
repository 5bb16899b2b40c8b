use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::building::{current_media, BuildContext, BuildHandler};
use crate::error::Result;
use crate::media::AudioMix;
use crate::video::{Video, VideoMetadata};

/// Replaces the soundtrack with the recorded prompt audio
pub struct PromptAudioHandler {
    recording: PathBuf,
}

impl PromptAudioHandler {
    pub fn new(recording: PathBuf) -> Self {
        Self { recording }
    }
}

#[async_trait]
impl BuildHandler for PromptAudioHandler {
    fn name(&self) -> &str {
        "prompt_audio"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_prompt_audio_used()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        ctx.ensure_work_dir().await?;
        let target = ctx.next_artifact_path(video, VideoMetadata::mark_prompt_audio_used)?;

        info!("🎙️ Using recorded prompt {} as soundtrack", self.recording.display());
        ctx.toolkit()
            .merge_audio(&media, &self.recording, AudioMix::Replace, &target)
            .await?;

        ctx.commit(video, VideoMetadata::mark_prompt_audio_used, target);
        Ok(())
    }
}

/// Where the background music comes from
#[derive(Debug, Clone, PartialEq)]
pub enum MusicSource {
    /// Composed by the gateway from a prompt
    Generated { prompt: String },
    /// A configured track
    DefaultTrack(PathBuf),
}

/// Lays background music under the video
pub struct BackgroundMusicHandler {
    source: MusicSource,
}

impl BackgroundMusicHandler {
    pub fn generated(prompt: String) -> Self {
        Self {
            source: MusicSource::Generated { prompt },
        }
    }

    pub fn default_track(track: PathBuf) -> Self {
        Self {
            source: MusicSource::DefaultTrack(track),
        }
    }

    pub fn source(&self) -> &MusicSource {
        &self.source
    }
}

fn mark_generated_music(metadata: &mut VideoMetadata) {
    metadata.mark_bg_music_applied();
    metadata.mark_bg_music_generated();
}

#[async_trait]
impl BuildHandler for BackgroundMusicHandler {
    fn name(&self) -> &str {
        "background_music"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_bg_music_applied()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        let work_dir = ctx.ensure_work_dir().await?;

        let (track, stage): (PathBuf, fn(&mut VideoMetadata)) = match &self.source {
            MusicSource::Generated { prompt } => {
                let duration = ctx.toolkit().probe_duration(&media).await?;
                let seconds = duration.ceil().max(1.0) as u32;
                let gateway = ctx.gateway();

                info!("🎵 Generating {}s of background music", seconds);
                let track = ctx
                    .retry()
                    .run(self.name(), || gateway.generate_background_music(seconds, prompt, &work_dir))
                    .await?;
                let stage: fn(&mut VideoMetadata) = mark_generated_music;
                (track, stage)
            }
            MusicSource::DefaultTrack(track) => {
                info!("🎵 Applying default background music {}", track.display());
                let stage: fn(&mut VideoMetadata) = VideoMetadata::mark_bg_music_applied;
                (track.clone(), stage)
            }
        };

        let target = ctx.next_artifact_path(video, stage)?;
        ctx.toolkit()
            .merge_audio(&media, &track, AudioMix::Background, &target)
            .await?;

        ctx.commit(video, stage, target);
        Ok(())
    }
}

/// Reads the prompt text aloud over the video
pub struct ReadAloudHandler {
    text: String,
}

impl ReadAloudHandler {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

#[async_trait]
impl BuildHandler for ReadAloudHandler {
    fn name(&self) -> &str {
        "read_aloud"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_prompt_read_aloud()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        let work_dir = ctx.ensure_work_dir().await?;
        let gateway = ctx.gateway();

        info!("🗣️ Synthesizing prompt narration");
        let speech = ctx
            .retry()
            .run(self.name(), || gateway.generate_speech(&self.text, &work_dir))
            .await?;

        let target = ctx.next_artifact_path(video, VideoMetadata::mark_prompt_read_aloud)?;
        ctx.toolkit()
            .merge_audio(&media, &speech, AudioMix::Voice, &target)
            .await?;

        ctx.commit(video, VideoMetadata::mark_prompt_read_aloud, target);
        Ok(())
    }
}
