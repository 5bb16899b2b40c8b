use async_trait::async_trait;
use tracing::info;

use crate::building::{BuildContext, BuildHandler};
use crate::error::{CompositorError, Result};
use crate::gateway::GenerationInput;
use crate::video::{Video, VideoKind, VideoMetadata};

/// Generates the clip of a raw-text, prompt-based or raw-image video
pub struct VideoGenerationHandler;

impl VideoGenerationHandler {
    fn input_for(&self, video: &Video) -> Result<GenerationInput> {
        match video.kind() {
            VideoKind::RawText(v) => Ok(GenerationInput::Text(v.text().to_string())),
            VideoKind::PromptBased(v) => {
                let text = match v.keywords() {
                    Some(keywords) if !keywords.is_empty() => keywords.join(", "),
                    _ => v.prompt().full_text(),
                };
                Ok(GenerationInput::Text(text))
            }
            VideoKind::RawImage(v) => Ok(GenerationInput::Image {
                path: v.image().to_path_buf(),
                text: v.text().map(str::to_string),
            }),
            _ => Err(CompositorError::stage(
                self.name(),
                format!("{} videos are not generated from a prompt", video.video_type()),
            )),
        }
    }
}

#[async_trait]
impl BuildHandler for VideoGenerationHandler {
    fn name(&self) -> &str {
        "video_generation"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_video_generated()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let input = self.input_for(video)?;
        let work_dir = ctx.ensure_work_dir().await?;
        let model = ctx.settings().model_provider.clone();
        let gateway = ctx.gateway();

        info!("🎥 Generating '{}' with {}", video.title(), model);
        let produced = ctx
            .retry()
            .run(self.name(), || gateway.generate_video(&input, &model, &work_dir))
            .await?;

        ctx.adopt(video, &produced, VideoMetadata::mark_video_generated).await
    }
}

/// Generates a transition clip from its two bound neighbors
pub struct TransitionHandler;

#[async_trait]
impl BuildHandler for TransitionHandler {
    fn name(&self) -> &str {
        "transition_generation"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_video_generated()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let (from, to) = match video.kind() {
            VideoKind::Transition(t) => t
                .neighbors()
                .map(|(from, to)| (from.to_path_buf(), to.to_path_buf()))
                .ok_or_else(|| CompositorError::stage(self.name(), "transition neighbors are not bound"))?,
            _ => return Err(CompositorError::stage(self.name(), "not a transition")),
        };

        let work_dir = ctx.ensure_work_dir().await?;
        let gateway = ctx.gateway();

        info!("🔀 Generating transition {} -> {}", from.display(), to.display());
        let produced = ctx
            .retry()
            .run(self.name(), || gateway.generate_transition(&from, &to, &work_dir))
            .await?;

        ctx.adopt(video, &produced, VideoMetadata::mark_video_generated).await
    }
}
