use async_trait::async_trait;
use tracing::debug;

use crate::building::{current_media, BuildContext, BuildHandler};
use crate::error::Result;
use crate::video::{Video, VideoMetadata};

/// Reencodes a generated clip so it can be stitched with others
pub struct ReencodingHandler;

#[async_trait]
impl BuildHandler for ReencodingHandler {
    fn name(&self) -> &str {
        "reencoding"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_reencoded()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        ctx.ensure_work_dir().await?;
        let target = ctx.next_artifact_path(video, VideoMetadata::mark_reencoded)?;

        debug!("Reencoding {} with {}", media.display(), ctx.toolkit().name());
        ctx.toolkit().reencode(&media, &target).await?;

        ctx.commit(video, VideoMetadata::mark_reencoded, target);
        Ok(())
    }
}
