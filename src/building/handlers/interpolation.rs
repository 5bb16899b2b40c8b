use async_trait::async_trait;
use tracing::debug;

use crate::building::{current_media, BuildContext, BuildHandler};
use crate::error::Result;
use crate::video::{Video, VideoMetadata};

/// Raises the frame rate of the generated clip through the gateway
pub struct InterpolationHandler;

#[async_trait]
impl BuildHandler for InterpolationHandler {
    fn name(&self) -> &str {
        "interpolation"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_interpolated()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let media = current_media(video)?;
        let work_dir = ctx.ensure_work_dir().await?;
        let gateway = ctx.gateway();

        debug!("Interpolating {}", media.display());
        let produced = ctx
            .retry()
            .run(self.name(), || gateway.interpolate(&media, &work_dir))
            .await?;

        ctx.adopt(video, &produced, VideoMetadata::mark_interpolated).await
    }
}
