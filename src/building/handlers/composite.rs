use async_trait::async_trait;
use tracing::{info, warn};

use crate::building::{BuildContext, BuildHandler};
use crate::composition::LocalEngine;
use crate::error::{CompositorError, Result};
use crate::video::{Video, VideoMetadata};

/// Builds every child of a composite, in tree order
///
/// Regular children are built first; each transition is built afterwards,
/// once the media of both its neighbors exists.
pub struct ChildrenBuildHandler;

#[async_trait]
impl BuildHandler for ChildrenBuildHandler {
    fn name(&self) -> &str {
        "children_build"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.children().all(|c| c.is_built())
    }

    fn produces_media(&self) -> bool {
        false
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let engine = LocalEngine::from_context(ctx.clone());
        let composite = video
            .as_composite_mut()
            .ok_or_else(|| CompositorError::stage("children_build", "not a composite video"))?;

        info!("🧩 Building {} child videos", composite.len());

        for child in composite.children_mut().filter(|c| !c.is_transition()) {
            engine.generate(child).await?;
        }

        for index in 0..composite.len() {
            let pending = composite
                .children()
                .nth(index)
                .map(|c| c.is_transition() && !c.is_built())
                .unwrap_or(false);
            if !pending {
                continue;
            }

            let (from, to) = composite.transition_neighbors(index)?;
            if let Some(transition) = composite.child_mut(index) {
                transition.bind_transition(from, to)?;
                engine.generate(transition).await?;
            }
        }

        Ok(())
    }
}

/// Stitches the children media into the composite's own clip
pub struct ConcatenationHandler;

#[async_trait]
impl BuildHandler for ConcatenationHandler {
    fn name(&self) -> &str {
        "concatenation"
    }

    fn is_done(&self, video: &Video) -> bool {
        video.metadata().is_video_generated()
    }

    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()> {
        let composite = video
            .as_composite()
            .ok_or_else(|| CompositorError::stage(self.name(), "not a composite video"))?;

        let inputs = composite.children_media();
        if inputs.len() < composite.len() {
            warn!(
                "{} of {} children have no media and are left out",
                composite.len() - inputs.len(),
                composite.len()
            );
        }
        if inputs.is_empty() {
            return Err(CompositorError::stage(self.name(), "no child media to stitch"));
        }

        ctx.ensure_work_dir().await?;
        let target = ctx.next_artifact_path(video, VideoMetadata::mark_video_generated)?;

        info!("🎞️ Stitching {} clips with {}", inputs.len(), ctx.toolkit().name());
        ctx.toolkit().concatenate(&inputs, &target).await?;

        ctx.commit(video, VideoMetadata::mark_video_generated, target);
        Ok(())
    }
}
