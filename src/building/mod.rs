//! # Building
//!
//! A video is built by running its handler chain: an ordered list of
//! [`BuildHandler`]s, each performing one stage (generation, interpolation,
//! stitching, audio...). The chain for a video is assembled by
//! [`pipeline::handler_chain`] from its variant and the build settings.

pub mod context;
pub mod handlers;
pub mod pipeline;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Result, VideoError};
use crate::video::Video;

pub use context::BuildContext;
pub use pipeline::handler_chain;

/// One stage of a video build
#[async_trait]
pub trait BuildHandler: Send + Sync {
    /// Returns the stage name, used in logs and errors
    fn name(&self) -> &str;

    /// Whether the stage already ran on this video
    ///
    /// Handlers reporting `true` are skipped, which lets a failed build
    /// resume at the first stage that did not complete.
    fn is_done(&self, video: &Video) -> bool;

    /// Whether the video must carry media once the stage completes
    ///
    /// Only stages that delegate their output to later ones return `false`.
    fn produces_media(&self) -> bool {
        true
    }

    /// Run the stage
    ///
    /// # Arguments
    ///
    /// * `video` - The video to advance; the handler raises its stage flag
    ///   and points it at the new artifact
    /// * `ctx` - Settings and collaborators shared by the whole build
    async fn execute(&self, video: &mut Video, ctx: &BuildContext) -> Result<()>;
}

/// Media the video currently points at, required by most stages
pub(crate) fn current_media(video: &Video) -> Result<PathBuf> {
    video
        .media_url()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| {
            VideoError::MissingMedia {
                id: video.id().to_string(),
            }
            .into()
        })
}
