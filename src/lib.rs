//! # Prompt-Compositor
//!
//! Assemble short videos from text, image and audio prompts by chaining
//! generative-media providers.
//!
//! A [`Video`] is built by running its handler chain (generation,
//! interpolation, reencoding, stitching, music, narration, subtitles)
//! through a [`LocalEngine`]. Composite videos own an ordered tree of
//! children and stitch them together. Every artifact is named after the
//! state of the video that produced it, so a file name alone tells which
//! stages were applied and which build it came from.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prompt_compositor::{BuildSettings, Video};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let settings = BuildSettings::default().with_output_path("renders/");
//!
//! let mut root = Video::composite();
//! root.add_video(Video::raw_text("A lighthouse in a storm")?)?;
//! root.add_video(Video::transition())?;
//! root.add_video(Video::raw_text("Calm sea at dawn")?)?;
//!
//! root.build(&settings).await?;
//! println!("{:?}", root.media_url());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Video variants, composite trees, metadata and file names
//! - [`building`] - Build handlers and handler chain assembly
//! - [`composition`] - The build orchestrator
//! - [`gateway`] - Generation providers and retry policy
//! - [`media`] - Local media transforms (ffmpeg or placeholders)
//! - [`config`] - Build settings
//!
//! ## Custom Gateways
//!
//! Remote providers plug in by implementing
//! [`GenerationGateway`](gateway::GenerationGateway) and passing it to
//! [`LocalEngine::with_services`].

pub mod building;
pub mod composition;
pub mod config;
pub mod error;
pub mod gateway;
pub mod media;
pub mod prompt;
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use crate::{
    composition::LocalEngine,
    config::BuildSettings,
    error::{CompositorError, Result},
    prompt::Prompt,
    video::{Video, VideoFileName, VideoType},
};
