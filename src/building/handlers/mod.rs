//! Build stages

mod audio;
mod composite;
mod generation;
mod interpolation;
mod reencoding;
mod subtitles;

pub use audio::{BackgroundMusicHandler, MusicSource, PromptAudioHandler, ReadAloudHandler};
pub use composite::{ChildrenBuildHandler, ConcatenationHandler};
pub use generation::{TransitionHandler, VideoGenerationHandler};
pub use interpolation::InterpolationHandler;
pub use reencoding::ReencodingHandler;
pub use subtitles::{SubtitlesHandler, SUBTITLE_EXTENSION};
