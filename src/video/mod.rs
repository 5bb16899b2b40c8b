//! # Video Module
//!
//! The video entity, its variants and composite trees, the metadata that
//! tracks build stages, and the file name codec naming every artifact.

pub mod composite;
pub mod file_name;
pub mod metadata;
pub mod model;
pub mod types;

pub use composite::CompositeVideo;
pub use file_name::{MusicFeature, PromptAudioFeature, VideoFeatures, VideoFileName};
pub use metadata::{VideoMetadata, DEFAULT_VIDEO_TITLE};
pub use model::{title_from_description, Video, VideoKind};
pub use types::{BuildPhase, VideoType};
