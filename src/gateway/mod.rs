//! Generation gateway
//!
//! The gateway is the boundary to the generation providers: video models,
//! transition and interpolation models, music and speech synthesis,
//! transcription and keyword extraction. Build handlers only see the
//! [`GenerationGateway`] trait; every call goes through the build's
//! [`RetryPolicy`].

pub mod fake;
pub mod retry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BuildSettings;
use crate::error::{ConfigError, Result};
use crate::prompt::Subtitle;

pub use fake::FakeGateway;
pub use retry::RetryPolicy;

/// What a video model is asked to animate
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationInput {
    /// Free text
    Text(String),
    /// An image, optionally guided by text
    Image { path: PathBuf, text: Option<String> },
}

impl GenerationInput {
    /// Short description used in logs and placeholder media
    pub fn describe(&self) -> String {
        match self {
            GenerationInput::Text(text) => text.clone(),
            GenerationInput::Image { path, text } => match text {
                Some(text) => format!("{} ({})", text, path.display()),
                None => path.display().to_string(),
            },
        }
    }
}

/// Keywords extracted from a prompt, with a title summarizing them
#[derive(Debug, Clone, PartialEq)]
pub struct PromptKeywords {
    pub keywords: Vec<String>,
    pub title: String,
}

/// Access to the generation providers
///
/// File-producing operations write into `work_dir` and return the path of
/// the new file. Names chosen by the gateway are temporary: handlers move
/// the result to a name reflecting the video state.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Name recorded as the build source of every video built through it
    fn name(&self) -> &str;

    /// Whether generated clips must be reencoded before they can be stitched
    fn requires_reencoding(&self) -> bool {
        true
    }

    /// Generate a clip from text or an image with the given model
    async fn generate_video(
        &self,
        input: &GenerationInput,
        model_provider: &str,
        work_dir: &Path,
    ) -> Result<PathBuf>;

    /// Generate a clip morphing the end of `from` into the start of `to`
    async fn generate_transition(&self, from: &Path, to: &Path, work_dir: &Path) -> Result<PathBuf>;

    /// Raise the frame rate of a clip
    async fn interpolate(&self, media: &Path, work_dir: &Path) -> Result<PathBuf>;

    /// Compose a music track of at least `duration_secs` seconds
    async fn generate_background_music(
        &self,
        duration_secs: u32,
        prompt: &str,
        work_dir: &Path,
    ) -> Result<PathBuf>;

    /// Synthesize speech reading `text`
    async fn generate_speech(&self, text: &str, work_dir: &Path) -> Result<PathBuf>;

    /// Transcribe an audio file into timed subtitles
    async fn get_subtitles(&self, audio: &Path) -> Result<Vec<Subtitle>>;

    /// Extract visual keywords from a prompt, ignoring `excluded_words`
    async fn get_keywords_from_prompt(
        &self,
        prompt: &str,
        excluded_words: &[String],
    ) -> Result<PromptKeywords>;
}

/// Select the gateway a build should use
///
/// Remote providers are not bundled with the library: outside test mode a
/// gateway has to be injected with
/// [`LocalEngine::with_services`](crate::composition::LocalEngine::with_services).
pub fn gateway_for(settings: &BuildSettings) -> Result<Arc<dyn GenerationGateway>> {
    if settings.test_mode {
        return Ok(Arc::new(FakeGateway::new()));
    }

    Err(ConfigError::MissingKey {
        key: "gateway (test_mode is off and no remote gateway was provided)".to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_fake_gateway_in_test_mode() {
        let settings = BuildSettings::default();
        let gateway = gateway_for(&settings).unwrap();
        assert_eq!(gateway.name(), "FakeGateway");
        assert!(!gateway.requires_reencoding());
    }

    #[test]
    fn test_no_gateway_outside_test_mode() {
        let mut settings = BuildSettings::default();
        settings.test_mode = false;
        let err = gateway_for(&settings).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_describe_input() {
        let input = GenerationInput::Image {
            path: PathBuf::from("cat.png"),
            text: Some("a cat".to_string()),
        };
        assert_eq!(input.describe(), "a cat (cat.png)");
    }
}
