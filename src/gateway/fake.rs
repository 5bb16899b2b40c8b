use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{GenerationGateway, GenerationInput, PromptKeywords};
use crate::error::Result;
use crate::media::placeholder::{clip_line, CLIP_SECONDS};
use crate::prompt::Subtitle;
use crate::video::metadata::DEFAULT_VIDEO_TITLE;

const MAX_KEYWORDS: usize = 5;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "are", "was", "were", "into", "onto",
    "over", "under", "then", "than", "have", "has", "had", "its", "their", "they",
];

/// Offline gateway producing small placeholder files
///
/// Every clip it generates is a text file understood by
/// [`PlaceholderToolkit`](crate::media::PlaceholderToolkit), so whole builds
/// can run without providers or ffmpeg.
#[derive(Debug, Default, Clone)]
pub struct FakeGateway;

impl FakeGateway {
    pub fn new() -> Self {
        Self
    }

    async fn write(&self, work_dir: &Path, prefix: &str, extension: &str, content: String) -> Result<PathBuf> {
        tokio::fs::create_dir_all(work_dir).await?;
        let path = work_dir.join(format!("{}_{}.{}", prefix, Uuid::new_v4(), extension));
        tokio::fs::write(&path, content).await?;
        debug!("🧪 Fake gateway wrote {}", path.display());
        Ok(path)
    }
}

#[async_trait]
impl GenerationGateway for FakeGateway {
    fn name(&self) -> &str {
        "FakeGateway"
    }

    fn requires_reencoding(&self) -> bool {
        false
    }

    async fn generate_video(
        &self,
        input: &GenerationInput,
        model_provider: &str,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let description = format!("{} [{}]", input.describe(), model_provider);
        self.write(work_dir, "fake_video", "mp4", clip_line(&description)).await
    }

    async fn generate_transition(&self, from: &Path, to: &Path, work_dir: &Path) -> Result<PathBuf> {
        let description = format!(
            "transition {} -> {}",
            from.file_name().unwrap_or_default().to_string_lossy(),
            to.file_name().unwrap_or_default().to_string_lossy()
        );
        self.write(work_dir, "fake_transition", "mp4", clip_line(&description)).await
    }

    async fn interpolate(&self, media: &Path, work_dir: &Path) -> Result<PathBuf> {
        let content = tokio::fs::read_to_string(media).await?;
        self.write(work_dir, "fake_interpolated", "mp4", content).await
    }

    async fn generate_background_music(
        &self,
        duration_secs: u32,
        prompt: &str,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let content = format!("music: {} ({}s)\n", prompt, duration_secs);
        self.write(work_dir, "fake_music", "mp3", content).await
    }

    async fn generate_speech(&self, text: &str, work_dir: &Path) -> Result<PathBuf> {
        self.write(work_dir, "fake_speech", "mp3", format!("speech: {}\n", text)).await
    }

    async fn get_subtitles(&self, audio: &Path) -> Result<Vec<Subtitle>> {
        let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
        Ok(vec![Subtitle::new(0.0, CLIP_SECONDS, format!("transcript of {}", stem))])
    }

    async fn get_keywords_from_prompt(
        &self,
        prompt: &str,
        excluded_words: &[String],
    ) -> Result<PromptKeywords> {
        let mut keywords: Vec<String> = Vec::new();

        for word in prompt.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();

            if word.len() < 3
                || STOP_WORDS.contains(&word.as_str())
                || excluded_words.iter().any(|e| e.eq_ignore_ascii_case(&word))
                || keywords.contains(&word)
            {
                continue;
            }

            keywords.push(word);
            if keywords.len() == MAX_KEYWORDS {
                break;
            }
        }

        let title = if keywords.is_empty() {
            DEFAULT_VIDEO_TITLE.to_string()
        } else {
            keywords.iter().take(2).cloned().collect::<Vec<_>>().join("-")
        };

        Ok(PromptKeywords { keywords, title })
    }
}
