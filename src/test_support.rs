//! Helpers shared by the in-crate tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::composition::LocalEngine;
use crate::config::BuildSettings;
use crate::error::{CompositorError, Result};
use crate::gateway::{FakeGateway, GenerationGateway, GenerationInput, PromptKeywords, RetryPolicy};
use crate::media::PlaceholderToolkit;
use crate::prompt::Subtitle;

/// Fake gateway that records its calls and fails on demand
#[derive(Default)]
pub struct RecordingGateway {
    inner: FakeGateway,
    requires_reencoding: bool,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, usize>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring_reencoding() -> Self {
        Self {
            requires_reencoding: true,
            ..Self::default()
        }
    }

    /// Make the next `times` calls to `operation` fail
    pub fn fail(&self, operation: &'static str, times: usize) {
        self.failures.lock().unwrap().insert(operation, times);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| **c == operation).count()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(operation);

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(CompositorError::stage(operation, "injected failure"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl GenerationGateway for RecordingGateway {
    fn name(&self) -> &str {
        "RecordingGateway"
    }

    fn requires_reencoding(&self) -> bool {
        self.requires_reencoding
    }

    async fn generate_video(
        &self,
        input: &GenerationInput,
        model_provider: &str,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        self.record("generate_video")?;
        self.inner.generate_video(input, model_provider, work_dir).await
    }

    async fn generate_transition(&self, from: &Path, to: &Path, work_dir: &Path) -> Result<PathBuf> {
        self.record("generate_transition")?;
        self.inner.generate_transition(from, to, work_dir).await
    }

    async fn interpolate(&self, media: &Path, work_dir: &Path) -> Result<PathBuf> {
        self.record("interpolate")?;
        self.inner.interpolate(media, work_dir).await
    }

    async fn generate_background_music(
        &self,
        duration_secs: u32,
        prompt: &str,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        self.record("generate_background_music")?;
        self.inner.generate_background_music(duration_secs, prompt, work_dir).await
    }

    async fn generate_speech(&self, text: &str, work_dir: &Path) -> Result<PathBuf> {
        self.record("generate_speech")?;
        self.inner.generate_speech(text, work_dir).await
    }

    async fn get_subtitles(&self, audio: &Path) -> Result<Vec<Subtitle>> {
        self.record("get_subtitles")?;
        self.inner.get_subtitles(audio).await
    }

    async fn get_keywords_from_prompt(
        &self,
        prompt: &str,
        excluded_words: &[String],
    ) -> Result<PromptKeywords> {
        self.record("get_keywords_from_prompt")?;
        self.inner.get_keywords_from_prompt(prompt, excluded_words).await
    }
}

/// Test-mode settings writing into `dir`, with a fixed stamp and no retry delay
pub fn settings_in(dir: &Path) -> BuildSettings {
    let mut settings = BuildSettings::default()
        .with_build_stamp(
            "1234567890",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveTime::from_hms_opt(23, 4, 42).unwrap(),
        )
        .with_output_path(dir);
    settings.retry = RetryPolicy::immediate(2);
    settings
}

/// Engine over a recording gateway and the placeholder toolkit
pub fn engine_with(settings: BuildSettings, gateway: Arc<RecordingGateway>) -> LocalEngine {
    LocalEngine::with_services(settings, gateway, Arc::new(PlaceholderToolkit::new())).unwrap()
}

/// File names in a directory, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
