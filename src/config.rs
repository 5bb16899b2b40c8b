use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    gateway::RetryPolicy,
    prompt::Prompt,
};

/// Model provider used when none is configured
pub const DEFAULT_MODEL_PROVIDER: &str = "stabilityai";

/// The (id, date, time) triple embedded in every file name of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStamp {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl BuildStamp {
    pub fn new<S: Into<String>>(id: S, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            id: id.into(),
            date,
            time: whole_seconds(time),
        }
    }

    /// Fresh stamp from the local clock, with a random 10-digit id
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        let id: u64 = rand::thread_rng().gen_range(1_000_000_000..10_000_000_000);

        Self {
            id: id.to_string(),
            date: now.date(),
            time: whole_seconds(now.time()),
        }
    }
}

/// File names only carry whole seconds
fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// Build configuration shared by the engine and every video of a tree
///
/// The build stamp is resolved lazily on first access and stays fixed for
/// the lifetime of the instance. Values pinned through the config file or
/// [`BuildSettings::with_build_stamp`] take precedence over generated ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Pinned build id (must not contain `_`)
    build_id: Option<String>,

    /// Pinned build date
    build_date: Option<NaiveDate>,

    /// Pinned build time
    build_time: Option<NaiveTime>,

    #[serde(skip)]
    stamp: OnceLock<BuildStamp>,

    /// Directory where intermediate artifacts are written
    pub output_path: Option<PathBuf>,

    /// Directory where built videos are materialized (defaults to `output_path`)
    pub target_dir_path: Option<PathBuf>,

    /// Final file name of the top-level video, overriding the computed one
    pub output_video_file_name: Option<String>,

    /// Run frame interpolation on generated clips
    pub interpolate: bool,

    /// Read the prompt text aloud over the final video
    pub include_read_aloud_prompt: bool,

    /// Transcribe the prompt audio track into a subtitle sidecar
    pub include_audio_subtitles: bool,

    /// Use the local fake gateway instead of remote providers
    pub test_mode: bool,

    /// Video model the gateway should use for generation
    pub model_provider: String,

    /// Background music settings
    pub music_building_context: MusicBuildingContext,

    /// Retry policy wrapped around every gateway call
    pub retry: RetryPolicy,

    /// Prompt the whole build was started from, if any
    pub prompt: Option<Prompt>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            build_id: None,
            build_date: None,
            build_time: None,
            stamp: OnceLock::new(),
            output_path: None,
            target_dir_path: None,
            output_video_file_name: None,
            interpolate: false,
            include_read_aloud_prompt: false,
            include_audio_subtitles: false,
            test_mode: true,
            model_provider: DEFAULT_MODEL_PROVIDER.to_string(),
            music_building_context: MusicBuildingContext::default(),
            retry: RetryPolicy::default(),
            prompt: None,
        }
    }
}

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let settings: BuildSettings = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a TOML file, including the resolved build stamp
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let stamp = self.stamp().clone();
        let mut pinned = self.clone();
        pinned.build_id = Some(stamp.id);
        pinned.build_date = Some(stamp.date);
        pinned.build_time = Some(stamp.time);

        let content = toml::to_string_pretty(&pinned)
            .map_err(|e| ConfigError::InvalidValue {
                key: "settings".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if let Some(id) = &self.build_id {
            if id.is_empty() || id.contains('_') {
                return Err(ConfigError::InvalidValue {
                    key: "build_id".to_string(),
                    value: id.clone(),
                }.into());
            }
        }

        if let Some(name) = &self.output_video_file_name {
            if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
                return Err(ConfigError::InvalidValue {
                    key: "output_video_file_name".to_string(),
                    value: name.clone(),
                }.into());
            }
        }

        self.retry.validate()?;
        self.music_building_context.validate()?;
        Ok(())
    }

    /// Pin the build stamp; must be called before the settings are shared
    pub fn with_build_stamp<S: Into<String>>(mut self, id: S, date: NaiveDate, time: NaiveTime) -> Self {
        self.build_id = Some(id.into());
        self.build_date = Some(date);
        self.build_time = Some(whole_seconds(time));
        self.stamp = OnceLock::new();
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_target_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.target_dir_path = Some(path.into());
        self
    }

    pub fn with_output_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.output_video_file_name = Some(name.into());
        self
    }

    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// The build stamp, resolved on first access
    pub fn stamp(&self) -> &BuildStamp {
        self.stamp.get_or_init(|| {
            let fresh = BuildStamp::now();
            BuildStamp {
                id: self.build_id.clone().unwrap_or(fresh.id),
                date: self.build_date.unwrap_or(fresh.date),
                time: self.build_time.map(whole_seconds).unwrap_or(fresh.time),
            }
        })
    }

    pub fn id(&self) -> &str {
        &self.stamp().id
    }

    pub fn build_date(&self) -> NaiveDate {
        self.stamp().date
    }

    pub fn build_time(&self) -> NaiveTime {
        self.stamp().time
    }

    /// Directory for intermediate artifacts
    pub fn work_dir(&self) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Directory where built videos are materialized
    ///
    /// A relative `target_dir_path` is resolved against the work directory.
    pub fn materialization_dir(&self) -> PathBuf {
        match &self.target_dir_path {
            Some(target) if target.is_absolute() => target.clone(),
            Some(target) => self.work_dir().join(target),
            None => self.work_dir(),
        }
    }

    /// Text read aloud or used to prompt music when the build has a prompt
    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt
            .as_ref()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Background music configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBuildingContext {
    /// Add a background music track to the top-level video
    pub apply_background_music: bool,

    /// Generate the music track instead of using the default one
    pub generate_background_music: bool,

    /// Use the recorded prompt audio as the soundtrack
    pub use_recorded_prompt_as_audio: bool,

    /// Track applied when music is not generated
    pub default_background_music: Option<PathBuf>,
}

impl MusicBuildingContext {
    fn validate(&self) -> Result<()> {
        if self.apply_background_music
            && !self.generate_background_music
            && self.default_background_music.is_none()
        {
            return Err(ConfigError::MissingKey {
                key: "music_building_context.default_background_music".to_string(),
            }.into());
        }

        Ok(())
    }
}
