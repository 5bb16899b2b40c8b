use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::building::{pipeline, BuildContext, BuildHandler};
use crate::config::BuildSettings;
use crate::error::{CompositorError, Result, StageError, VideoError};
use crate::prompt::Prompt;
use crate::video::composite::CompositeVideo;
use crate::video::file_name::{VideoFeatures, VideoFileName, DEFAULT_EXTENSION};
use crate::video::metadata::{VideoMetadata, DEFAULT_VIDEO_TITLE};
use crate::video::types::{BuildPhase, VideoType};

/// Title of every transition clip
pub const TRANSITION_TITLE: &str = "transition";

/// Video generated from raw prompt text
#[derive(Debug, Clone)]
pub struct RawTextVideo {
    text: String,
}

impl RawTextVideo {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Video generated from a prompt, through keywords extracted by the gateway
#[derive(Debug, Clone)]
pub struct PromptBasedVideo {
    prompt: Prompt,
    keywords: Option<Vec<String>>,
    suggested_title: Option<String>,
}

impl PromptBasedVideo {
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.keywords.as_deref()
    }
}

/// Video generated from an image
#[derive(Debug, Clone)]
pub struct RawImageVideo {
    image: PathBuf,
    text: Option<String>,
}

impl RawImageVideo {
    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Pre-existing media file
#[derive(Debug, Clone)]
pub struct ImportedVideo {
    source: PathBuf,
}

impl ImportedVideo {
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Clip bridging the two videos around it in a composite
///
/// Neighbors are bound by the owning composite once they are built.
#[derive(Debug, Clone, Default)]
pub struct TransitionVideo {
    neighbors: Option<(PathBuf, PathBuf)>,
}

impl TransitionVideo {
    pub fn neighbors(&self) -> Option<(&Path, &Path)> {
        self.neighbors
            .as_ref()
            .map(|(from, to)| (from.as_path(), to.as_path()))
    }
}

/// The closed set of video variants
#[derive(Debug, Clone)]
pub enum VideoKind {
    RawText(RawTextVideo),
    PromptBased(PromptBasedVideo),
    RawImage(RawImageVideo),
    Imported(ImportedVideo),
    Transition(TransitionVideo),
    Composite(CompositeVideo),
}

/// A buildable video
///
/// Every variant shares the same capabilities: a handler chain, a file name
/// reflecting its state, and the lifecycle hooks run by
/// [`LocalEngine`](crate::composition::LocalEngine).
#[derive(Debug, Clone)]
pub struct Video {
    kind: VideoKind,
    metadata: VideoMetadata,
    media_url: Option<PathBuf>,
    settings: Option<Arc<BuildSettings>>,
    settings_prepared: bool,
    source: Option<String>,
    source_requires_reencoding: bool,
    phase: BuildPhase,
    last_completed_stage: Option<String>,
}

impl Video {
    fn from_kind(kind: VideoKind) -> Self {
        Self {
            kind,
            metadata: VideoMetadata::default(),
            media_url: None,
            settings: None,
            settings_prepared: false,
            source: None,
            source_requires_reencoding: false,
            phase: BuildPhase::NotStarted,
            last_completed_stage: None,
        }
    }

    /// Video generated from raw text; the text must not be blank
    pub fn raw_text<S: Into<String>>(text: S) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CompositorError::invalid_argument("raw text prompt is empty"));
        }

        Ok(Self::from_kind(VideoKind::RawText(RawTextVideo { text })))
    }

    /// Video generated from a prompt with text or subtitles
    pub fn prompt_based(prompt: Prompt) -> Result<Self> {
        if !prompt.has_text() && prompt.subtitles.is_empty() {
            return Err(CompositorError::invalid_argument(
                "prompt has neither text nor subtitles",
            ));
        }

        Ok(Self::from_kind(VideoKind::PromptBased(PromptBasedVideo {
            prompt,
            keywords: None,
            suggested_title: None,
        })))
    }

    /// Video generated from an image, checked when the build starts
    pub fn raw_image<P: Into<PathBuf>>(image: P, text: Option<String>) -> Result<Self> {
        let image = image.into();
        if image.as_os_str().is_empty() {
            return Err(CompositorError::invalid_argument("image path is empty"));
        }

        let text = text.filter(|t| !t.trim().is_empty());
        Ok(Self::from_kind(VideoKind::RawImage(RawImageVideo { image, text })))
    }

    /// Video wrapping an existing media file
    pub fn imported<P: Into<PathBuf>>(source: P) -> Result<Self> {
        let source = source.into();
        if source.as_os_str().is_empty() {
            return Err(CompositorError::invalid_argument("imported video path is empty"));
        }

        let mut video = Self::from_kind(VideoKind::Imported(ImportedVideo {
            source: source.clone(),
        }));
        video.media_url = Some(source);
        Ok(video)
    }

    /// Transition between the two videos around it in a composite
    pub fn transition() -> Self {
        let mut video = Self::from_kind(VideoKind::Transition(TransitionVideo::default()));
        video.metadata.set_title(TRANSITION_TITLE);
        video
    }

    /// Root of a composite tree
    pub fn composite() -> Self {
        Self::from_kind(VideoKind::Composite(CompositeVideo::new(true)))
    }

    /// Composite meant to be nested in another composite
    pub fn composite_child() -> Self {
        Self::from_kind(VideoKind::Composite(CompositeVideo::new(false)))
    }

    pub fn kind(&self) -> &VideoKind {
        &self.kind
    }

    pub fn video_type(&self) -> VideoType {
        match &self.kind {
            VideoKind::RawText(_) => VideoType::RawText,
            VideoKind::PromptBased(_) => VideoType::PromptBased,
            VideoKind::RawImage(_) => VideoType::RawImage,
            VideoKind::Imported(_) => VideoType::Imported,
            VideoKind::Transition(_) => VideoType::Transition,
            VideoKind::Composite(c) if c.is_root() => VideoType::CompRoot,
            VideoKind::Composite(_) => VideoType::CompChild,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.metadata.id()
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut VideoMetadata {
        &mut self.metadata
    }

    pub fn media_url(&self) -> Option<&Path> {
        self.media_url.as_deref()
    }

    pub fn set_media_url<P: Into<PathBuf>>(&mut self, media_url: P) {
        self.media_url = Some(media_url.into());
    }

    pub fn is_built(&self) -> bool {
        self.metadata.is_video_built()
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Settings attached when the build prepared this video
    pub fn settings(&self) -> Option<&BuildSettings> {
        self.settings.as_deref()
    }

    pub fn settings_prepared(&self) -> bool {
        self.settings_prepared
    }

    /// Name of the gateway the video was generated through
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Last handler that completed, kept across failed builds
    pub fn last_completed_stage(&self) -> Option<&str> {
        self.last_completed_stage.as_deref()
    }

    /// Not owned by a composite
    pub fn is_top_level(&self) -> bool {
        !self.metadata.is_subvideo()
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.kind, VideoKind::Transition(_))
    }

    pub fn as_composite(&self) -> Option<&CompositeVideo> {
        match &self.kind {
            VideoKind::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn as_composite_mut(&mut self) -> Option<&mut CompositeVideo> {
        match &mut self.kind {
            VideoKind::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Prompt this video was created from, if any
    pub fn prompt(&self) -> Option<&Prompt> {
        match &self.kind {
            VideoKind::PromptBased(p) => Some(&p.prompt),
            _ => None,
        }
    }

    /// Text describing this video's content, if it has one
    pub fn prompt_text(&self) -> Option<String> {
        match &self.kind {
            VideoKind::RawText(v) => Some(v.text.clone()),
            VideoKind::PromptBased(v) => Some(v.prompt.full_text()),
            VideoKind::RawImage(v) => v.text.clone(),
            _ => None,
        }
    }

    /// Current title, derived from the variant's content
    pub fn title(&self) -> String {
        match &self.kind {
            VideoKind::RawText(v) => title_from_description(&v.text),
            VideoKind::PromptBased(v) => match (&v.suggested_title, &v.prompt.title) {
                (Some(title), _) | (None, Some(title)) => sanitize_title(title),
                (None, None) => title_from_description(&v.prompt.full_text()),
            },
            VideoKind::RawImage(v) => match &v.text {
                Some(text) => title_from_description(text),
                None => sanitize_title(&file_stem(&v.image)),
            },
            VideoKind::Imported(v) => sanitize_title(&file_stem(&v.source)),
            VideoKind::Transition(_) => TRANSITION_TITLE.to_string(),
            VideoKind::Composite(c) => c.derived_title(),
        }
    }

    fn extension(&self) -> String {
        match &self.kind {
            VideoKind::Imported(v) => v
                .source
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            _ => DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Features already applied to this video
    pub fn features(&self) -> VideoFeatures {
        VideoFeatures::from_metadata(&self.metadata)
    }

    /// File name reflecting the current state, with a fresh unique id
    ///
    /// Uses `settings` when given, else the settings attached by the build.
    pub fn file_name_by_state(&self, settings: Option<&BuildSettings>) -> Result<String> {
        let settings = settings.or(self.settings()).ok_or_else(|| {
            CompositorError::invalid_argument("no build settings to name the video by")
        })?;

        self.file_name_for(&self.metadata, settings)
    }

    /// File name the video will have once `stage` is marked on it
    pub(crate) fn file_name_after(
        &self,
        settings: &BuildSettings,
        stage: fn(&mut VideoMetadata),
    ) -> Result<String> {
        let mut metadata = self.metadata.clone();
        stage(&mut metadata);
        self.file_name_for(&metadata, settings)
    }

    fn file_name_for(&self, metadata: &VideoMetadata, settings: &BuildSettings) -> Result<String> {
        let name = VideoFileName::new(
            &self.title(),
            self.video_type(),
            &VideoFeatures::from_metadata(metadata).fingerprint(),
            settings.stamp(),
            &self.extension(),
        )?;
        Ok(name.to_string())
    }

    /// Ordered handlers that build this video under `settings`
    pub fn handler_chain(&self, settings: &BuildSettings) -> Vec<Box<dyn BuildHandler>> {
        pipeline::handler_chain(self, settings)
    }

    /// Whether generated clips need reencoding before they can be stitched
    pub fn needs_reencoding(&self) -> bool {
        self.source_requires_reencoding
            && matches!(
                self.kind,
                VideoKind::RawText(_)
                    | VideoKind::PromptBased(_)
                    | VideoKind::RawImage(_)
                    | VideoKind::Transition(_)
            )
    }

    /// Add a child at the end of a composite
    pub fn add_video(&mut self, child: Video) -> Result<&mut Self> {
        self.insert_child(child, false)
    }

    /// Same as [`Video::add_video`]
    pub fn append(&mut self, child: Video) -> Result<&mut Self> {
        self.insert_child(child, false)
    }

    /// Add a child at the start of a composite
    pub fn prepend(&mut self, child: Video) -> Result<&mut Self> {
        self.insert_child(child, true)
    }

    fn insert_child(&mut self, mut child: Video, front: bool) -> Result<&mut Self> {
        if self.is_built() {
            return Err(CompositorError::invalid_argument(
                "cannot add videos to a built composite",
            ));
        }
        if child.video_type() == VideoType::CompRoot {
            return Err(CompositorError::invalid_argument(
                "a root composite cannot be nested; use Video::composite_child",
            ));
        }

        let composite = self.as_composite_mut().ok_or_else(|| {
            CompositorError::invalid_argument("only composite videos have children")
        })?;

        child.metadata.mark_subvideo();
        if front {
            composite.push_front(child);
        } else {
            composite.push_back(child);
        }
        Ok(self)
    }

    /// Children of a composite in tree order, empty for other variants
    pub fn children(&self) -> impl Iterator<Item = &Video> + '_ {
        self.as_composite().into_iter().flat_map(|c| c.children())
    }

    pub(crate) fn bind_transition(&mut self, from: PathBuf, to: PathBuf) -> Result<()> {
        match &mut self.kind {
            VideoKind::Transition(t) => {
                t.neighbors = Some((from, to));
                Ok(())
            }
            _ => Err(CompositorError::invalid_argument("only transitions have neighbors")),
        }
    }

    pub(crate) fn restart_phases(&mut self) {
        self.phase = BuildPhase::NotStarted;
    }

    pub(crate) fn advance(&mut self, to: BuildPhase) -> Result<()> {
        if self.phase.next() != Some(to) {
            return Err(VideoError::IllegalPhase {
                id: self.id().to_string(),
                from: self.phase.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        trace!(video = %self.id(), from = %self.phase, to = %to, "phase transition");
        self.phase = to;
        Ok(())
    }

    pub(crate) fn record_stage(&mut self, stage: &str) {
        self.last_completed_stage = Some(stage.to_string());
    }

    pub(crate) fn mark_built(&mut self) {
        self.metadata.mark_video_built();
    }

    /// Attach the shared settings and record the generation source, once
    pub(crate) fn prepare_build(
        &mut self,
        settings: Arc<BuildSettings>,
        source: &str,
        requires_reencoding: bool,
    ) {
        if self.settings_prepared {
            return;
        }

        self.settings = Some(settings);
        self.source = Some(source.to_string());
        self.source_requires_reencoding = requires_reencoding;
        self.settings_prepared = true;
    }

    /// Validate inputs that can only be checked once the build starts
    pub(crate) async fn pre_build_hook(&mut self, _ctx: &BuildContext) -> Result<()> {
        match &self.kind {
            VideoKind::Composite(c) => c.validate_layout(),
            VideoKind::Imported(v) => {
                if !tokio::fs::try_exists(&v.source).await.unwrap_or(false) {
                    return Err(CompositorError::invalid_argument(format!(
                        "imported video {} does not exist",
                        v.source.display()
                    )));
                }
                Ok(())
            }
            VideoKind::RawImage(v) => {
                let (width, height) = image::image_dimensions(&v.image).map_err(|e| {
                    CompositorError::invalid_argument(format!(
                        "unreadable image {}: {}",
                        v.image.display(),
                        e
                    ))
                })?;
                self.metadata.set_dimensions(width, height);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Variant-specific work before the handlers run
    pub(crate) async fn run_core_build_logic(&mut self, ctx: &BuildContext) -> Result<()> {
        match &mut self.kind {
            VideoKind::PromptBased(v) if v.keywords.is_none() => {
                let text = v.prompt.full_text();
                let excluded: Vec<String> = Vec::new();
                let gateway = ctx.gateway();
                let extracted = ctx
                    .retry()
                    .run("keyword_extraction", || gateway.get_keywords_from_prompt(&text, &excluded))
                    .await?;

                debug!("🔑 Keywords for {}: {:?}", self.metadata.id(), extracted.keywords);
                v.keywords = Some(extracted.keywords);
                v.suggested_title = Some(extracted.title);
            }
            _ => {}
        }

        let title = self.title();
        self.metadata.set_title(title);
        Ok(())
    }

    /// Check the handlers left the video consistent
    pub(crate) async fn post_build_hook(&mut self, _ctx: &BuildContext) -> Result<()> {
        if let VideoKind::Composite(c) = &self.kind {
            if let Some(child) = c.children().find(|child| !child.is_built()) {
                return Err(StageError::Failed {
                    stage: "children_build".to_string(),
                    reason: format!("child {} was not built", child.id()),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Title from the first and last meaningful words of a description
pub fn title_from_description(description: &str) -> String {
    // Words carrying '_' are dropped
    let words: Vec<String> = description
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect::<String>())
        .filter(|w| !w.is_empty() && !w.contains('_'))
        .collect();

    match words.as_slice() {
        [] => description
            .split_whitespace()
            .next()
            .map(sanitize_title)
            .unwrap_or_else(|| DEFAULT_VIDEO_TITLE.to_string()),
        [only] => only.clone(),
        [first, .., last] => format!("{}-{}", first, last),
    }
}

/// Make free text usable as a file name title
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches(|c: char| c == '-' || c.is_whitespace());
    if cleaned.is_empty() {
        DEFAULT_VIDEO_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
