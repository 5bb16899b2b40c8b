use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    building::{handlers::SUBTITLE_EXTENSION, BuildContext},
    config::BuildSettings,
    error::{Result, StageError, VideoError},
    gateway::{gateway_for, GenerationGateway},
    media::{toolkit_for, MediaToolkit},
    video::{BuildPhase, Video},
};

/// Orchestrator that drives videos through their build lifecycle
///
/// Every build follows the same phases:
/// 1. Pre-build hook - Validate inputs only checkable at build time
/// 2. Settings preparation - Attach the shared settings, once per video
/// 3. Core logic - Variant-specific work such as keyword extraction
/// 4. Handlers - Run the video's handler chain in order
/// 5. Post-build hook - Check the handlers left the video consistent
/// 6. Materialization - Copy the artifact into the target directory
pub struct LocalEngine {
    ctx: BuildContext,
}

impl LocalEngine {
    /// Create an engine with the collaborators implied by `settings`
    ///
    /// The build stamp is resolved here, so every video of the build shares
    /// it even when `settings` was cloned from an unresolved instance.
    pub fn new(settings: BuildSettings) -> Result<Self> {
        let gateway = gateway_for(&settings)?;
        let toolkit = toolkit_for(&settings);
        Self::with_services(settings, gateway, toolkit)
    }

    /// Create an engine with an explicit gateway and media toolkit
    pub fn with_services(
        settings: BuildSettings,
        gateway: Arc<dyn GenerationGateway>,
        toolkit: Arc<dyn MediaToolkit>,
    ) -> Result<Self> {
        settings.validate()?;
        settings.stamp();

        Ok(Self::from_context(BuildContext::new(
            Arc::new(settings),
            gateway,
            toolkit,
        )))
    }

    pub fn from_context(ctx: BuildContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Build a video in place
    ///
    /// A built video is left untouched. On failure the video keeps the
    /// stage flags it reached and stays unbuilt, so building it again
    /// resumes at the first stage that did not complete.
    pub async fn generate(&self, video: &mut Video) -> Result<()> {
        if video.is_built() {
            debug!("Video {} is already built", video.id());
            return Ok(());
        }

        video.restart_phases();
        info!("🎬 Building {} video {}", video.video_type(), video.id());

        video.pre_build_hook(&self.ctx).await?;
        video.advance(BuildPhase::PreBuildHookRun)?;

        video.prepare_build(
            Arc::clone(self.ctx.settings()),
            self.ctx.gateway().name(),
            self.ctx.gateway().requires_reencoding(),
        );
        video.advance(BuildPhase::SettingsPrepared)?;

        video.run_core_build_logic(&self.ctx).await?;
        video.advance(BuildPhase::CoreLogicRun)?;

        self.run_handlers(video).await?;
        video.advance(BuildPhase::HandlersRun)?;

        video.post_build_hook(&self.ctx).await?;
        video.advance(BuildPhase::PostBuildHookRun)?;

        self.materialize(video).await?;
        video.advance(BuildPhase::Materialized)?;

        video.mark_built();
        video.advance(BuildPhase::Built)?;

        match video.media_url() {
            Some(media) => info!("🎉 Built '{}' -> {}", video.title(), media.display()),
            None => info!("🎉 Built '{}' without media", video.title()),
        }
        Ok(())
    }

    // ==========================================
    // HANDLERS
    // ==========================================

    async fn run_handlers(&self, video: &mut Video) -> Result<()> {
        let chain = video.handler_chain(self.ctx.settings());

        if chain.is_empty() {
            let condition = VideoError::MissingHandlerChain {
                video_type: video.video_type().to_string(),
            };
            warn!("⚠️ {}; treating video {} as built", condition, video.id());
            return Ok(());
        }

        debug!(
            "Handler chain for {}: {:?}",
            video.id(),
            chain.iter().map(|h| h.name()).collect::<Vec<_>>()
        );

        for handler in &chain {
            if handler.is_done(video) {
                debug!("Skipping completed stage {}", handler.name());
                continue;
            }

            debug!("▶️ Running stage {} on {}", handler.name(), video.id());
            handler.execute(video, &self.ctx).await?;

            if handler.produces_media() && video.media_url().is_none() {
                return Err(StageError::NoMediaProduced {
                    stage: handler.name().to_string(),
                }
                .into());
            }
            video.record_stage(handler.name());
        }

        Ok(())
    }

    // ==========================================
    // MATERIALIZATION
    // ==========================================

    /// Copy the artifact into the materialization directory
    async fn materialize(&self, video: &mut Video) -> Result<()> {
        let title = video.title();
        video.metadata_mut().set_title(title);

        let Some(media) = video.media_url().map(Path::to_path_buf) else {
            warn!("Video {} has no media to materialize", video.id());
            return Ok(());
        };

        let settings: &BuildSettings = self.ctx.settings();
        let dir = settings.materialization_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let target = dir.join(video.file_name_by_state(Some(settings))?);
        let named = settings
            .output_video_file_name
            .as_ref()
            .filter(|_| video.is_top_level())
            .map(|name| dir.join(name));

        let (location, duration) = match self.place_artifact(&media, &target, named.as_deref()).await {
            Ok(placed) => placed,
            Err(e) => {
                warn!("Materialization of {} failed, removing partial output", video.id());
                discard_with_sidecar(&target).await;
                return Err(e);
            }
        };

        video.set_media_url(&location);
        video.metadata_mut().set_duration(duration);

        debug!("Materialized {} ({:.1}s)", location.display(), duration);
        Ok(())
    }

    /// Copy `media` to `target`, then to `named` when given
    ///
    /// Returns the final location and its duration.
    async fn place_artifact(
        &self,
        media: &Path,
        target: &Path,
        named: Option<&Path>,
    ) -> Result<(PathBuf, f64)> {
        copy_with_sidecar(media, target).await?;
        let duration = self.ctx.toolkit().probe_duration(target).await?;

        match named {
            Some(named) => match copy_with_sidecar(target, named).await {
                Ok(()) => Ok((named.to_path_buf(), duration)),
                Err(e) => {
                    discard_with_sidecar(named).await;
                    Err(e)
                }
            },
            None => Ok((target.to_path_buf(), duration)),
        }
    }
}

/// Best-effort removal of a media file and its subtitle sidecar
async fn discard_with_sidecar(path: &Path) {
    for file in [path.to_path_buf(), path.with_extension(SUBTITLE_EXTENSION)] {
        if tokio::fs::metadata(&file).await.map(|m| m.is_file()).unwrap_or(false) {
            let _ = tokio::fs::remove_file(&file).await;
        }
    }
}

/// Copy a media file along with its subtitle sidecar, if any
async fn copy_with_sidecar(from: &Path, to: &Path) -> Result<()> {
    if from != to {
        tokio::fs::copy(from, to).await?;
    }

    let sidecar: PathBuf = from.with_extension(SUBTITLE_EXTENSION);
    if tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
        let target = to.with_extension(SUBTITLE_EXTENSION);
        if sidecar != target {
            tokio::fs::copy(&sidecar, &target).await?;
        }
    }

    Ok(())
}

impl Video {
    /// Build this video with `settings`
    ///
    /// Returns the same video, built. Building a built video does nothing.
    pub async fn build(&mut self, settings: &BuildSettings) -> Result<&mut Self> {
        // Resolve the stamp before cloning so the caller's copy agrees with it
        settings.stamp();
        let engine = LocalEngine::new(settings.clone())?;
        engine.generate(self).await?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::prompt::Prompt;
    use crate::test_support::{engine_with, file_names, settings_in, RecordingGateway};
    use crate::video::{VideoFileName, VideoType};
    use tempfile::tempdir;

    fn parsed_media_name(video: &Video) -> VideoFileName {
        let name = video.media_url().unwrap().file_name().unwrap().to_string_lossy().to_string();
        VideoFileName::parse(&name).unwrap()
    }

    #[tokio::test]
    async fn test_build_raw_text_video() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());

        let mut video = Video::raw_text("This is a prompt text").unwrap();
        video.build(&settings).await.unwrap();

        assert!(video.is_built());
        assert_eq!(video.phase(), BuildPhase::Built);
        assert_eq!(video.source(), Some("FakeGateway"));
        assert_eq!(video.last_completed_stage(), Some("video_generation"));
        assert_eq!(video.metadata().title(), "This-text");

        let media = video.media_url().unwrap();
        assert!(media.exists());
        assert_eq!(media.parent(), Some(dir.path()));

        let name = parsed_media_name(&video);
        assert_eq!(name.video_type(), VideoType::RawText);
        assert_eq!(name.features(), "ooooo");
        assert_eq!(name.build_id(), settings.id());
        assert_eq!(video.metadata().duration(), 2.0);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let dir = tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine_with(settings_in(dir.path()), gateway.clone());

        let mut video = Video::raw_text("a lighthouse in the storm").unwrap();
        engine.generate(&mut video).await.unwrap();
        let media = video.media_url().map(Path::to_path_buf);
        let calls = gateway.calls();
        let files = file_names(dir.path());

        engine.generate(&mut video).await.unwrap();

        assert_eq!(video.media_url().map(Path::to_path_buf), media);
        assert_eq!(gateway.calls(), calls);
        assert_eq!(file_names(dir.path()), files);
        assert_eq!(gateway.count("generate_video"), 1);
    }

    #[tokio::test]
    async fn test_output_video_file_name() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path()).with_output_file_name("my_video.mp4");

        let mut video = Video::raw_text("This is a prompt text").unwrap();
        video.build(&settings).await.unwrap();

        let named = dir.path().join("my_video.mp4");
        assert!(named.exists());
        assert_eq!(video.media_url(), Some(named.as_path()));
    }

    #[tokio::test]
    async fn test_target_dir() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path()).with_target_dir("testdir");

        let mut video = Video::raw_text("This is a prompt text").unwrap();
        video.build(&settings).await.unwrap();

        let target = dir.path().join("testdir");
        assert!(target.is_dir());
        assert_eq!(video.media_url().unwrap().parent(), Some(target.as_path()));
        assert_eq!(file_names(&target).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_output_copy_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path())
            .with_target_dir("final")
            .with_output_file_name("taken");
        let target = dir.path().join("final");
        std::fs::create_dir_all(target.join("taken")).unwrap();

        let mut video = Video::raw_text("a sea").unwrap();
        assert!(video.build(&settings).await.is_err());

        assert!(!video.is_built());
        assert!(file_names(&target).is_empty());
        assert_ne!(video.media_url().unwrap().parent(), Some(target.as_path()));

        std::fs::remove_dir(target.join("taken")).unwrap();
        video.build(&settings).await.unwrap();

        assert!(video.is_built());
        assert_eq!(video.media_url(), Some(target.join("taken").as_path()));
        assert_eq!(file_names(&target).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_stage_propagates_and_resumes() {
        let dir = tempdir().unwrap();
        let mut settings = settings_in(dir.path()).with_target_dir("final");
        settings.interpolate = true;

        let gateway = Arc::new(RecordingGateway::new());
        gateway.fail("interpolate", 2);
        let engine = engine_with(settings, gateway.clone());

        let mut video = Video::raw_text("a lighthouse in the storm").unwrap();
        let err = engine.generate(&mut video).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StageFailure);
        assert!(matches!(err, crate::error::CompositorError::Stage(StageError::RetriesExhausted { .. })));
        assert!(!video.is_built());
        assert!(video.metadata().is_video_generated());
        assert!(!video.metadata().is_interpolated());
        assert_eq!(video.last_completed_stage(), Some("video_generation"));
        assert!(file_names(&dir.path().join("final")).is_empty());

        engine.generate(&mut video).await.unwrap();

        assert!(video.is_built());
        assert_eq!(gateway.count("generate_video"), 1);
        assert_eq!(gateway.count("interpolate"), 3);
        assert_eq!(parsed_media_name(&video).features(), "oooio");
        assert_eq!(file_names(&dir.path().join("final")).len(), 1);
    }

    #[tokio::test]
    async fn test_reencoding_when_source_requires_it() {
        let dir = tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::requiring_reencoding());
        let engine = engine_with(settings_in(dir.path()), gateway);

        let mut video = Video::raw_text("a red kite").unwrap();
        engine.generate(&mut video).await.unwrap();

        assert!(video.metadata().is_reencoded());
        assert_eq!(video.source(), Some("RecordingGateway"));
        assert_eq!(parsed_media_name(&video).features(), "ooroo");
    }

    #[tokio::test]
    async fn test_composite_builds_transitions_after_neighbors() {
        let dir = tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine_with(settings_in(dir.path()), gateway.clone());

        let mut root = Video::composite();
        root.add_video(Video::raw_text("first sunrise").unwrap()).unwrap();
        root.add_video(Video::transition()).unwrap();
        root.add_video(Video::raw_text("second sunset").unwrap()).unwrap();

        engine.generate(&mut root).await.unwrap();

        assert_eq!(
            gateway.calls(),
            vec!["generate_video", "generate_video", "generate_transition"]
        );
        assert!(root.children().all(|c| c.is_built()));

        let content = std::fs::read_to_string(root.media_url().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("first sunrise"));
        assert!(lines[1].starts_with("clip: transition"));
        assert!(lines[2].contains("second sunset"));

        let name = parsed_media_name(&root);
        assert_eq!(name.video_type(), VideoType::CompRoot);
        assert_eq!(name.title(), "first-sunrise-second-sunset");
        assert_eq!(root.metadata().duration(), 6.0);
    }

    #[tokio::test]
    async fn test_nested_composite() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());

        let mut inner = Video::composite_child();
        inner.add_video(Video::raw_text("inner one").unwrap()).unwrap();
        inner.add_video(Video::raw_text("inner two").unwrap()).unwrap();

        let mut root = Video::composite();
        root.add_video(Video::raw_text("opening shot").unwrap()).unwrap();
        root.add_video(inner).unwrap();

        root.build(&settings).await.unwrap();

        let content = std::fs::read_to_string(root.media_url().unwrap()).unwrap();
        assert_eq!(content.lines().count(), 3);
        let nested = root.children().nth(1).unwrap();
        assert_eq!(nested.video_type(), VideoType::CompChild);
        assert!(nested.is_built());
    }

    #[tokio::test]
    async fn test_empty_composite_fails() {
        let dir = tempdir().unwrap();
        let mut root = Video::composite();

        let err = root.build(&settings_in(dir.path())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!root.is_built());
    }

    #[tokio::test]
    async fn test_imported_video_without_handlers() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("holiday.mp4");
        std::fs::write(&source, "clip: holiday\n").unwrap();

        let settings = settings_in(dir.path()).with_target_dir("out");
        let mut video = Video::imported(&source).unwrap();
        video.build(&settings).await.unwrap();

        assert!(video.is_built());
        assert_eq!(video.last_completed_stage(), None);
        let name = parsed_media_name(&video);
        assert_eq!(name.video_type(), VideoType::Imported);
        assert_eq!(name.title(), "holiday");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_import_fails() {
        let dir = tempdir().unwrap();
        let mut video = Video::imported(dir.path().join("missing.mp4")).unwrap();

        let err = video.build(&settings_in(dir.path())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_post_processing_on_top_level_video() {
        let dir = tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.include_read_aloud_prompt = true;
        settings.include_audio_subtitles = true;
        settings.music_building_context.apply_background_music = true;
        settings.music_building_context.generate_background_music = true;
        settings.prompt = Some(Prompt::recorded(dir.path().join("prompt.wav")));

        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine_with(settings, gateway.clone());

        let mut video = Video::raw_text("waves on the shore").unwrap();
        engine.generate(&mut video).await.unwrap();

        assert_eq!(
            gateway.calls(),
            vec![
                "generate_video",
                "generate_background_music",
                "generate_speech",
                "get_subtitles"
            ]
        );
        assert_eq!(parsed_media_name(&video).features(), "gvoos");

        let media = video.media_url().unwrap();
        let sidecar = media.with_extension("srt");
        assert!(sidecar.exists());
        assert!(std::fs::read_to_string(sidecar).unwrap().contains("transcript of prompt"));
    }

    #[tokio::test]
    async fn test_prompt_based_title_from_keywords() {
        let dir = tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let engine = engine_with(settings_in(dir.path()), gateway.clone());

        let prompt = Prompt::from_text("A lonely lighthouse under heavy rain").unwrap();
        let mut video = Video::prompt_based(prompt).unwrap();
        engine.generate(&mut video).await.unwrap();

        assert_eq!(gateway.calls(), vec!["get_keywords_from_prompt", "generate_video"]);
        assert_eq!(video.title(), "lonely-lighthouse");
        assert_eq!(parsed_media_name(&video).video_type(), VideoType::PromptBased);
    }

    #[tokio::test]
    async fn test_raw_image_dimensions() {
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("cat.png");
        image::RgbImage::new(8, 4).save(&image_path).unwrap();

        let mut video = Video::raw_image(&image_path, None).unwrap();
        video.build(&settings_in(dir.path())).await.unwrap();

        assert_eq!((video.metadata().width(), video.metadata().height()), (8, 4));
        assert_eq!(parsed_media_name(&video).title(), "cat");
    }

    #[tokio::test]
    async fn test_no_gateway_outside_test_mode() {
        let mut settings = BuildSettings::default();
        settings.test_mode = false;
        let err = LocalEngine::new(settings).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
