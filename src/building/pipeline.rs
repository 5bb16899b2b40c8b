use std::path::PathBuf;

use crate::building::handlers::{
    BackgroundMusicHandler, ChildrenBuildHandler, ConcatenationHandler, InterpolationHandler,
    PromptAudioHandler, ReadAloudHandler, ReencodingHandler, SubtitlesHandler, TransitionHandler,
    VideoGenerationHandler,
};
use crate::building::BuildHandler;
use crate::config::BuildSettings;
use crate::prompt::Subtitle;
use crate::video::{Video, VideoKind};

/// Assemble the ordered handlers building `video` under `settings`
///
/// Generated videos get generation, then interpolation and reencoding when
/// they apply. Composites build their children and stitch them. Videos not
/// owned by a composite then get the audio and subtitle stages enabled in
/// the settings. Stages whose toggle is off are left out.
pub fn handler_chain(video: &Video, settings: &BuildSettings) -> Vec<Box<dyn BuildHandler>> {
    let mut chain: Vec<Box<dyn BuildHandler>> = Vec::new();

    match video.kind() {
        VideoKind::RawText(_) | VideoKind::PromptBased(_) | VideoKind::RawImage(_) => {
            chain.push(Box::new(VideoGenerationHandler));
            if settings.interpolate {
                chain.push(Box::new(InterpolationHandler));
            }
            if video.needs_reencoding() {
                chain.push(Box::new(ReencodingHandler));
            }
        }
        VideoKind::Transition(_) => {
            chain.push(Box::new(TransitionHandler));
            if video.needs_reencoding() {
                chain.push(Box::new(ReencodingHandler));
            }
        }
        VideoKind::Composite(_) => {
            chain.push(Box::new(ChildrenBuildHandler));
            chain.push(Box::new(ConcatenationHandler));
        }
        VideoKind::Imported(_) => {}
    }

    if video.is_top_level() && !video.is_transition() {
        chain.extend(post_processing(video, settings));
    }

    chain
}

fn post_processing(video: &Video, settings: &BuildSettings) -> Vec<Box<dyn BuildHandler>> {
    let mut chain: Vec<Box<dyn BuildHandler>> = Vec::new();
    let music = &settings.music_building_context;
    let recording = prompt_recording(video, settings);

    if music.use_recorded_prompt_as_audio {
        if let Some(recording) = &recording {
            chain.push(Box::new(PromptAudioHandler::new(recording.clone())));
        }
    }

    if music.apply_background_music {
        if music.generate_background_music {
            let prompt = prompt_text(video, settings).unwrap_or_else(|| video.title());
            chain.push(Box::new(BackgroundMusicHandler::generated(prompt)));
        } else if let Some(track) = &music.default_background_music {
            chain.push(Box::new(BackgroundMusicHandler::default_track(track.clone())));
        }
    }

    if settings.include_read_aloud_prompt {
        if let Some(text) = prompt_text(video, settings) {
            chain.push(Box::new(ReadAloudHandler::new(text)));
        }
    }

    if settings.include_audio_subtitles {
        let subtitles = prompt_subtitles(video, settings);
        if recording.is_some() || !subtitles.is_empty() {
            chain.push(Box::new(SubtitlesHandler::new(recording, subtitles)));
        }
    }

    chain
}

/// Recorded prompt audio, from the build prompt or the video's own
fn prompt_recording(video: &Video, settings: &BuildSettings) -> Option<PathBuf> {
    settings
        .prompt
        .as_ref()
        .and_then(|p| p.audio_recording.clone())
        .or_else(|| video.prompt().and_then(|p| p.audio_recording.clone()))
}

fn prompt_text(video: &Video, settings: &BuildSettings) -> Option<String> {
    settings
        .prompt_text()
        .map(str::to_string)
        .or_else(|| video.prompt_text())
        .filter(|t| !t.trim().is_empty())
}

fn prompt_subtitles(video: &Video, settings: &BuildSettings) -> Vec<Subtitle> {
    settings
        .prompt
        .as_ref()
        .map(|p| p.subtitles.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| video.prompt().map(|p| p.subtitles.clone()))
        .unwrap_or_default()
}
