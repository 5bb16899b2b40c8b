use rand::Rng;
use uuid::Uuid;

/// Title used until a video can derive a better one
pub const DEFAULT_VIDEO_TITLE: &str = "no-title-yet";

/// Record of what has been done to a video so far
///
/// Stage flags only move from unset to set: each has a `mark_*` setter and
/// no way back, so the file name fingerprint of a video never loses a stage
/// during a build.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    id: Uuid,

    /// Short id used when mixing several videos in one directory
    temp_id: u16,

    title: String,

    /// Duration in seconds, known once the media is materialized
    duration: f64,

    width: u32,
    height: u32,

    is_video_built: bool,
    is_video_generated: bool,
    is_interpolated: bool,
    is_reencoded: bool,
    is_bg_music_applied: bool,
    is_bg_music_generated: bool,
    is_prompt_read_aloud: bool,
    is_prompt_audio_used: bool,
    is_subtitled: bool,

    /// Owned by a composite video
    is_subvideo: bool,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self::new(512, 320)
    }
}

impl VideoMetadata {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            temp_id: rand::thread_rng().gen(),
            title: DEFAULT_VIDEO_TITLE.to_string(),
            duration: 0.0,
            width,
            height,
            is_video_built: false,
            is_video_generated: false,
            is_interpolated: false,
            is_reencoded: false,
            is_bg_music_applied: false,
            is_bg_music_generated: false,
            is_prompt_read_aloud: false,
            is_prompt_audio_used: false,
            is_subtitled: false,
            is_subvideo: false,
        }
    }

    /// Metadata with a preset title
    pub fn with_title<S: Into<String>>(title: S) -> Self {
        let mut metadata = Self::default();
        metadata.set_title(title);
        metadata
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn temp_id(&self) -> u16 {
        self.temp_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn is_video_built(&self) -> bool {
        self.is_video_built
    }

    pub fn is_video_generated(&self) -> bool {
        self.is_video_generated
    }

    pub fn is_interpolated(&self) -> bool {
        self.is_interpolated
    }

    pub fn is_reencoded(&self) -> bool {
        self.is_reencoded
    }

    pub fn is_bg_music_applied(&self) -> bool {
        self.is_bg_music_applied
    }

    pub fn is_bg_music_generated(&self) -> bool {
        self.is_bg_music_generated
    }

    pub fn is_prompt_read_aloud(&self) -> bool {
        self.is_prompt_read_aloud
    }

    pub fn is_prompt_audio_used(&self) -> bool {
        self.is_prompt_audio_used
    }

    pub fn is_subtitled(&self) -> bool {
        self.is_subtitled
    }

    pub fn is_subvideo(&self) -> bool {
        self.is_subvideo
    }

    pub fn mark_video_built(&mut self) {
        self.is_video_built = true;
    }

    pub fn mark_video_generated(&mut self) {
        self.is_video_generated = true;
    }

    pub fn mark_interpolated(&mut self) {
        self.is_interpolated = true;
    }

    pub fn mark_reencoded(&mut self) {
        self.is_reencoded = true;
    }

    pub fn mark_bg_music_applied(&mut self) {
        self.is_bg_music_applied = true;
    }

    pub fn mark_bg_music_generated(&mut self) {
        self.is_bg_music_generated = true;
    }

    pub fn mark_prompt_read_aloud(&mut self) {
        self.is_prompt_read_aloud = true;
    }

    pub fn mark_prompt_audio_used(&mut self) {
        self.is_prompt_audio_used = true;
    }

    pub fn mark_subtitled(&mut self) {
        self.is_subtitled = true;
    }

    pub(crate) fn mark_subvideo(&mut self) {
        self.is_subvideo = true;
    }

    /// Stage flags in a fixed order, for comparing progress snapshots
    pub fn stage_flags(&self) -> [bool; 9] {
        [
            self.is_video_built,
            self.is_video_generated,
            self.is_interpolated,
            self.is_reencoded,
            self.is_bg_music_applied,
            self.is_bg_music_generated,
            self.is_prompt_read_aloud,
            self.is_prompt_audio_used,
            self.is_subtitled,
        ]
    }
}
