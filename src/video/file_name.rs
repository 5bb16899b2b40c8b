//! # Video file names
//!
//! Every artifact written during a build is named after the state of the
//! video that produced it:
//!
//! ```text
//! {title}_{type}_{features}_{build_id}_{YYYY-MM-DD}_{HH:MM:SS}_UID_{uuid}.{ext}
//! ```
//!
//! The five-letter `features` fingerprint encodes which stages were applied,
//! one position per stage group:
//!
//! | pos | stage               | letters                                  |
//! |-----|---------------------|------------------------------------------|
//! | 0   | background music    | `o` none, `d` default track, `g` generated |
//! | 1   | prompt audio        | `o` none, `v` read aloud, `u` recording used |
//! | 2   | reencoding          | `o` / `r`                                |
//! | 3   | interpolation       | `o` / `i`                                |
//! | 4   | subtitles           | `o` / `s`                                |
//!
//! Names are parsed back with [`VideoFileName::parse`], which only checks the
//! shape of the fingerprint; [`VideoFeatures::from_fingerprint`] decodes it.

use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use uuid::Uuid;

use crate::config::BuildStamp;
use crate::error::{FileNameError, Result};
use crate::video::metadata::VideoMetadata;
use crate::video::types::VideoType;

/// Number of letters in the feature fingerprint
pub const FEATURES_WIDTH: usize = 5;

/// Marker placed right before the unique id
pub const UID_MARKER: &str = "UID";

/// Extension given to generated media
pub const DEFAULT_EXTENSION: &str = "mp4";

const NO_FEATURE: char = 'o';

fn file_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<title>.+)_(?P<video_type>[a-z]+)_(?P<features>[a-z]{5})_",
            r"(?P<build_id>[^_]+)_(?P<date>\d{4}-\d{2}-\d{2})_",
            r"(?P<time>\d{2}:\d{2}(?::\d{2})?)_UID_",
            r"(?P<uid>[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
            r"\.(?P<ext>[A-Za-z0-9]+)$"
        ))
        .expect("video file name pattern is valid")
    })
}

/// Background music stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MusicFeature {
    #[default]
    None,
    Default,
    Generated,
}

/// Prompt audio stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptAudioFeature {
    #[default]
    None,
    ReadAloud,
    Recorded,
}

/// Decoded form of the five-letter fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoFeatures {
    pub music: MusicFeature,
    pub prompt_audio: PromptAudioFeature,
    pub reencoded: bool,
    pub interpolated: bool,
    pub subtitled: bool,
}

impl VideoFeatures {
    /// Features reflected by the stage flags of a video
    ///
    /// A read-aloud prompt takes precedence over a recording in position 1.
    pub fn from_metadata(metadata: &VideoMetadata) -> Self {
        let music = if !metadata.is_bg_music_applied() {
            MusicFeature::None
        } else if metadata.is_bg_music_generated() {
            MusicFeature::Generated
        } else {
            MusicFeature::Default
        };

        let prompt_audio = if metadata.is_prompt_read_aloud() {
            PromptAudioFeature::ReadAloud
        } else if metadata.is_prompt_audio_used() {
            PromptAudioFeature::Recorded
        } else {
            PromptAudioFeature::None
        };

        Self {
            music,
            prompt_audio,
            reencoded: metadata.is_reencoded(),
            interpolated: metadata.is_interpolated(),
            subtitled: metadata.is_subtitled(),
        }
    }

    pub fn fingerprint(&self) -> String {
        let music = match self.music {
            MusicFeature::None => NO_FEATURE,
            MusicFeature::Default => 'd',
            MusicFeature::Generated => 'g',
        };
        let prompt_audio = match self.prompt_audio {
            PromptAudioFeature::None => NO_FEATURE,
            PromptAudioFeature::ReadAloud => 'v',
            PromptAudioFeature::Recorded => 'u',
        };
        let flag = |set: bool, letter: char| if set { letter } else { NO_FEATURE };

        [
            music,
            prompt_audio,
            flag(self.reencoded, 'r'),
            flag(self.interpolated, 'i'),
            flag(self.subtitled, 's'),
        ]
        .iter()
        .collect()
    }

    /// Strict decode of a fingerprint
    pub fn from_fingerprint(fingerprint: &str) -> Result<Self> {
        let letters: Vec<char> = fingerprint.chars().collect();
        if letters.len() != FEATURES_WIDTH {
            return Err(invalid_fingerprint(fingerprint, "wrong length"));
        }

        let music = match letters[0] {
            'o' => MusicFeature::None,
            'd' => MusicFeature::Default,
            'g' => MusicFeature::Generated,
            _ => return Err(invalid_fingerprint(fingerprint, "bad music letter")),
        };
        let prompt_audio = match letters[1] {
            'o' => PromptAudioFeature::None,
            'v' => PromptAudioFeature::ReadAloud,
            'u' => PromptAudioFeature::Recorded,
            _ => return Err(invalid_fingerprint(fingerprint, "bad prompt audio letter")),
        };
        let flag = |letter: char, expected: char| match letter {
            'o' => Ok(false),
            c if c == expected => Ok(true),
            _ => Err(invalid_fingerprint(fingerprint, "bad stage letter")),
        };

        Ok(Self {
            music,
            prompt_audio,
            reencoded: flag(letters[2], 'r')?,
            interpolated: flag(letters[3], 'i')?,
            subtitled: flag(letters[4], 's')?,
        })
    }
}

impl fmt::Display for VideoFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

fn invalid_fingerprint(fingerprint: &str, reason: &str) -> crate::error::CompositorError {
    FileNameError::InvalidArgument {
        details: format!("fingerprint '{}': {}", fingerprint, reason),
    }
    .into()
}

/// A parsed or freshly composed video file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileName {
    title: String,
    video_type: VideoType,
    features: String,
    build_id: String,
    build_date: NaiveDate,
    build_time: NaiveTime,
    unique_id: Uuid,
    extension: String,
}

impl VideoFileName {
    /// Compose a file name with a fresh unique id
    pub fn new(
        title: &str,
        video_type: VideoType,
        features: &str,
        stamp: &BuildStamp,
        extension: &str,
    ) -> Result<Self> {
        Self::with_unique_id(title, video_type, features, stamp, Uuid::new_v4(), extension)
    }

    /// Compose a file name with a given unique id
    pub fn with_unique_id(
        title: &str,
        video_type: VideoType,
        features: &str,
        stamp: &BuildStamp,
        unique_id: Uuid,
        extension: &str,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(invalid("title is empty"));
        }
        if title.contains(['/', '\\']) {
            return Err(invalid(format!("title '{}' contains a path separator", title)));
        }
        if title.chars().any(char::is_control) {
            return Err(invalid(format!("title {:?} contains a control character", title)));
        }

        if features.len() != FEATURES_WIDTH || !features.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(invalid(format!(
                "features '{}' must be {} lowercase letters",
                features, FEATURES_WIDTH
            )));
        }

        if stamp.id.is_empty() || stamp.id.contains('_') || stamp.id.chars().any(char::is_control) {
            return Err(invalid(format!("build id '{}' must be non-empty without '_'", stamp.id)));
        }

        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid(format!("extension '{}' is not alphanumeric", extension)));
        }

        Ok(Self {
            title: title.to_string(),
            video_type,
            features: features.to_string(),
            build_id: stamp.id.clone(),
            build_date: stamp.date,
            build_time: stamp.time,
            unique_id,
            extension: extension.to_string(),
        })
    }

    /// File name reflecting the current state of a video
    pub fn from_state(
        metadata: &VideoMetadata,
        video_type: VideoType,
        stamp: &BuildStamp,
    ) -> Result<Self> {
        let features = VideoFeatures::from_metadata(metadata).fingerprint();
        Self::new(metadata.title(), video_type, &features, stamp, DEFAULT_EXTENSION)
    }

    /// Parse a file name, without any directory component
    pub fn parse(name: &str) -> Result<Self> {
        let caps = file_name_regex()
            .captures(name)
            .ok_or_else(|| malformed(name, "does not match the video file name pattern"))?;

        let video_type = caps["video_type"]
            .parse::<VideoType>()
            .map_err(|e| malformed(name, e))?;

        let build_date = NaiveDate::parse_from_str(&caps["date"], "%Y-%m-%d")
            .map_err(|e| malformed(name, format!("bad date: {}", e)))?;

        let time = &caps["time"];
        let build_time = NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|e| malformed(name, format!("bad time: {}", e)))?;

        let unique_id =
            Uuid::parse_str(&caps["uid"]).map_err(|e| malformed(name, format!("bad uid: {}", e)))?;

        Ok(Self {
            title: caps["title"].to_string(),
            video_type,
            features: caps["features"].to_string(),
            build_id: caps["build_id"].to_string(),
            build_date,
            build_time,
            unique_id,
            extension: caps["ext"].to_string(),
        })
    }

    /// Whether `name` parses as a video file name
    pub fn is_video_file_name(name: &str) -> bool {
        Self::parse(name).is_ok()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn video_type(&self) -> VideoType {
        self.video_type
    }

    pub fn features(&self) -> &str {
        &self.features
    }

    /// Decode the fingerprint; fails on letters outside the stage alphabet
    pub fn decoded_features(&self) -> Result<VideoFeatures> {
        VideoFeatures::from_fingerprint(&self.features)
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn build_date(&self) -> NaiveDate {
        self.build_date
    }

    pub fn build_time(&self) -> NaiveTime {
        self.build_time
    }

    pub fn unique_id(&self) -> Uuid {
        self.unique_id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for VideoFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}_{}_{}_{}.{}",
            self.title,
            self.video_type,
            self.features,
            self.build_id,
            self.build_date.format("%Y-%m-%d"),
            self.build_time.format("%H:%M:%S"),
            UID_MARKER,
            self.unique_id,
            self.extension
        )
    }
}

fn invalid<S: Into<String>>(details: S) -> crate::error::CompositorError {
    FileNameError::InvalidArgument {
        details: details.into(),
    }
    .into()
}

fn malformed<R: ToString>(name: &str, reason: R) -> crate::error::CompositorError {
    FileNameError::MalformedName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn stamp() -> BuildStamp {
        BuildStamp::new(
            "1234567890",
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            NaiveTime::from_hms_opt(23, 4, 42).unwrap(),
        )
    }

    #[test]
    fn test_compose_and_parse() {
        let name = VideoFileName::new("my_video", VideoType::RawText, "oooio", &stamp(), "mp4")
            .unwrap()
            .to_string();

        assert!(name.starts_with("my_video_rawtext_oooio_1234567890_2024-07-01_23:04:42_UID_"));
        assert!(name.ends_with(".mp4"));
        assert!(VideoFileName::is_video_file_name(&name));

        let parsed = VideoFileName::parse(&name).unwrap();
        assert_eq!(parsed.title(), "my_video");
        assert_eq!(parsed.video_type(), VideoType::RawText);
        assert_eq!(parsed.features(), "oooio");
        assert_eq!(parsed.build_id(), "1234567890");
        assert_eq!(parsed.build_date(), stamp().date);
        assert_eq!(parsed.build_time(), stamp().time);
        assert_eq!(parsed.extension(), "mp4");
        assert_eq!(parsed.to_string(), name);
    }

    #[test]
    fn test_encode_title_with_space() {
        let uid = Uuid::parse_str("a0b1c2d3-e4f5-4a6b-8c7d-9e0f1a2b3c4d").unwrap();
        let name = VideoFileName::with_unique_id("Sample Video", VideoType::CompRoot, "dorio", &stamp(), uid, "mp4")
            .unwrap();

        assert_eq!(
            name.to_string(),
            "Sample Video_comproot_dorio_1234567890_2024-07-01_23:04:42_UID_a0b1c2d3-e4f5-4a6b-8c7d-9e0f1a2b3c4d.mp4"
        );
    }

    #[test]
    fn test_decode_minutes_precision_name() {
        let name = "exampletitle_comproot_ooooo_1234567890_2022-01-01_12:00_UID_a0b1c2d3-e4f5-4a6b-8c7d-9e0f1a2b3c4d.mp4";
        let parsed = VideoFileName::parse(name).unwrap();

        assert_eq!(parsed.title(), "exampletitle");
        assert_eq!(parsed.video_type(), VideoType::CompRoot);
        assert_eq!(parsed.features(), "ooooo");
        assert_eq!(parsed.build_id(), "1234567890");
        assert_eq!(parsed.build_date(), NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(parsed.build_time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_reject_invalid_names() {
        let uid = "a0b1c2d3-e4f5-4a6b-8c7d-9e0f1a2b3c4d";
        let rejected = [
            "video.mp4".to_string(),
            format!("clip_rawtext_ooooo_1234567890_2024-07-01_23:04:42_{}.mp4", uid),
            format!("clip_rawtext_ooooo_1234567890_2024-13-45_23:04:42_UID_{}.mp4", uid),
            format!("clip_rawtext_ooooo_1234567890_2024-07-01_25:61_UID_{}.mp4", uid),
            format!("clip_movie_ooooo_1234567890_2024-07-01_23:04_UID_{}.mp4", uid),
            format!("clip_rawtext_oooo_1234567890_2024-07-01_23:04_UID_{}.mp4", uid),
        ];

        for name in &rejected {
            assert!(!VideoFileName::is_video_file_name(name), "accepted {}", name);
        }

        let err = VideoFileName::parse(&rejected[4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedName);
    }

    #[test]
    fn test_minutes_only_time_is_accepted() {
        let name = "clip_imported_ooooo_42_2024-07-01_23:04_UID_a0b1c2d3-e4f5-4a6b-8c7d-9e0f1a2b3c4d.mov";
        let parsed = VideoFileName::parse(name).unwrap();
        assert_eq!(parsed.build_time(), NaiveTime::from_hms_opt(23, 4, 0).unwrap());
        assert_eq!(parsed.extension(), "mov");
    }

    #[test]
    fn test_title_without_content_is_rejected() {
        let err = VideoFileName::new("  ", VideoType::Imported, "ooooo", &stamp(), "mp4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_title_keeps_underscores() {
        let name = VideoFileName::new("a_b_c", VideoType::Transition, "ooroo", &stamp(), "mp4")
            .unwrap()
            .to_string();
        let parsed = VideoFileName::parse(&name).unwrap();
        assert_eq!(parsed.title(), "a_b_c");
        assert_eq!(parsed.video_type(), VideoType::Transition);
    }

    #[test]
    fn test_title_with_control_character_is_rejected() {
        for title in ["a\nb", "tab\there", "bell\u{7}"] {
            let err = VideoFileName::new(title, VideoType::RawText, "ooooo", &stamp(), "mp4").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "accepted {:?}", title);
        }
    }

    #[test]
    fn test_bad_build_id_is_rejected() {
        let mut bad = stamp();
        bad.id = "12_34".to_string();
        assert!(VideoFileName::new("clip", VideoType::RawText, "ooooo", &bad, "mp4").is_err());
    }

    #[test]
    fn test_fingerprint_from_flags() {
        let mut metadata = VideoMetadata::default();
        assert_eq!(VideoFeatures::from_metadata(&metadata).fingerprint(), "ooooo");

        metadata.mark_interpolated();
        assert_eq!(VideoFeatures::from_metadata(&metadata).fingerprint(), "oooio");

        metadata.mark_bg_music_applied();
        metadata.mark_prompt_read_aloud();
        metadata.mark_reencoded();
        assert_eq!(VideoFeatures::from_metadata(&metadata).fingerprint(), "dvrio");

        metadata.mark_bg_music_generated();
        metadata.mark_subtitled();
        assert_eq!(VideoFeatures::from_metadata(&metadata).fingerprint(), "gvris");
    }

    #[test]
    fn test_recorded_prompt_audio_letter() {
        let mut metadata = VideoMetadata::default();
        metadata.mark_prompt_audio_used();
        assert_eq!(VideoFeatures::from_metadata(&metadata).fingerprint(), "ouooo");
    }

    #[test]
    fn test_fingerprint_decode() {
        let features = VideoFeatures::from_fingerprint("dvrio").unwrap();
        assert_eq!(features.music, MusicFeature::Default);
        assert_eq!(features.prompt_audio, PromptAudioFeature::ReadAloud);
        assert!(features.reencoded && features.interpolated && !features.subtitled);
        assert_eq!(features.to_string(), "dvrio");

        assert!(VideoFeatures::from_fingerprint("zzzzz").is_err());
        assert!(VideoFeatures::from_fingerprint("ooo").is_err());
    }

    #[test]
    fn test_name_from_state() {
        let mut metadata = VideoMetadata::with_title("train-fog");
        metadata.mark_reencoded();

        let name = VideoFileName::from_state(&metadata, VideoType::PromptBased, &stamp()).unwrap();
        assert_eq!(name.features(), "ooroo");
        assert!(name.to_string().starts_with("train-fog_prmptbasd_ooroo_1234567890_"));
    }

    mod roundtrip {
        use super::*;
        use proptest::prelude::*;

        fn name_parts() -> impl Strategy<Value = VideoFileName> {
            (
                "[A-Za-z0-9]([A-Za-z0-9 _.-]{0,20}[A-Za-z0-9])?",
                proptest::sample::select(VideoType::ALL.to_vec()),
                "[a-z]{5}",
                "[A-Za-z0-9]{1,12}",
                (1970i32..2100, 1u32..=12, 1u32..=28),
                (0u32..24, 0u32..60, 0u32..60),
                any::<u128>(),
                "[a-z0-9]{1,4}",
            )
                .prop_map(|(title, video_type, features, id, (y, m, d), (h, min, sec), uid, ext)| {
                    let stamp = BuildStamp::new(
                        id,
                        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                        NaiveTime::from_hms_opt(h, min, sec).unwrap(),
                    );
                    VideoFileName::with_unique_id(
                        &title,
                        video_type,
                        &features,
                        &stamp,
                        Uuid::from_u128(uid),
                        &ext,
                    )
                    .unwrap()
                })
        }

        proptest! {
            #[test]
            fn parse_inverts_display(name in name_parts()) {
                let encoded = name.to_string();
                prop_assert_eq!(VideoFileName::parse(&encoded).unwrap(), name);
            }

            #[test]
            fn encoded_names_are_recognized(name in name_parts()) {
                prop_assert!(VideoFileName::is_video_file_name(&name.to_string()));
            }

            #[test]
            fn construction_and_recognition_agree(title in "(\\PC|\\n|\\t){1,12}") {
                let stamp = BuildStamp::new(
                    "42",
                    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                    NaiveTime::from_hms_opt(1, 2, 3).unwrap(),
                );
                if let Ok(name) = VideoFileName::new(&title, VideoType::RawText, "ooooo", &stamp, "mp4") {
                    prop_assert!(VideoFileName::is_video_file_name(&name.to_string()));
                }
            }
        }
    }
}
