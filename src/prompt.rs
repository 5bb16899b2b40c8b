//! # Prompts
//!
//! A prompt is what a build starts from: user text, a recorded audio track
//! (transcribed into subtitles by the gateway), or both.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result};

/// User prompt content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompt {
    /// Prompt text (may be empty for audio-only prompts)
    pub text: String,

    /// Recorded audio the prompt was spoken into
    pub audio_recording: Option<PathBuf>,

    /// Title suggested for the prompt, if known
    pub title: Option<String>,

    /// Subtitles already extracted from the recording
    pub subtitles: Vec<Subtitle>,
}

impl Prompt {
    /// Create a text prompt; the text must not be blank
    pub fn from_text<S: Into<String>>(text: S) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CompositorError::invalid_argument("prompt text is empty"));
        }

        Ok(Self {
            text,
            ..Default::default()
        })
    }

    /// Create a prompt from an audio recording
    pub fn recorded<P: Into<PathBuf>>(audio_recording: P) -> Self {
        Self {
            audio_recording: Some(audio_recording.into()),
            ..Default::default()
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Text of the subtitles joined in order, or the prompt text
    pub fn full_text(&self) -> String {
        if self.subtitles.is_empty() {
            return self.text.clone();
        }

        self.subtitles
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    /// Start offset in seconds
    pub start: f64,

    /// End offset in seconds
    pub end: f64,

    pub text: String,
}

impl Subtitle {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Render subtitles in SubRip (`.srt`) format
pub fn to_srt(subtitles: &[Subtitle]) -> String {
    let mut out = String::new();

    for (i, subtitle) in subtitles.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            srt_timestamp(subtitle.start),
            srt_timestamp(subtitle.end)
        );
        let _ = writeln!(out, "{}", subtitle.text.trim());
        out.push('\n');
    }

    out
}

fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;

    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms
    )
}
