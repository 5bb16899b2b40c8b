use std::fmt;
use std::str::FromStr;

use crate::error::FileNameError;

/// Short type tag of a video, as embedded in its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoType {
    /// Composite at the root of a build tree
    CompRoot,
    /// Composite nested inside another composite
    CompChild,
    /// Pre-existing media file
    Imported,
    /// Generated from raw prompt text
    RawText,
    /// Generated between two neighboring videos
    Transition,
    /// Generated from a prompt through keyword extraction
    PromptBased,
    /// Generated from an image
    RawImage,
}

impl VideoType {
    pub const ALL: [VideoType; 7] = [
        VideoType::CompRoot,
        VideoType::CompChild,
        VideoType::Imported,
        VideoType::RawText,
        VideoType::Transition,
        VideoType::PromptBased,
        VideoType::RawImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::CompRoot => "comproot",
            VideoType::CompChild => "compchild",
            VideoType::Imported => "imported",
            VideoType::RawText => "rawtext",
            VideoType::Transition => "transition",
            VideoType::PromptBased => "prmptbasd",
            VideoType::RawImage => "rawimage",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoType {
    type Err = FileNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FileNameError::InvalidArgument {
                details: format!("unknown video type '{}'", s),
            })
    }
}

/// Lifecycle position of a video within one build invocation
///
/// Phases are entered strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
    NotStarted,
    PreBuildHookRun,
    SettingsPrepared,
    CoreLogicRun,
    HandlersRun,
    PostBuildHookRun,
    Materialized,
    Built,
}

impl BuildPhase {
    /// The only phase that may follow this one
    pub fn next(&self) -> Option<BuildPhase> {
        match self {
            BuildPhase::NotStarted => Some(BuildPhase::PreBuildHookRun),
            BuildPhase::PreBuildHookRun => Some(BuildPhase::SettingsPrepared),
            BuildPhase::SettingsPrepared => Some(BuildPhase::CoreLogicRun),
            BuildPhase::CoreLogicRun => Some(BuildPhase::HandlersRun),
            BuildPhase::HandlersRun => Some(BuildPhase::PostBuildHookRun),
            BuildPhase::PostBuildHookRun => Some(BuildPhase::Materialized),
            BuildPhase::Materialized => Some(BuildPhase::Built),
            BuildPhase::Built => None,
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
