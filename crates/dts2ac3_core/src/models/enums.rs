//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Type of media track, as reported by the container inspection tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
    Subtitles,
}

impl std::fmt::Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackType::Video => write!(f, "video"),
            TrackType::Audio => write!(f, "audio"),
            TrackType::Subtitles => write!(f, "subtitles"),
        }
    }
}

impl TrackType {
    /// Map the type string used by mkvmerge identification output.
    pub fn from_mkvmerge(value: &str) -> Option<Self> {
        match value {
            "video" => Some(TrackType::Video),
            "audio" => Some(TrackType::Audio),
            "subtitles" => Some(TrackType::Subtitles),
            _ => None,
        }
    }
}
