//! Track and stream property records built from container inspection.

use serde::{Deserialize, Serialize};

use super::enums::TrackType;

/// Codec identifier of the tracks this tool converts away from.
pub const DTS_CODEC_ID: &str = "A_DTS";

/// Codec identifier produced by the encoder.
pub const AC3_CODEC_ID: &str = "A_AC3";

/// Properties of a media stream (codec, language, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProps {
    /// Codec identifier (e.g., "A_DTS", "V_MPEG4/ISO/AVC").
    pub codec_id: String,
    /// Language code (ISO 639-2, e.g., "eng", "jpn", "und").
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Track name, if one was set in the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_lang() -> String {
    "und".to_string()
}

impl StreamProps {
    /// Create new stream properties with required codec.
    pub fn new(codec_id: impl Into<String>) -> Self {
        Self {
            codec_id: codec_id.into(),
            lang: default_lang(),
            name: None,
        }
    }

    /// Set the language code.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Set the track name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A single track within the source container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track ID within the container (mkvmerge numbering).
    pub id: u64,
    /// Type of track (video, audio, subtitles).
    #[serde(rename = "type")]
    pub track_type: TrackType,
    /// Stream properties.
    pub props: StreamProps,
}

impl Track {
    /// Create a new track.
    pub fn new(id: u64, track_type: TrackType, props: StreamProps) -> Self {
        Self {
            id,
            track_type,
            props,
        }
    }

    /// Whether this track is a convertible DTS audio track.
    pub fn is_dts_audio(&self) -> bool {
        self.track_type == TrackType::Audio && self.props.codec_id == DTS_CODEC_ID
    }

    /// Get a display string for this track.
    pub fn display_name(&self) -> String {
        let name_part = match &self.props.name {
            Some(name) => format!(" - {}", name),
            None => String::new(),
        };
        format!(
            "{} track {} ({}, {}){}",
            self.track_type, self.id, self.props.codec_id, self.props.lang, name_part
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dts_detection_needs_audio_type_and_codec() {
        let dts = Track::new(1, TrackType::Audio, StreamProps::new(DTS_CODEC_ID));
        assert!(dts.is_dts_audio());

        let ac3 = Track::new(2, TrackType::Audio, StreamProps::new(AC3_CODEC_ID));
        assert!(!ac3.is_dts_audio());

        // Same codec id on a non-audio row must never qualify.
        let odd = Track::new(3, TrackType::Subtitles, StreamProps::new(DTS_CODEC_ID));
        assert!(!odd.is_dts_audio());
    }

    #[test]
    fn display_name_includes_optional_name() {
        let track = Track::new(
            1,
            TrackType::Audio,
            StreamProps::new(DTS_CODEC_ID)
                .with_lang("jpn")
                .with_name("Commentary"),
        );
        assert_eq!(track.display_name(), "audio track 1 (A_DTS, jpn) - Commentary");
    }

    #[test]
    fn lang_defaults_to_undetermined() {
        let props = StreamProps::new(DTS_CODEC_ID);
        assert_eq!(props.lang, "und");
        assert!(props.name.is_none());
    }
}
