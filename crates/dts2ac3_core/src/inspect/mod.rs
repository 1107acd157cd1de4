//! Track discovery via mkvmerge JSON identification.
//!
//! `mkvmerge -J` gives a structured description of the container, so
//! the id -> {type, codec} mapping is an ordinary lookup over
//! deserialized values rather than text scraping. Language and track
//! name come along for free and are carried into the remux.

pub mod selection;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{StreamProps, Track, TrackType};

pub use selection::{has_converted_track, select, SelectionPolicy};

/// Tool used for container identification.
pub const INSPECT_TOOL: &str = "mkvmerge";

/// Errors raised while discovering and selecting tracks. All of these
/// are per-file: the file is skipped and the batch continues.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("invalid file: {0}")]
    FileNotFound(PathBuf),

    #[error("does not appear to be a Matroska file: {0}")]
    NotMatroska(PathBuf),

    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    ToolFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    #[error("no DTS tracks found in file")]
    NoMatchingTracks,

    #[error("explicitly defined track id {0} does not exist in file")]
    TrackMissing(u64),

    #[error("explicitly defined track id {id} is not a DTS track (found {codec})")]
    NotDts { id: u64, codec: String },

    #[error("file already contains an AC3 track (use --force to convert anyway)")]
    AlreadyConverted,
}

#[derive(Debug, Deserialize)]
struct Identification {
    #[serde(default)]
    tracks: Vec<IdentifiedTrack>,
}

#[derive(Debug, Deserialize)]
struct IdentifiedTrack {
    id: u64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    properties: IdentifiedProps,
}

#[derive(Debug, Default, Deserialize)]
struct IdentifiedProps {
    codec_id: Option<String>,
    language: Option<String>,
    track_name: Option<String>,
}

/// Parse mkvmerge identification JSON into the track table, preserving
/// container order. Rows of unknown type (buttons etc.) are dropped.
pub fn parse_identification(json: &str) -> Result<Vec<Track>, InspectError> {
    let parsed: Identification = serde_json::from_str(json).map_err(|e| InspectError::Parse {
        tool: INSPECT_TOOL.to_string(),
        message: e.to_string(),
    })?;

    let mut tracks = Vec::with_capacity(parsed.tracks.len());
    for row in parsed.tracks {
        let Some(track_type) = TrackType::from_mkvmerge(&row.kind) else {
            tracing::debug!(id = row.id, kind = row.kind, "skipping unknown track type");
            continue;
        };

        let mut props = StreamProps::new(row.properties.codec_id.unwrap_or_default());
        if let Some(language) = row.properties.language {
            props.lang = language;
        }
        props.name = row.properties.track_name;

        tracks.push(Track::new(row.id, track_type, props));
    }

    Ok(tracks)
}

/// Identify the tracks of a container file.
///
/// The probe is read-only and runs in every execution mode, including
/// dry runs - discovery has no side effects. The tool's exit status is
/// checked; a nonzero status fails the file.
pub fn identify(path: &Path) -> Result<Vec<Track>, InspectError> {
    if !path.is_file() {
        return Err(InspectError::FileNotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|e| e.to_str()) != Some("mkv") {
        return Err(InspectError::NotMatroska(path.to_path_buf()));
    }

    let output = Command::new(INSPECT_TOOL)
        .arg("-J")
        .arg(path)
        .output()
        .map_err(|source| InspectError::Launch {
            tool: INSPECT_TOOL.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(InspectError::ToolFailed {
            tool: INSPECT_TOOL.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_identification(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DTS_CODEC_ID;

    const FIXTURE: &str = r#"{
        "container": {"recognized": true, "supported": true, "type": "Matroska"},
        "tracks": [
            {
                "id": 0,
                "type": "video",
                "properties": {"codec_id": "V_MPEG4/ISO/AVC", "language": "und"}
            },
            {
                "id": 1,
                "type": "audio",
                "properties": {
                    "codec_id": "A_DTS",
                    "language": "eng",
                    "track_name": "Surround 5.1"
                }
            },
            {
                "id": 2,
                "type": "subtitles",
                "properties": {"codec_id": "S_TEXT/UTF8", "language": "eng"}
            }
        ]
    }"#;

    #[test]
    fn parses_tracks_in_container_order() {
        let tracks = parse_identification(FIXTURE).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[0].track_type, TrackType::Video);
        assert_eq!(tracks[1].props.codec_id, DTS_CODEC_ID);
        assert_eq!(tracks[1].props.lang, "eng");
        assert_eq!(tracks[1].props.name.as_deref(), Some("Surround 5.1"));
    }

    #[test]
    fn missing_properties_default_cleanly() {
        let json = r#"{"tracks": [{"id": 4, "type": "audio"}]}"#;
        let tracks = parse_identification(json).unwrap();
        assert_eq!(tracks[0].props.lang, "und");
        assert!(tracks[0].props.name.is_none());
        assert_eq!(tracks[0].props.codec_id, "");
    }

    #[test]
    fn unknown_track_types_are_dropped() {
        let json = r#"{"tracks": [
            {"id": 0, "type": "buttons"},
            {"id": 1, "type": "audio", "properties": {"codec_id": "A_DTS"}}
        ]}"#;
        let tracks = parse_identification(json).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 1);
    }

    #[test]
    fn garbage_json_is_a_parse_error() {
        assert!(matches!(
            parse_identification("Track ID 0: video (V_MPEG4)"),
            Err(InspectError::Parse { .. })
        ));
    }

    #[test]
    fn nonexistent_path_fails_before_any_subprocess() {
        let result = identify(Path::new("/no/such/file.mkv"));
        assert!(matches!(result, Err(InspectError::FileNotFound(_))));
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.avi");
        std::fs::write(&path, b"").unwrap();
        let result = identify(&path);
        assert!(matches!(result, Err(InspectError::NotMatroska(_))));
    }
}
