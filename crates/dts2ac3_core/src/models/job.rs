//! Per-file job context and deterministic temporary artifact naming.

use std::path::{Path, PathBuf};

use super::media::Track;

/// Kind of temporary per-track artifact placed in the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Extracted v2 timecode file.
    Timecodes,
    /// Raw extracted DTS payload.
    RawAudio,
    /// Encoded AC3 output.
    Converted,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Timecodes => "tc",
            ArtifactKind::RawAudio => "dts",
            ArtifactKind::Converted => "ac3",
        }
    }
}

/// Temporary filename for a per-track artifact.
///
/// Pure function of (title, track id, kind) so repeated runs over the
/// same title reuse names and distinct tracks never collide.
pub fn artifact_file_name(title: &str, track_id: u64, kind: ArtifactKind) -> String {
    format!("{}.{}.{}", title, track_id, kind.extension())
}

/// Filename of the intermediate remuxed container.
pub fn intermediate_file_name(title: &str) -> String {
    format!("{}.new.mkv", title)
}

/// One selected track flowing through the pipeline.
///
/// Created during discovery with its artifact paths precomputed, then
/// progressively enriched by the timecode, extraction, and transcode
/// stages.
#[derive(Debug, Clone)]
pub struct TrackJob {
    pub track: Track,
    /// Destination for the extracted timecode file.
    pub tc_path: PathBuf,
    /// Destination for the raw extracted DTS payload.
    pub dts_path: PathBuf,
    /// Destination for the encoded AC3 file.
    pub ac3_path: PathBuf,
    /// Initial delay in milliseconds read from the timecode file.
    pub delay_ms: i64,
    /// Size of the extracted DTS file in bytes (informational).
    pub dts_size: Option<u64>,
    /// Size of the encoded AC3 file in bytes (informational).
    pub ac3_size: Option<u64>,
}

impl TrackJob {
    pub fn new(track: Track, work_dir: &Path, title: &str) -> Self {
        let tc_path = work_dir.join(artifact_file_name(title, track.id, ArtifactKind::Timecodes));
        let dts_path = work_dir.join(artifact_file_name(title, track.id, ArtifactKind::RawAudio));
        let ac3_path = work_dir.join(artifact_file_name(title, track.id, ArtifactKind::Converted));
        Self {
            track,
            tc_path,
            dts_path,
            ac3_path,
            delay_ms: 0,
            dts_size: None,
            ac3_size: None,
        }
    }
}

/// Everything the pipeline knows about one input file.
///
/// Created when processing of a file begins and discarded when it ends;
/// no state crosses from one file to the next.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Path of the source container as given on the command line.
    pub source: PathBuf,
    /// Directory containing the source container.
    pub source_dir: PathBuf,
    /// Source filename without the container extension.
    pub title: String,
    /// Full discovered track table, in container order.
    pub tracks: Vec<Track>,
    /// Tracks selected for conversion.
    pub selected: Vec<TrackJob>,
    /// Working directory for temporary artifacts.
    pub work_dir: PathBuf,
}

impl JobContext {
    pub fn new(source: PathBuf, work_dir: PathBuf) -> Self {
        let source_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let title = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source,
            source_dir,
            title,
            tracks: Vec::new(),
            selected: Vec::new(),
            work_dir,
        }
    }

    /// Path of the intermediate container in the working directory.
    pub fn intermediate_path(&self) -> PathBuf {
        self.work_dir.join(intermediate_file_name(&self.title))
    }

    /// Path of the adjacent output used by the keep-original mode.
    pub fn adjacent_output_path(&self) -> PathBuf {
        self.source_dir.join(intermediate_file_name(&self.title))
    }

    /// Ids of the selected tracks, in selection order.
    pub fn selected_ids(&self) -> Vec<u64> {
        self.selected.iter().map(|job| job.track.id).collect()
    }
}
