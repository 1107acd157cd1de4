//! Track selection policy.
//!
//! Exactly one policy is active per run: an explicit track id beats
//! process-all, which beats the default of taking the first DTS track
//! in container order. Every selected track is guaranteed to be a DTS
//! audio track; a policy that matches nothing is a per-file error.

use crate::config::Options;
use crate::models::{Track, AC3_CODEC_ID};

use super::InspectError;

/// Which tracks of the table are eligible for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// A single explicitly requested track id.
    Explicit(u64),
    /// Every DTS track in the file.
    All,
    /// Only the first DTS track in container order.
    FirstMatch,
}

impl SelectionPolicy {
    /// Derive the active policy from the resolved options.
    pub fn from_options(opts: &Options) -> Self {
        if let Some(id) = opts.track_id {
            SelectionPolicy::Explicit(id)
        } else if opts.parse_all {
            SelectionPolicy::All
        } else {
            SelectionPolicy::FirstMatch
        }
    }
}

/// Select the tracks to convert.
///
/// The returned subset preserves container order and only ever
/// contains DTS audio tracks.
pub fn select(tracks: &[Track], policy: SelectionPolicy) -> Result<Vec<&Track>, InspectError> {
    match policy {
        SelectionPolicy::Explicit(id) => {
            let track = tracks
                .iter()
                .find(|t| t.id == id)
                .ok_or(InspectError::TrackMissing(id))?;
            if !track.is_dts_audio() {
                return Err(InspectError::NotDts {
                    id,
                    codec: track.props.codec_id.clone(),
                });
            }
            Ok(vec![track])
        }
        SelectionPolicy::All => {
            let matches: Vec<&Track> = tracks.iter().filter(|t| t.is_dts_audio()).collect();
            if matches.is_empty() {
                return Err(InspectError::NoMatchingTracks);
            }
            Ok(matches)
        }
        SelectionPolicy::FirstMatch => {
            let first = tracks
                .iter()
                .find(|t| t.is_dts_audio())
                .ok_or(InspectError::NoMatchingTracks)?;
            Ok(vec![first])
        }
    }
}

/// Whether the table already holds an AC3 track. Without `--force`,
/// such a file is considered already converted and skipped.
pub fn has_converted_track(tracks: &[Track]) -> bool {
    tracks.iter().any(|t| t.props.codec_id == AC3_CODEC_ID)
}
