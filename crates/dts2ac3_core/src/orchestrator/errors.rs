//! Error types for the orchestration pipeline.
//!
//! Errors carry context that chains through layers:
//! file -> stage -> operation -> detail.

use thiserror::Error;

use crate::extract::ExtractError;
use crate::inspect::InspectError;
use crate::io::RunnerError;
use crate::mux::PublishError;
use crate::transcode::TranscodeError;

/// The pipeline stage a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Timecodes,
    Extract,
    Transcode,
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Discover => "discovery",
            Stage::Timecodes => "timecode extraction",
            Stage::Extract => "track extraction",
            Stage::Transcode => "transcoding",
            Stage::Publish => "publishing",
        };
        write!(f, "{}", name)
    }
}

/// Error from a single pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// A per-file failure with its stage context. These are logged and the
/// file is skipped; the batch continues.
#[derive(Debug, Error)]
#[error("\"{file}\" failed during {stage}: {source}")]
pub struct JobError {
    pub file: String,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

impl JobError {
    pub fn new(file: impl Into<String>, stage: Stage, source: StageError) -> Self {
        Self {
            file: file.into(),
            stage,
            source,
        }
    }
}
