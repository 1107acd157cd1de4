//! Data model: tracks, per-file job context, temporary artifact naming.

pub mod enums;
pub mod job;
pub mod media;

pub use enums::TrackType;
pub use job::{artifact_file_name, intermediate_file_name, ArtifactKind, JobContext, TrackJob};
pub use media::{StreamProps, Track, AC3_CODEC_ID, DTS_CODEC_ID};
