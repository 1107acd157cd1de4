//! Remuxing and publishing of converted tracks.

pub mod options_builder;
pub mod publish;

pub use options_builder::MkvmergeOptionsBuilder;
pub use publish::{copy_external, remux, PublishError, MUX_TOOL};
