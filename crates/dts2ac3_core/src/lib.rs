//! dts2ac3 core - backend pipeline for batch DTS to AC3 conversion.
//!
//! This crate contains all conversion logic with no CLI dependencies:
//! configuration resolution, track discovery, timecode and track
//! extraction, the decode/encode subprocess pipeline, and the final
//! remux/publish step. The `dts2ac3` binary is a thin wrapper over
//! [`orchestrator::Pipeline`].

pub mod config;
pub mod extract;
pub mod inspect;
pub mod io;
pub mod models;
pub mod mux;
pub mod orchestrator;
pub mod report;
pub mod transcode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
