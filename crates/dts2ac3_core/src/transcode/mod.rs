//! The decode/encode subprocess pipeline.
//!
//! Each selected track is converted by piping `dcadec` (DTS to PCM on
//! stdout) into `aften` (PCM on stdin to AC3 file). Both processes run
//! concurrently; both exit statuses are checked and a failure names
//! the stage that broke. User-supplied `key=value` overrides merge
//! into the built-in defaults and may replace them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::{CommandRunner, RunnerError};
use crate::models::TrackJob;

/// External DTS decoder.
pub const DECODER: &str = "dcadec";

/// External AC3 encoder.
pub const ENCODER: &str = "aften";

/// Built-in decoder arguments; overridable from the command line.
const DECODER_DEFAULTS: &[(&str, &str)] = &[("-o", "wavall")];

/// Errors from the transcode stage.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("malformed key=value override: '{0}'")]
    BadOverride(String),

    #[error("decoder ({tool}) failed with exit code {exit_code}: {message}")]
    DecodeFailed {
        tool: &'static str,
        exit_code: i32,
        message: String,
    },

    #[error("encoder ({tool}) failed with exit code {exit_code}: {message}")]
    EncodeFailed {
        tool: &'static str,
        exit_code: i32,
        message: String,
    },

    #[error("failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Parsed `key=value` overrides for one subprocess.
#[derive(Debug, Clone, Default)]
pub struct ExtraArgs {
    pairs: Vec<(String, String)>,
}

impl ExtraArgs {
    /// Parse raw `key=value` strings. Keys are normalized to carry a
    /// leading dash so `o=wav` and `-o=wav` both override the built-in
    /// `-o` default.
    pub fn parse(raw: &[String]) -> Result<Self, TranscodeError> {
        let mut pairs = Vec::with_capacity(raw.len());
        for entry in raw {
            let (key, value) = entry
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| TranscodeError::BadOverride(entry.clone()))?;
            pairs.push((normalize_key(key), value.to_string()));
        }
        Ok(Self { pairs })
    }

    /// Merge these overrides onto a default argument map, replacing
    /// defaults with matching keys and appending the rest in the order
    /// the user gave them.
    pub fn merged_over(&self, defaults: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in &self.pairs {
            match merged.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => merged.push((key.clone(), value.clone())),
            }
        }
        merged
    }

    /// Flatten the overrides into command-line tokens.
    pub fn to_tokens(&self) -> Vec<String> {
        flatten(&self.pairs)
    }
}

fn normalize_key(key: &str) -> String {
    if key.starts_with('-') {
        key.to_string()
    } else {
        format!("-{}", key)
    }
}

fn flatten(pairs: &[(String, String)]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(pairs.len() * 2);
    for (key, value) in pairs {
        tokens.push(key.clone());
        tokens.push(value.clone());
    }
    tokens
}

/// Assemble the decoder invocation for one raw DTS file.
pub fn build_decoder_args(extra: &ExtraArgs, dts_path: &Path) -> Vec<String> {
    let mut tokens = flatten(&extra.merged_over(DECODER_DEFAULTS));
    tokens.push(dts_path.display().to_string());
    tokens
}

/// Assemble the encoder invocation: PCM from stdin, AC3 to file.
pub fn build_encoder_args(extra: &ExtraArgs, ac3_path: &Path) -> Vec<String> {
    let mut tokens = extra.to_tokens();
    tokens.push("-".to_string());
    tokens.push(ac3_path.display().to_string());
    tokens
}

/// Convert one extracted track, recording file sizes and cleaning up
/// the raw DTS payload unless it is being retained.
pub fn convert_track(
    runner: &CommandRunner,
    job: &mut TrackJob,
    dcadec_extra: &ExtraArgs,
    aften_extra: &ExtraArgs,
    keep_dts: bool,
) -> Result<(), TranscodeError> {
    let decoder_args = build_decoder_args(dcadec_extra, &job.dts_path);
    let encoder_args = build_encoder_args(aften_extra, &job.ac3_path);

    let Some(pair) = runner.run_piped(DECODER, &decoder_args, ENCODER, &encoder_args)? else {
        return Ok(());
    };

    if pair.first_exit != 0 {
        return Err(TranscodeError::DecodeFailed {
            tool: DECODER,
            exit_code: pair.first_exit,
            message: trim_diag(&pair.first_stderr),
        });
    }
    if pair.second_exit != 0 {
        return Err(TranscodeError::EncodeFailed {
            tool: ENCODER,
            exit_code: pair.second_exit,
            message: trim_diag(&pair.second_stderr),
        });
    }

    // Informational only; absence just means the tool wrote nothing.
    job.dts_size = fs::metadata(&job.dts_path).ok().map(|m| m.len());
    job.ac3_size = fs::metadata(&job.ac3_path).ok().map(|m| m.len());
    tracing::debug!(
        track = job.track.id,
        dts_size = job.dts_size,
        ac3_size = job.ac3_size,
        "track converted"
    );

    if !keep_dts {
        fs::remove_file(&job.dts_path).map_err(|source| TranscodeError::Cleanup {
            path: job.dts_path.clone(),
            source,
        })?;
    }

    Ok(())
}

fn trim_diag(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}
