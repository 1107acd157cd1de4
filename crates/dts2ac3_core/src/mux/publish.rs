//! Final container placement and temporary cleanup.
//!
//! Two mutually exclusive modes: external-only copies the converted
//! files next to the original and never touches the container; remux
//! builds a new container in the working directory, then replaces the
//! original or lands adjacent to it.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Options;
use crate::io::{CommandRunner, RunnerError};
use crate::models::JobContext;
use crate::report::Reporter;

use super::options_builder::MkvmergeOptionsBuilder;

/// External multiplexer.
pub const MUX_TOOL: &str = "mkvmerge";

/// Errors from the publish stage.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    MuxFailed {
        tool: &'static str,
        exit_code: i32,
        message: String,
    },

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(operation: &'static str, path: PathBuf) -> impl FnOnce(io::Error) -> PublishError {
    move |source| PublishError::Io {
        operation,
        path,
        source,
    }
}

/// External-only mode: copy each converted file next to the original
/// container. The original is never modified.
pub fn copy_external(
    runner: &CommandRunner,
    reporter: Reporter,
    ctx: &JobContext,
) -> Result<Vec<PathBuf>, PublishError> {
    let mut copies = Vec::with_capacity(ctx.selected.len());

    for job in &ctx.selected {
        let file_name = job.ac3_path.file_name().unwrap_or_default();
        let dest = ctx.source_dir.join(file_name);
        reporter.debug(&format!(
            "track {}: copying {} to {}",
            job.track.id,
            job.ac3_path.display(),
            dest.display()
        ));

        if runner.mode().is_live() {
            fs::copy(&job.ac3_path, &dest).map_err(io_err("copy", job.ac3_path.clone()))?;
            // The working-directory copy has been consumed.
            fs::remove_file(&job.ac3_path).map_err(io_err("remove", job.ac3_path.clone()))?;
        }
        copies.push(dest);
    }

    Ok(copies)
}

/// Remux mode: run mkvmerge over the original plus the converted
/// tracks, then move the result into place and clean up.
pub fn remux(
    runner: &CommandRunner,
    reporter: Reporter,
    ctx: &JobContext,
    opts: &Options,
) -> Result<PathBuf, PublishError> {
    let intermediate = ctx.intermediate_path();
    let tokens = MkvmergeOptionsBuilder::new(ctx, opts, &intermediate).build();

    let outcome = runner.run(MUX_TOOL, &tokens)?;

    let dest = if opts.copy_new {
        ctx.adjacent_output_path()
    } else {
        ctx.source.clone()
    };

    let Some(output) = outcome else {
        // Dry run: nothing was produced and nothing moves.
        return Ok(dest);
    };

    // mkvmerge exit codes: 0 = success, 1 = warnings, >= 2 = errors.
    if output.exit_code >= 2 {
        return Err(PublishError::MuxFailed {
            tool: MUX_TOOL,
            exit_code: output.exit_code,
            message: output.stderr.lines().next().unwrap_or("").trim().to_string(),
        });
    }
    if output.exit_code == 1 {
        reporter.warn("mkvmerge completed with warnings");
    }

    // The converted files have been consumed by the mux.
    for job in &ctx.selected {
        fs::remove_file(&job.ac3_path).map_err(io_err("remove", job.ac3_path.clone()))?;
    }

    if opts.copy_new {
        reporter.info("Moving new MKV file next to the old MKV file...");
    } else {
        reporter.info("Moving new MKV file over the old MKV file...");
    }
    fs::copy(&intermediate, &dest).map_err(io_err("copy", intermediate.clone()))?;

    if !opts.leave_new {
        fs::remove_file(&intermediate).map_err(io_err("remove", intermediate.clone()))?;
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use crate::models::{StreamProps, Track, TrackJob, TrackType, DTS_CODEC_ID};
    use tempfile::tempdir;

    fn reporter() -> Reporter {
        Reporter::new(false, true, false)
    }

    fn context(source_dir: &std::path::Path, work_dir: &std::path::Path) -> JobContext {
        let source = source_dir.join("Movie.mkv");
        std::fs::write(&source, b"matroska").unwrap();

        let mut ctx = JobContext::new(source, work_dir.to_path_buf());
        let track = Track::new(1, TrackType::Audio, StreamProps::new(DTS_CODEC_ID));
        ctx.tracks = vec![track.clone()];
        ctx.selected = vec![TrackJob::new(track, work_dir, "Movie")];
        ctx
    }

    #[test]
    fn external_mode_copies_next_to_original() {
        let films = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ctx = context(films.path(), work.path());
        std::fs::write(&ctx.selected[0].ac3_path, b"ac3 payload").unwrap();

        let runner = CommandRunner::new(RunMode::Execute, reporter());
        let copies = copy_external(&runner, reporter(), &ctx).unwrap();

        assert_eq!(copies, vec![films.path().join("Movie.1.ac3")]);
        assert!(copies[0].is_file());
        // Working copy is consumed, original container untouched.
        assert!(!ctx.selected[0].ac3_path.exists());
        assert_eq!(std::fs::read(&ctx.source).unwrap(), b"matroska");
    }

    #[test]
    fn external_mode_handles_multiple_tracks() {
        let films = tempdir().unwrap();
        let work = tempdir().unwrap();
        let mut ctx = context(films.path(), work.path());
        let second = Track::new(3, TrackType::Audio, StreamProps::new(DTS_CODEC_ID));
        ctx.selected.push(TrackJob::new(second, work.path(), "Movie"));
        for job in &ctx.selected {
            std::fs::write(&job.ac3_path, b"ac3").unwrap();
        }

        let runner = CommandRunner::new(RunMode::Execute, reporter());
        let copies = copy_external(&runner, reporter(), &ctx).unwrap();

        assert_eq!(copies.len(), 2);
        assert!(films.path().join("Movie.1.ac3").is_file());
        assert!(films.path().join("Movie.3.ac3").is_file());
    }

    #[test]
    fn external_dry_run_touches_nothing() {
        let films = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ctx = context(films.path(), work.path());

        let runner = CommandRunner::new(RunMode::PrintOnly, reporter());
        let copies = copy_external(&runner, reporter(), &ctx).unwrap();

        assert_eq!(copies.len(), 1);
        assert!(!copies[0].exists());
    }

    #[test]
    fn remux_dry_run_reports_destination_without_running() {
        let films = tempdir().unwrap();
        let work = tempdir().unwrap();
        let ctx = context(films.path(), work.path());

        let runner = CommandRunner::new(RunMode::PrintOnly, reporter());

        let replace = remux(&runner, reporter(), &ctx, &Options::default()).unwrap();
        assert_eq!(replace, ctx.source);

        let opts = Options {
            copy_new: true,
            ..Options::default()
        };
        let adjacent = remux(&runner, reporter(), &ctx, &opts).unwrap();
        assert_eq!(adjacent, films.path().join("Movie.new.mkv"));
    }
}
