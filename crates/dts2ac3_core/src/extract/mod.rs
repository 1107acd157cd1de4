//! mkvextract invocations for timecodes and raw track payloads.
//!
//! Both extraction steps cover all selected tracks of a file in a
//! single tool invocation, expressed as a set of (track id ->
//! destination) pairs. Track extraction reports per-track success so a
//! silently missing output fails that track instead of surfacing later
//! as an opaque missing-file error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::{CommandRunner, RunnerError};

/// Tool used for all extraction work.
pub const EXTRACT_TOOL: &str = "mkvextract";

/// Errors from the extraction stages.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("track {track_id}: expected output missing after extraction: {path}")]
    OutputMissing { track_id: u64, path: PathBuf },

    #[error("timecode file {path}: {message}")]
    BadTimecodes { path: PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One (track id -> destination) pair of an extraction request.
#[derive(Debug, Clone)]
pub struct TrackDestination {
    pub track_id: u64,
    pub path: PathBuf,
}

impl TrackDestination {
    pub fn new(track_id: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            track_id,
            path: path.into(),
        }
    }

    fn spec(&self) -> String {
        format!("{}:{}", self.track_id, self.path.display())
    }
}

/// Per-track outcome of a batched extraction.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub completed: Vec<u64>,
    pub missing: Vec<(u64, PathBuf)>,
}

impl ExtractionReport {
    pub fn all_completed(&self) -> bool {
        self.missing.is_empty()
    }

    /// Collapse the per-track map into a single result; the first
    /// missing output fails the file.
    pub fn into_result(self) -> Result<Vec<u64>, ExtractError> {
        match self.missing.into_iter().next() {
            None => Ok(self.completed),
            Some((track_id, path)) => Err(ExtractError::OutputMissing { track_id, path }),
        }
    }
}

/// Extract v2 timecode files for all requested tracks in one pass.
pub fn extract_timecodes(
    runner: &CommandRunner,
    source: &Path,
    dests: &[TrackDestination],
) -> Result<(), ExtractError> {
    if dests.is_empty() {
        return Ok(());
    }
    let args = build_args(source, "timestamps_v2", dests);
    runner.run_checked(EXTRACT_TOOL, &args)?;
    Ok(())
}

/// Extract raw track payloads for all requested tracks in one pass,
/// reporting success or failure per track.
pub fn extract_tracks(
    runner: &CommandRunner,
    source: &Path,
    dests: &[TrackDestination],
) -> Result<ExtractionReport, ExtractError> {
    let mut report = ExtractionReport::default();
    if dests.is_empty() {
        return Ok(report);
    }

    let args = build_args(source, "tracks", dests);
    let outcome = runner.run_checked(EXTRACT_TOOL, &args)?;

    if outcome.is_none() {
        // Dry run: nothing was written, nothing to verify.
        report.completed = dests.iter().map(|d| d.track_id).collect();
        return Ok(report);
    }

    for dest in dests {
        if dest.path.is_file() {
            report.completed.push(dest.track_id);
        } else {
            report.missing.push((dest.track_id, dest.path.clone()));
        }
    }
    Ok(report)
}

/// Read the initial delay in milliseconds from a v2 timecode file.
///
/// The first line is a format header; the second line is the first
/// timestamp. mkvextract writes fractional milliseconds, so the value
/// is rounded to integer precision.
pub fn read_initial_delay(path: &Path) -> Result<i64, ExtractError> {
    let content = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = content.lines();
    if lines.next().is_none() {
        return Err(ExtractError::BadTimecodes {
            path: path.to_path_buf(),
            message: "file is empty".to_string(),
        });
    }
    let line = lines.next().ok_or_else(|| ExtractError::BadTimecodes {
        path: path.to_path_buf(),
        message: "missing initial timestamp line".to_string(),
    })?;

    let value: f64 = line.trim().parse().map_err(|_| ExtractError::BadTimecodes {
        path: path.to_path_buf(),
        message: format!("non-numeric initial timestamp '{}'", line.trim()),
    })?;

    Ok(value.round() as i64)
}

fn build_args(source: &Path, mode: &str, dests: &[TrackDestination]) -> Vec<String> {
    let mut args = Vec::with_capacity(dests.len() + 2);
    args.push(source.display().to_string());
    args.push(mode.to_string());
    args.extend(dests.iter().map(TrackDestination::spec));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use crate::report::Reporter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dry_runner() -> CommandRunner {
        CommandRunner::new(RunMode::PrintOnly, Reporter::new(false, true, false))
    }

    fn delay_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn args_carry_one_spec_per_track() {
        let dests = vec![
            TrackDestination::new(1, "/tmp/Movie.1.tc"),
            TrackDestination::new(3, "/tmp/Movie.3.tc"),
        ];
        let args = build_args(Path::new("Movie.mkv"), "timestamps_v2", &dests);
        assert_eq!(
            args,
            vec![
                "Movie.mkv".to_string(),
                "timestamps_v2".to_string(),
                "1:/tmp/Movie.1.tc".to_string(),
                "3:/tmp/Movie.3.tc".to_string(),
            ]
        );
    }

    #[test]
    fn dry_run_counts_everything_completed() {
        let dests = vec![TrackDestination::new(1, "/nowhere/Movie.1.dts")];
        let report = extract_tracks(&dry_runner(), Path::new("Movie.mkv"), &dests).unwrap();
        assert!(report.all_completed());
        assert_eq!(report.into_result().unwrap(), vec![1]);
    }

    #[test]
    fn empty_request_is_a_noop() {
        let report = extract_tracks(&dry_runner(), Path::new("Movie.mkv"), &[]).unwrap();
        assert!(report.all_completed());
        extract_timecodes(&dry_runner(), Path::new("Movie.mkv"), &[]).unwrap();
    }

    #[test]
    fn report_surfaces_first_missing_output() {
        let report = ExtractionReport {
            completed: vec![1],
            missing: vec![(3, PathBuf::from("/tmp/Movie.3.dts"))],
        };
        match report.into_result() {
            Err(ExtractError::OutputMissing { track_id, .. }) => assert_eq!(track_id, 3),
            other => panic!("expected OutputMissing, got {:?}", other),
        }
    }

    #[test]
    fn reads_integer_delay() {
        let file = delay_file("# timestamp format v2\n750\n792\n");
        assert_eq!(read_initial_delay(file.path()).unwrap(), 750);
    }

    #[test]
    fn rounds_fractional_delay() {
        let file = delay_file("# timestamp format v2\n41.708333\n83.416666\n");
        assert_eq!(read_initial_delay(file.path()).unwrap(), 42);
    }

    #[test]
    fn missing_timestamp_line_is_an_error() {
        let file = delay_file("# timestamp format v2\n");
        assert!(matches!(
            read_initial_delay(file.path()),
            Err(ExtractError::BadTimecodes { .. })
        ));
    }

    #[test]
    fn non_numeric_delay_is_an_error() {
        let file = delay_file("# timestamp format v2\nnot-a-number\n");
        assert!(matches!(
            read_initial_delay(file.path()),
            Err(ExtractError::BadTimecodes { .. })
        ));
    }
}
