//! Pipeline runner: one sequential pass per input file.
//!
//! Per file the stages run strictly forward: Discover ->
//! Extract-Timecodes -> Extract-Tracks -> Transcode -> Publish. A
//! failing stage skips the file with a labeled error; the batch
//! continues with the next file and the overall exit status is
//! unaffected.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::extract::{self, ExtractError, TrackDestination};
use crate::inspect::{self, InspectError, SelectionPolicy};
use crate::io::CommandRunner;
use crate::models::{JobContext, TrackJob};
use crate::mux;
use crate::report::Reporter;
use crate::transcode::{self, ExtraArgs};

use super::errors::{JobError, Stage, StageError};

/// Counts of terminal per-file states after a batch run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// The orchestration pipeline. Holds the resolved options and the
/// shared command runner; all per-file state lives in a [`JobContext`]
/// that is discarded when its file completes.
pub struct Pipeline {
    opts: Options,
    runner: CommandRunner,
    reporter: Reporter,
}

impl Pipeline {
    pub fn new(opts: Options) -> Self {
        let reporter = Reporter::new(opts.color, opts.quiet, opts.verbose);
        let runner = CommandRunner::new(opts.run_mode(), reporter);
        Self {
            opts,
            runner,
            reporter,
        }
    }

    pub fn reporter(&self) -> Reporter {
        self.reporter
    }

    /// Process every input file in order.
    pub fn run_batch(&self, files: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        if self.runner.mode().is_live() {
            if let Err(err) = fs::create_dir_all(&self.opts.work_dir) {
                self.reporter.error(&format!(
                    "cannot create working directory {}: {}",
                    self.opts.work_dir.display(),
                    err
                ));
                summary.skipped = files.len();
                return summary;
            }
        }

        for file in files {
            self.reporter
                .info(&format!("Processing \"{}\"...", file.display()));
            match self.process_file(file) {
                Ok(()) => summary.completed += 1,
                Err(err) => {
                    self.reporter.error(&format!("{}. Skipping...", err));
                    summary.skipped += 1;
                }
            }
        }

        summary
    }

    fn process_file(&self, path: &Path) -> Result<(), JobError> {
        let file = path.display().to_string();
        let fail = |stage: Stage| {
            let file = file.clone();
            move |source: StageError| JobError::new(file, stage, source)
        };

        let mut ctx = self.discover(path).map_err(fail(Stage::Discover))?;
        self.extract_timecodes(&mut ctx)
            .map_err(fail(Stage::Timecodes))?;
        self.extract_raw_tracks(&ctx).map_err(fail(Stage::Extract))?;
        self.transcode_tracks(&mut ctx)
            .map_err(fail(Stage::Transcode))?;
        self.publish(&ctx).map_err(fail(Stage::Publish))?;
        Ok(())
    }

    /// Inspect the container, check the force gate, and select the
    /// tracks to convert.
    fn discover(&self, path: &Path) -> Result<JobContext, StageError> {
        self.reporter.debug(&format!(
            "$ {} -J {}",
            inspect::INSPECT_TOOL,
            path.display()
        ));
        let tracks = inspect::identify(path)?;

        let mut ctx = JobContext::new(path.to_path_buf(), self.opts.work_dir.clone());
        self.reporter.debug(&format!("title = {}", ctx.title));
        for track in &tracks {
            self.reporter.debug(&format!("found {}", track.display_name()));
        }

        if !self.opts.force && inspect::has_converted_track(&tracks) {
            return Err(InspectError::AlreadyConverted.into());
        }

        let policy = SelectionPolicy::from_options(&self.opts);
        let selected: Vec<TrackJob> = inspect::select(&tracks, policy)?
            .into_iter()
            .map(|track| TrackJob::new(track.clone(), &ctx.work_dir, &ctx.title))
            .collect();

        let ids: Vec<String> = selected.iter().map(|j| j.track.id.to_string()).collect();
        self.reporter
            .debug(&format!("using track id(s) {}", ids.join(", ")));

        ctx.tracks = tracks;
        ctx.selected = selected;
        Ok(ctx)
    }

    /// Pull per-track timecodes in one pass and read the initial delay
    /// out of each file. Dry runs produce no files and use delay 0.
    fn extract_timecodes(&self, ctx: &mut JobContext) -> Result<(), StageError> {
        self.reporter.info("Extracting timecodes...");
        let dests: Vec<TrackDestination> = ctx
            .selected
            .iter()
            .map(|job| TrackDestination::new(job.track.id, job.tc_path.clone()))
            .collect();
        extract::extract_timecodes(&self.runner, &ctx.source, &dests)?;

        let live = self.runner.mode().is_live();
        for job in &mut ctx.selected {
            job.delay_ms = if live {
                let delay = extract::read_initial_delay(&job.tc_path)?;
                // The timecode file is consumed once the delay is read.
                fs::remove_file(&job.tc_path).map_err(|source| ExtractError::Io {
                    path: job.tc_path.clone(),
                    source,
                })?;
                delay
            } else {
                0
            };
            self.reporter
                .debug(&format!("track {} delay = {}ms", job.track.id, job.delay_ms));
        }
        Ok(())
    }

    /// Pull the raw DTS payloads in one pass; every requested track
    /// must produce its output file.
    fn extract_raw_tracks(&self, ctx: &JobContext) -> Result<(), StageError> {
        self.reporter.info("Extracting DTS tracks...");
        let dests: Vec<TrackDestination> = ctx
            .selected
            .iter()
            .map(|job| TrackDestination::new(job.track.id, job.dts_path.clone()))
            .collect();
        extract::extract_tracks(&self.runner, &ctx.source, &dests)?.into_result()?;
        Ok(())
    }

    /// Run the decode/encode pipe for each selected track.
    fn transcode_tracks(&self, ctx: &mut JobContext) -> Result<(), StageError> {
        self.reporter.info("Converting DTS to AC3...");
        let dcadec_extra = ExtraArgs::parse(&self.opts.dcadec_args).map_err(StageError::Transcode)?;
        let aften_extra = ExtraArgs::parse(&self.opts.aften_args).map_err(StageError::Transcode)?;

        for job in &mut ctx.selected {
            self.reporter.debug(&format!(
                "track {} to \"{}\"",
                job.track.id,
                job.ac3_path.display()
            ));
            transcode::convert_track(
                &self.runner,
                job,
                &dcadec_extra,
                &aften_extra,
                self.opts.keep_dts,
            )?;
        }
        Ok(())
    }

    /// Publish the converted tracks: external copies or a full remux.
    fn publish(&self, ctx: &JobContext) -> Result<(), StageError> {
        if self.opts.keep_external {
            self.reporter.info("Copying AC3 files to MKV directory...");
            mux::copy_external(&self.runner, self.reporter, ctx)?;
        } else {
            let noun = if ctx.selected.len() == 1 {
                "track"
            } else {
                "tracks"
            };
            self.reporter
                .info(&format!("Muxing new {} together with original...", noun));
            mux::remux(&self.runner, self.reporter, ctx, &self.opts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_pipeline(opts: Options) -> Pipeline {
        Pipeline::new(Options {
            quiet: true,
            color: false,
            ..opts
        })
    }

    #[test]
    fn missing_file_is_skipped_not_fatal() {
        let pipeline = quiet_pipeline(Options::default());
        let summary = pipeline.run_batch(&[PathBuf::from("/no/such/Movie.mkv")]);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn wrong_extension_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.avi");
        std::fs::write(&path, b"not matroska").unwrap();

        let pipeline = quiet_pipeline(Options::default());
        let summary = pipeline.run_batch(&[path]);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn batch_continues_past_failing_files() {
        let dir = tempfile::tempdir().unwrap();
        let bad_ext = dir.path().join("movie.avi");
        std::fs::write(&bad_ext, b"").unwrap();

        let pipeline = quiet_pipeline(Options::default());
        let summary = pipeline.run_batch(&[
            PathBuf::from("/no/such/first.mkv"),
            bad_ext,
            PathBuf::from("/no/such/last.mkv"),
        ]);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.completed, 0);
    }

    #[test]
    fn discovery_failure_names_the_stage() {
        let pipeline = quiet_pipeline(Options::default());
        let err = pipeline
            .process_file(Path::new("/no/such/Movie.mkv"))
            .unwrap_err();
        assert_eq!(err.stage, Stage::Discover);
        assert!(err.to_string().contains("discovery"));
    }
}
