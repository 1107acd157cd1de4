//! Effective option set and startup validation.
//!
//! Precedence is command line > user config file > built-in defaults.
//! The resolved value is immutable after validation and is passed by
//! reference into every pipeline component.

use std::path::PathBuf;

use super::file::FileSettings;

/// How subprocess invocations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Run every command normally.
    #[default]
    Execute,
    /// Print every command, execute nothing, touch no file.
    PrintOnly,
    /// Print each command and wait for confirmation before running it.
    StepConfirm,
}

impl RunMode {
    /// Whether subprocesses and filesystem side effects actually happen.
    pub fn is_live(&self) -> bool {
        !matches!(self, RunMode::PrintOnly)
    }
}

/// The effective, merged option set.
#[derive(Debug, Clone)]
pub struct Options {
    /// Convert every DTS track instead of only the first.
    pub parse_all: bool,
    /// Custom title for converted tracks.
    pub custom_title: Option<String>,
    /// Mark the first converted track as default.
    pub mark_default: bool,
    /// External-only mode: copy converted files next to the original,
    /// never remux.
    pub keep_external: bool,
    /// Process even when an AC3 track already exists in the file.
    pub force: bool,
    /// Place converted tracks first in the output file.
    pub initial: bool,
    /// Retain the extracted DTS file (implies `no_dts`).
    pub keep_dts: bool,
    /// Leave the intermediate container in the working directory.
    pub leave_new: bool,
    /// Do not carry the original DTS track into the output.
    pub no_dts: bool,
    /// Write a new adjacent file instead of replacing the original.
    pub copy_new: bool,
    /// Explicit track id to convert.
    pub track_id: Option<u64>,
    /// Working directory for temporary artifacts.
    pub work_dir: PathBuf,
    /// Extra `key=value` arguments for the encoder.
    pub aften_args: Vec<String>,
    /// Extra `key=value` arguments for the decoder.
    pub dcadec_args: Vec<String>,
    /// Dry-run: print commands only.
    pub dry_run: bool,
    /// Dry-run: confirm each command before running.
    pub step: bool,
    /// Colorized output.
    pub color: bool,
    /// Suppress all terminal output.
    pub quiet: bool,
    /// Step-level diagnostics, including constructed command lines.
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            parse_all: false,
            custom_title: None,
            mark_default: false,
            keep_external: false,
            force: false,
            initial: false,
            keep_dts: false,
            leave_new: false,
            no_dts: false,
            copy_new: false,
            track_id: None,
            work_dir: std::env::temp_dir(),
            aften_args: Vec::new(),
            dcadec_args: Vec::new(),
            dry_run: false,
            step: false,
            color: true,
            quiet: false,
            verbose: false,
        }
    }
}

/// Outcome of option validation: every violation found, not just the
/// first one.
#[derive(Debug, Default)]
pub struct Validation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Options {
    /// Overlay values from the user config file onto the defaults.
    pub fn apply_file(&mut self, file: &FileSettings) {
        if let Some(all) = file.all {
            self.parse_all = all;
        }
        if let Some(ref custom) = file.custom {
            self.custom_title = Some(custom.clone());
        }
        if let Some(default) = file.default {
            self.mark_default = default;
        }
        if let Some(external) = file.external {
            self.keep_external = external;
        }
        if let Some(force) = file.force {
            self.force = force;
        }
        if let Some(initial) = file.initial {
            self.initial = initial;
        }
        if let Some(keep) = file.keep {
            self.keep_dts = keep;
        }
        if let Some(leave) = file.leave {
            self.leave_new = leave;
        }
        if let Some(no_dts) = file.no_dts {
            self.no_dts = no_dts;
        }
        if let Some(new) = file.new {
            self.copy_new = new;
        }
        if let Some(track) = file.track {
            self.track_id = Some(track);
        }
        if let Some(ref wd) = file.wd {
            self.work_dir = wd.clone();
        }
        if let Some(ref aften) = file.aften {
            self.aften_args = aften.clone();
        }
        if let Some(ref dcadec) = file.dcadec {
            self.dcadec_args = dcadec.clone();
        }
        if let Some(color) = file.color {
            self.color = color;
        }
        if let Some(quiet) = file.quiet {
            self.quiet = quiet;
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }
    }

    /// Normalize flag interactions and collect every validation
    /// violation. Must be called once before the pipeline starts.
    pub fn validate(&mut self, input_count: usize) -> Validation {
        let mut result = Validation::default();

        // Retaining the DTS externally means the track itself leaves
        // the container.
        if self.keep_dts {
            self.no_dts = true;
        }

        if self.no_dts && self.keep_external {
            result
                .errors
                .push("options `--external` and `--no-dts` are mutually exclusive".to_string());
        }
        if self.quiet && self.verbose {
            result
                .errors
                .push("options `--quiet` and `--verbose` are mutually exclusive".to_string());
        }
        if self.dry_run && self.step {
            result
                .errors
                .push("options `--dry-run` and `--step` are mutually exclusive".to_string());
        }
        if input_count == 0 {
            result
                .errors
                .push("at least one input file is required".to_string());
        }

        if let Some(id) = self.track_id {
            if self.parse_all {
                result
                    .warnings
                    .push(format!("`--track {}` overrides `--all`", id));
            }
        }
        if self.mark_default && self.keep_external {
            result
                .warnings
                .push("`--external` overrides `--default`".to_string());
        }
        if self.custom_title.is_some() && self.keep_external {
            result
                .warnings
                .push("`--custom` has no effect with `--external`".to_string());
        }

        for pair in self.dcadec_args.iter().chain(self.aften_args.iter()) {
            if !is_key_value(pair) {
                result
                    .errors
                    .push(format!("malformed key=value override: '{}'", pair));
            }
        }

        result
    }

    /// The execution mode implied by the dry-run flags.
    pub fn run_mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::PrintOnly
        } else if self.step {
            RunMode::StepConfirm
        } else {
            RunMode::Execute
        }
    }
}

fn is_key_value(pair: &str) -> bool {
    match pair.split_once('=') {
        Some((key, _)) => !key.is_empty(),
        None => false,
    }
}
