//! dts2ac3 command-line entry point.
//!
//! Resolves the effective options (defaults, then the user defaults
//! file, then command-line flags), validates them, and hands the input
//! files to the core pipeline. Exit status is nonzero only for
//! configuration failures; per-file errors are logged and skipped.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use dts2ac3_core::config::{FileSettings, Options};
use dts2ac3_core::orchestrator::Pipeline;
use dts2ac3_core::report::Reporter;

#[derive(Debug, Parser)]
#[command(
    name = "dts2ac3",
    version,
    about = "Batch-convert DTS audio tracks in Matroska files to AC3"
)]
struct Cli {
    /// Convert all DTS tracks in the file.
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Custom title for the converted AC3 track.
    #[arg(short = 'c', long = "custom", value_name = "TITLE")]
    custom: Option<String>,

    /// Mark the first converted AC3 track as default.
    #[arg(short = 'd', long = "default")]
    default_track: bool,

    /// Leave the converted track out of the file, next to the
    /// original. Does not modify the original MKV.
    #[arg(short = 'e', long = "external")]
    external: bool,

    /// Process even when an existing AC3 track is detected.
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// Place the converted track first in the output file.
    #[arg(short = 'i', long = "initial")]
    initial: bool,

    /// Retain the extracted DTS file (implies --no-dts).
    #[arg(short = 'k', long = "keep")]
    keep: bool,

    /// Leave the intermediate container in the working directory.
    #[arg(short = 'l', long = "leave")]
    leave: bool,

    /// Do not carry the original DTS track into the output.
    #[arg(short = 'n', long = "no-dts")]
    no_dts: bool,

    /// Do not replace the original; create a new adjacent file.
    #[arg(long = "new")]
    new: bool,

    /// Convert only the given track id.
    #[arg(short = 't', long = "track", value_name = "ID")]
    track: Option<u64>,

    /// Working directory for temporary files.
    #[arg(short = 'w', long = "wd", value_name = "DIR")]
    wd: Option<PathBuf>,

    /// Extra key=value argument for the aften encoder (repeatable).
    #[arg(short = 'A', value_name = "KEY=VALUE")]
    aften: Vec<String>,

    /// Extra key=value argument for the dcadec decoder (repeatable).
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    dcadec: Vec<String>,

    /// Print every command without executing anything.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Print each command and confirm before running it.
    #[arg(long = "step")]
    step: bool,

    /// Monochrome output.
    #[arg(short = 'm', long = "no-color")]
    no_color: bool,

    /// Output nothing to the terminal.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose diagnostics, including constructed command lines.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Input Matroska files.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// Merge defaults, file settings, and flags. Flags always win.
fn resolve(cli: &Cli, file: &FileSettings) -> Options {
    let mut opts = Options::default();
    opts.apply_file(file);

    if cli.all {
        opts.parse_all = true;
    }
    if let Some(ref custom) = cli.custom {
        opts.custom_title = Some(custom.clone());
    }
    if cli.default_track {
        opts.mark_default = true;
    }
    if cli.external {
        opts.keep_external = true;
    }
    if cli.force {
        opts.force = true;
    }
    if cli.initial {
        opts.initial = true;
    }
    if cli.keep {
        opts.keep_dts = true;
    }
    if cli.leave {
        opts.leave_new = true;
    }
    if cli.no_dts {
        opts.no_dts = true;
    }
    if cli.new {
        opts.copy_new = true;
    }
    if let Some(track) = cli.track {
        opts.track_id = Some(track);
    }
    if let Some(ref wd) = cli.wd {
        opts.work_dir = wd.clone();
    }
    if !cli.aften.is_empty() {
        opts.aften_args = cli.aften.clone();
    }
    if !cli.dcadec.is_empty() {
        opts.dcadec_args = cli.dcadec.clone();
    }
    if cli.dry_run {
        opts.dry_run = true;
    }
    if cli.step {
        opts.step = true;
    }
    if cli.no_color {
        opts.color = false;
    }
    if cli.quiet {
        opts.quiet = true;
    }
    if cli.verbose {
        opts.verbose = true;
    }

    opts
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let settings = FileSettings::load_default().context("reading user defaults file")?;
    let mut opts = resolve(&cli, &settings);
    let validation = opts.validate(cli.files.len());

    let reporter = Reporter::new(opts.color, opts.quiet, opts.verbose);
    if !opts.quiet {
        println!("dts2ac3 {}", dts2ac3_core::version());
    }

    for warning in &validation.warnings {
        reporter.warn(warning);
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            reporter.error(error);
        }
        return Ok(ExitCode::FAILURE);
    }

    let pipeline = Pipeline::new(opts);
    let summary = pipeline.run_batch(&cli.files);
    pipeline.reporter().info(&format!(
        "{} file(s) completed, {} skipped.",
        summary.completed, summary.skipped
    ));

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_file_settings() {
        let cli = Cli::parse_from(["dts2ac3", "--track", "3", "--no-color", "f.mkv"]);
        let file = FileSettings {
            track: Some(1),
            color: Some(true),
            ..FileSettings::default()
        };
        let opts = resolve(&cli, &file);
        assert_eq!(opts.track_id, Some(3));
        assert!(!opts.color);
    }

    #[test]
    fn file_settings_apply_when_flags_absent() {
        let cli = Cli::parse_from(["dts2ac3", "f.mkv"]);
        let file = FileSettings {
            all: Some(true),
            wd: Some(PathBuf::from("/scratch")),
            quiet: Some(true),
            ..FileSettings::default()
        };
        let opts = resolve(&cli, &file);
        assert!(opts.parse_all);
        assert!(opts.quiet);
        assert_eq!(opts.work_dir, PathBuf::from("/scratch"));
    }

    #[test]
    fn defaults_hold_with_no_file_and_no_flags() {
        let cli = Cli::parse_from(["dts2ac3", "f.mkv"]);
        let opts = resolve(&cli, &FileSettings::default());
        assert!(!opts.parse_all);
        assert!(opts.color);
        assert_eq!(opts.work_dir, std::env::temp_dir());
    }

    #[test]
    fn repeatable_overrides_replace_file_values() {
        let cli = Cli::parse_from(["dts2ac3", "-D", "o=wav6", "-A", "b=640", "f.mkv"]);
        let file = FileSettings {
            dcadec: Some(vec!["o=wavall".to_string()]),
            ..FileSettings::default()
        };
        let opts = resolve(&cli, &file);
        assert_eq!(opts.dcadec_args, vec!["o=wav6".to_string()]);
        assert_eq!(opts.aften_args, vec!["b=640".to_string()]);
    }

    #[test]
    fn validation_flows_through_resolved_options() {
        let cli = Cli::parse_from(["dts2ac3", "-e", "-n", "f.mkv"]);
        let mut opts = resolve(&cli, &FileSettings::default());
        let validation = opts.validate(1);
        assert!(!validation.is_ok());
    }

    #[test]
    fn keep_flag_normalizes_to_no_dts() {
        let cli = Cli::parse_from(["dts2ac3", "-k", "f.mkv"]);
        let mut opts = resolve(&cli, &FileSettings::default());
        let validation = opts.validate(1);
        assert!(validation.is_ok());
        assert!(opts.no_dts);
        assert!(opts.keep_dts);
    }
}
