//! Command runner for external tool invocations.
//!
//! Every mutating subprocess goes through [`CommandRunner`], which
//! logs the constructed command line, applies the active execution
//! mode (execute / print-only / step-confirm), and captures output.
//! Exit statuses are surfaced to callers; nothing is silently ignored.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::RunMode;
use crate::report::Reporter;

/// Captured output of a completed command.
#[derive(Debug)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Exit statuses and diagnostics of a two-process pipe.
#[derive(Debug)]
pub struct PairOutput {
    pub first_exit: i32,
    pub second_exit: i32,
    pub first_stderr: String,
    pub second_stderr: String,
}

/// Errors from launching or waiting on external tools.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("could not connect pipe from {tool}")]
    Pipe { tool: String },

    #[error("declined by operator: {tool}")]
    Declined { tool: String },

    #[error("failed to read confirmation: {0}")]
    Prompt(#[source] io::Error),
}

/// Runs external tools under the active execution mode.
pub struct CommandRunner {
    mode: RunMode,
    reporter: Reporter,
}

impl CommandRunner {
    pub fn new(mode: RunMode, reporter: Reporter) -> Self {
        Self { mode, reporter }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Run a command to completion, capturing its output.
    ///
    /// Returns `Ok(None)` when the execution mode skipped the command
    /// (print-only). The exit status is reported as-is; use
    /// [`run_checked`](Self::run_checked) when any nonzero code is an
    /// error.
    pub fn run(&self, program: &str, args: &[String]) -> Result<Option<CommandOutput>, RunnerError> {
        let rendered = render(program, args);
        self.announce(&rendered);
        if !self.confirm(&rendered)? {
            return Ok(None);
        }

        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RunnerError::Spawn {
                tool: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(tool = program, exit_code = result.exit_code, "command finished");
        Ok(Some(result))
    }

    /// Run a command, treating any nonzero exit status as an error.
    pub fn run_checked(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<Option<CommandOutput>, RunnerError> {
        match self.run(program, args)? {
            None => Ok(None),
            Some(output) if output.success() => Ok(Some(output)),
            Some(output) => Err(RunnerError::CommandFailed {
                tool: program.to_string(),
                exit_code: output.exit_code,
                message: first_line(&output.stderr),
            }),
        }
    }

    /// Run two concurrent processes joined by a byte stream: the first
    /// process's stdout feeds the second's stdin. Both exit statuses
    /// are awaited and returned for the caller to judge.
    pub fn run_piped(
        &self,
        first_program: &str,
        first_args: &[String],
        second_program: &str,
        second_args: &[String],
    ) -> Result<Option<PairOutput>, RunnerError> {
        let rendered = format!(
            "{} | {}",
            render(first_program, first_args),
            render(second_program, second_args)
        );
        self.announce(&rendered);
        if !self.confirm(&rendered)? {
            return Ok(None);
        }

        let mut first = Command::new(first_program)
            .args(first_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                tool: first_program.to_string(),
                source,
            })?;

        let stream = first.stdout.take().ok_or_else(|| RunnerError::Pipe {
            tool: first_program.to_string(),
        })?;

        let second = Command::new(second_program)
            .args(second_args)
            .stdin(Stdio::from(stream))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                tool: second_program.to_string(),
                source,
            })?;

        // The second process drains the pipe while we wait on the
        // first, so neither side can stall the other.
        let first_output = first.wait_with_output().map_err(|source| RunnerError::Spawn {
            tool: first_program.to_string(),
            source,
        })?;
        let second_output = second
            .wait_with_output()
            .map_err(|source| RunnerError::Spawn {
                tool: second_program.to_string(),
                source,
            })?;

        let result = PairOutput {
            first_exit: first_output.status.code().unwrap_or(-1),
            second_exit: second_output.status.code().unwrap_or(-1),
            first_stderr: String::from_utf8_lossy(&first_output.stderr).into_owned(),
            second_stderr: String::from_utf8_lossy(&second_output.stderr).into_owned(),
        };
        tracing::debug!(
            first = first_program,
            second = second_program,
            first_exit = result.first_exit,
            second_exit = result.second_exit,
            "pipe finished"
        );
        Ok(Some(result))
    }

    fn announce(&self, rendered: &str) {
        tracing::debug!(command = rendered, "external command");
        match self.mode {
            RunMode::PrintOnly => self.reporter.info(&format!("$ {}", rendered)),
            _ => self.reporter.debug(&format!("$ {}", rendered)),
        }
    }

    /// Apply the execution mode. Returns false when the command should
    /// be skipped, an error when the operator declines.
    fn confirm(&self, rendered: &str) -> Result<bool, RunnerError> {
        match self.mode {
            RunMode::Execute => Ok(true),
            RunMode::PrintOnly => Ok(false),
            RunMode::StepConfirm => {
                print!("$ {}\nrun this command? [Y/n] ", rendered);
                io::stdout().flush().map_err(RunnerError::Prompt)?;
                let mut answer = String::new();
                io::stdin()
                    .read_line(&mut answer)
                    .map_err(RunnerError::Prompt)?;
                if answer.trim_start().starts_with(['n', 'N']) {
                    Err(RunnerError::Declined {
                        tool: rendered.to_string(),
                    })
                } else {
                    Ok(true)
                }
            }
        }
    }
}

fn render(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn print_only_skips_execution() {
        let runner = CommandRunner::new(RunMode::PrintOnly, Reporter::new(false, true, false));
        let outcome = runner
            .run("definitely-not-a-real-tool", &args(&["--flag"]))
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn print_only_skips_pipes_too() {
        let runner = CommandRunner::new(RunMode::PrintOnly, Reporter::new(false, true, false));
        let outcome = runner
            .run_piped("no-decoder", &args(&["in.dts"]), "no-encoder", &args(&["-"]))
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let runner = CommandRunner::new(RunMode::Execute, Reporter::new(false, true, false));
        let result = runner.run("dts2ac3-no-such-binary", &args(&[]));
        assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    }

    #[test]
    fn render_joins_program_and_args() {
        assert_eq!(render("mkvextract", &args(&["in.mkv", "tracks"])), "mkvextract in.mkv tracks");
        assert_eq!(render("mkvmerge", &[]), "mkvmerge");
    }

    #[test]
    fn first_line_trims_diagnostics() {
        assert_eq!(first_line("Error: bad file\nmore context\n"), "Error: bad file");
        assert_eq!(first_line(""), "");
    }
}
