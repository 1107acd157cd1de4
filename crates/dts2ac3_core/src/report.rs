//! Labeled console output with optional color.
//!
//! All user-facing messages go through a [`Reporter`]: a labeled,
//! optionally colorized line per event. Quiet mode suppresses every
//! message; debug lines additionally require verbose mode. Library
//! internals use `tracing` instead - this type is only for output the
//! operator is meant to read.

const RED: &str = "\x1b[1;31m";
const BLUE: &str = "\x1b[1;34m";
const YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

/// Console reporter carrying the active display options.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
    quiet: bool,
    verbose: bool,
}

impl Reporter {
    pub fn new(color: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            color,
            quiet,
            verbose,
        }
    }

    /// Whether verbose diagnostics are enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Print an informational message.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.paint(BLUE, "INFO:"), message);
        }
    }

    /// Print a non-fatal warning.
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.paint(RED, "WARNING:"), message);
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.paint(RED, "ERROR:"), message);
        }
    }

    /// Print a step-level diagnostic. Only emitted in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.is_verbose() {
            println!("{} {}", self.paint(YELLOW, "DEBUG:"), message);
        }
    }

    fn paint(&self, code: &str, label: &str) -> String {
        if self.color {
            format!("{}{}{}", code, label, RESET)
        } else {
            label.to_string()
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_wraps_label_when_color_enabled() {
        let reporter = Reporter::new(true, false, false);
        let painted = reporter.paint(BLUE, "INFO:");
        assert!(painted.starts_with(BLUE));
        assert!(painted.ends_with(RESET));
    }

    #[test]
    fn paint_is_plain_when_monochrome() {
        let reporter = Reporter::new(false, false, false);
        assert_eq!(reporter.paint(RED, "ERROR:"), "ERROR:");
    }

    #[test]
    fn verbose_requires_not_quiet() {
        assert!(Reporter::new(true, false, true).is_verbose());
        assert!(!Reporter::new(true, true, true).is_verbose());
        assert!(!Reporter::new(true, false, false).is_verbose());
    }
}
