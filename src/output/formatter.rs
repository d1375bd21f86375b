//! Console messages for the command-line front end.
//!
//! Logging goes through `tracing`; this formatter only prints what the user
//! asked for (session listings, export summaries, warnings), honouring quiet
//! and verbose modes.
//!
//! # Examples
//!
//! ```
//! use vkrpack::output::{MessageLevel, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(false, false);
//! assert_eq!(formatter.render(MessageLevel::Warning, "No title page"), "⚠ No title page");
//! ```

use std::io::{self, IsTerminal};

use crate::config::Config;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Verbose detail.
    Debug,
}

impl MessageLevel {
    fn prefix(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
            Self::Error => "✗ ",
            Self::Debug => "→ ",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "\x1b[32m",
            Self::Warning => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Debug => "\x1b[36m",
        }
    }

    /// Warnings and errors go to stderr.
    fn is_diagnostic(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

/// Output formatter with configurable verbosity.
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: false,
        }
    }

    /// Create a formatter from configuration, colouring terminal output.
    pub fn from_config(config: &Config) -> Self {
        Self {
            colored: io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            ..Self::new(config.quiet, config.verbose)
        }
    }

    /// Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        self.emit(MessageLevel::Info, message);
    }

    /// Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        self.emit(MessageLevel::Success, message);
    }

    /// Always displayed.
    pub fn warning(&self, message: &str) {
        self.emit(MessageLevel::Warning, message);
    }

    /// Always displayed.
    pub fn error(&self, message: &str) {
        self.emit(MessageLevel::Error, message);
    }

    /// Only displayed in verbose mode.
    pub fn debug(&self, message: &str) {
        self.emit(MessageLevel::Debug, message);
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print an aligned `label: value` line. Suppressed in quiet mode.
    pub fn detail(&self, label: &str, value: &str) {
        if !self.quiet {
            println!("  {label:<10} {value}");
        }
    }

    /// Print a numbered list item (1-based). Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    /// Whether a message of this level is printed at all.
    pub fn is_shown(&self, level: MessageLevel) -> bool {
        match level {
            MessageLevel::Warning | MessageLevel::Error => true,
            MessageLevel::Debug => self.verbose && !self.quiet,
            MessageLevel::Info | MessageLevel::Success => !self.quiet,
        }
    }

    /// Text of a message as it would be printed.
    pub fn render(&self, level: MessageLevel, message: &str) -> String {
        let color = level.color();
        if self.colored && !color.is_empty() {
            format!("{color}{}{message}\x1b[0m", level.prefix())
        } else {
            format!("{}{message}", level.prefix())
        }
    }

    fn emit(&self, level: MessageLevel, message: &str) {
        if !self.is_shown(level) {
            return;
        }

        let line = self.render(level, message);
        if level.is_diagnostic() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}
