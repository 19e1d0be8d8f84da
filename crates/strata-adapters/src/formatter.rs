//! Formatter adapters.
//!
//! Formatting is fire-and-forget: the child process is started and left to
//! finish on its own. A missing `dart` executable is logged, never fatal.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use strata_core::application::ports::Formatter;
use tracing::{debug, warn};

/// Runs `dart format` over the written files.
#[derive(Debug, Clone)]
pub struct DartFormatter {
    program: String,
}

impl DartFormatter {
    pub fn new() -> Self {
        Self::with_program("dart")
    }

    /// Use a different executable, e.g. an absolute path to the Dart SDK.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, paths: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("format")
            .args(paths)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Default for DartFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for DartFormatter {
    fn format(&self, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        match self.command(paths).spawn() {
            Ok(child) => debug!(pid = child.id(), files = paths.len(), "formatter started"),
            Err(e) => warn!(program = %self.program, error = %e, "could not start formatter"),
        }
    }
}

/// Formatter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _paths: &[PathBuf]) {}
}
