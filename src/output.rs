// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal and quiet (CI) modes, with elapsed time on success.

use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Progress messages and results
    Normal,
    /// Only the final result and errors
    Quiet,
}

/// Handles CLI output based on the configured mode.
#[derive(Debug)]
pub struct Output {
    mode: OutputMode,
    started: Instant,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: Instant::now(),
        }
    }

    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                println!("{message} ({:.1}s)", self.started.elapsed().as_secs_f64())
            }
            OutputMode::Quiet => println!("{message}"),
        }
    }

    pub fn failure(&self, message: &str) {
        eprintln!("{message}");
    }
}
