//! Progress reporting for terminal output.
//!
//! Live per-file status while comments are generated: waiting, in
//! flight, done or failed. Output goes to stderr and is suppressed for
//! non-terminal or JSON output.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use colored::Colorize;
use indexmap::IndexMap;

/// Status of one file's generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, waiting for a concurrency slot.
    Pending,
    /// Request in flight.
    InProgress,
    Done,
    /// Failed; carries a short reason.
    Failed(String),
}

/// Tracks and renders live progress for per-file generation.
///
/// Thread-safe; shared across tasks via `Arc`.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    /// If false, all output is suppressed.
    enabled: bool,
}

struct ProgressState {
    /// file → status, in input order.
    files: IndexMap<String, TaskStatus>,
    /// Number of lines last printed (for clearing).
    rendered_lines: usize,
    /// What is being produced, for the header.
    action: String,
}

impl ProgressTracker {
    /// Create a tracker for `files`; `action` labels the header line.
    pub fn new(files: &[String], action: impl Into<String>, enabled: bool) -> Self {
        let files = files
            .iter()
            .map(|f| (f.clone(), TaskStatus::Pending))
            .collect();
        Self {
            inner: Mutex::new(ProgressState {
                files,
                rendered_lines: 0,
                action: action.into(),
            }),
            enabled,
        }
    }

    /// A tracker that records state but never prints.
    pub fn silent(files: &[String]) -> Self {
        Self::new(files, "", false)
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Update the status of a file and re-render.
    pub fn update(&self, file: &str, status: TaskStatus) {
        let mut state = self.state();
        state.files.insert(file.to_string(), status);
        if self.enabled {
            Self::render(&mut state);
        }
    }

    /// Current status of a file.
    pub fn status(&self, file: &str) -> Option<TaskStatus> {
        self.state().files.get(file).cloned()
    }

    /// Print the initial header and file listing.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::render(&mut state);
    }

    /// Clear the live display and print one final line per file.
    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::clear_lines(state.rendered_lines);
        state.rendered_lines = 0;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let mut failed = 0;
        for (file, status) in &state.files {
            let (icon, status_text) = match status {
                TaskStatus::Failed(reason) => {
                    failed += 1;
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
                _ => ("✔".green().bold().to_string(), "done".green().to_string()),
            };
            let _ = writeln!(handle, "  {icon} {} {status_text}", file.dimmed());
        }
        let _ = writeln!(handle);
        if failed > 0 {
            let _ = writeln!(
                handle,
                "  {} {}",
                "⚠".yellow().bold(),
                format!("{failed} file(s) could not be processed").yellow()
            );
        }
        let _ = handle.flush();
    }

    /// Render the current state to stderr, clearing previous output.
    fn render(state: &mut ProgressState) {
        Self::clear_lines(state.rendered_lines);

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(
            handle,
            "  {} {} {} file(s)",
            "▸".cyan().bold(),
            state.action,
            state.files.len(),
        );
        let mut lines = 1;

        for (file, status) in &state.files {
            let (icon, status_text) = match status {
                TaskStatus::Pending => ("○".dimmed().to_string(), "waiting".dimmed().to_string()),
                TaskStatus::InProgress => {
                    ("◌".cyan().bold().to_string(), "generating…".cyan().to_string())
                }
                TaskStatus::Done => ("✔".green().bold().to_string(), "done".green().to_string()),
                TaskStatus::Failed(reason) => {
                    ("✖".red().bold().to_string(), reason.red().to_string())
                }
            };
            let _ = writeln!(handle, "    {icon} {} {status_text}", file.dimmed());
            lines += 1;
        }

        let _ = handle.flush();
        state.rendered_lines = lines;
    }

    /// Move the cursor up and clear `n` lines.
    fn clear_lines(n: usize) {
        if n == 0 {
            return;
        }
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for _ in 0..n {
            let _ = write!(handle, "\x1b[1A\x1b[2K");
        }
        let _ = handle.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_disabled_no_panic() {
        let tracker = ProgressTracker::new(&["file.rs".to_string()], "Commenting", false);
        tracker.start();
        tracker.update("file.rs", TaskStatus::InProgress);
        tracker.update("file.rs", TaskStatus::Done);
        tracker.finish();
    }

    #[test]
    fn tracker_tracks_state() {
        let tracker = ProgressTracker::silent(&["a.rs".to_string(), "b.rs".to_string()]);
        assert_eq!(tracker.status("a.rs"), Some(TaskStatus::Pending));

        tracker.update("a.rs", TaskStatus::InProgress);
        tracker.update("a.rs", TaskStatus::Done);
        tracker.update("b.rs", TaskStatus::Failed("API error".to_string()));

        assert_eq!(tracker.status("a.rs"), Some(TaskStatus::Done));
        assert!(matches!(tracker.status("b.rs"), Some(TaskStatus::Failed(_))));
        assert_eq!(tracker.status("missing.rs"), None);
    }

    #[test]
    fn tracker_keeps_input_order() {
        let tracker = ProgressTracker::silent(&["z.rs".to_string(), "a.rs".to_string()]);
        let state = tracker.state();
        assert_eq!(state.files.keys().collect::<Vec<_>>(), vec!["z.rs", "a.rs"]);
    }
}
