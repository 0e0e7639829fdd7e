//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

/// Banner with ANSI styling for clap help output.
pub const BANNER_STYLED: &str =
    "\x1b[1mtekshila\x1b[0m \x1b[2m· AI-generated READMEs, inline comments and code quality reports.\x1b[0m";

/// Print the banner with a one-line description of the run to stderr.
pub fn print_banner(action: &str) {
    use colored::Colorize;
    use std::io::Write;
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "  {} {}",
        "tekshila".bold(),
        format!("· {action}").dimmed(),
    );
    let _ = writeln!(handle);
    let _ = handle.flush();
}
