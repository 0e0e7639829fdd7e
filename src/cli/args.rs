//! Clap argument types and validation.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use tekshila::models::{GenerationResult, PullRequestOutcome, Purpose, QualityReport, Severity};
use tekshila::output::OutputRenderer;
use tekshila::output::json::JsonRenderer;
use tekshila::output::terminal::TerminalRenderer;

/// AI-powered documentation and code quality CLI.
#[derive(Parser, Debug)]
#[command(
    name = "tekshila",
    version = tekshila::constants::VERSION,
    about = super::BANNER_STYLED,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Generate a README or inline comments for source files.
    Generate(Box<GenerateArgs>),

    /// Analyze one source file for quality issues.
    Analyze(AnalyzeArgs),

    /// Open a pull request adding existing files to a repository.
    Publish(PublishArgs),

    /// Inspect the GitHub account behind the configured token.
    Github {
        #[command(subcommand)]
        action: GithubAction,
    },

    /// Print version and build information.
    Version,
}

/// GitHub browsing subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum GithubAction {
    /// Show the authenticated user.
    Whoami,
    /// List repositories the token can see.
    Repos,
    /// List branches of a repository.
    Branches {
        /// Repository as `owner/name`.
        repo: String,
    },
}

/// Arguments for the `generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Source files, or a single `.zip` archive.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// What to generate.
    #[arg(long, value_enum)]
    pub purpose: Purpose,

    /// Project name (required for READMEs).
    #[arg(long)]
    pub project_name: Option<String>,

    /// Extra instructions appended to the prompt.
    #[arg(long, default_value = "")]
    pub instructions: String,

    /// Write results here instead of stdout: a file for READMEs, a
    /// directory for comments, or a `.zip` bundle for comments.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Max concurrent comment generations (overrides config).
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Disable the progress display.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    // --- Pull request ---
    /// Open a pull request with the results on this repository (`owner/name`).
    #[arg(long, requires = "pr_base")]
    pub pr_repo: Option<String>,

    /// Branch the pull request targets.
    #[arg(long, requires = "pr_repo")]
    pub pr_base: Option<String>,

    /// Pull request title.
    #[arg(long, requires = "pr_repo")]
    pub pr_title: Option<String>,

    /// Pull request body.
    #[arg(long, requires = "pr_repo")]
    pub pr_body: Option<String>,

    /// Commit message for every file written.
    #[arg(long, requires = "pr_repo")]
    pub commit_message: Option<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Source file to analyze.
    pub file: PathBuf,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Hide issues below this severity.
    #[arg(long)]
    pub min_severity: Option<Severity>,
}

/// Arguments for the `publish` subcommand.
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Files to add to the repository.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Repository as `owner/name`.
    #[arg(long)]
    pub repo: String,

    /// Branch the pull request targets.
    #[arg(long)]
    pub base: String,

    /// Pull request title.
    #[arg(long)]
    pub title: Option<String>,

    /// Pull request body.
    #[arg(long)]
    pub body: Option<String>,

    /// Commit message for every file written.
    #[arg(long)]
    pub commit_message: Option<String>,

    /// Repository paths are taken relative to this directory.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    fn renderer(&self, label: &str) -> Box<dyn OutputRenderer> {
        match self {
            OutputFormat::Terminal => Box::new(TerminalRenderer::new(label)),
            OutputFormat::Json => Box::new(JsonRenderer),
        }
    }

    /// Render a quality report for `file`.
    pub fn render(&self, file: &str, report: &QualityReport) -> String {
        self.renderer(file).render(report)
    }

    pub fn render_generation(&self, result: &GenerationResult) -> String {
        self.renderer("").render_generation(result)
    }

    pub fn render_pull_request(&self, outcome: &PullRequestOutcome) -> String {
        self.renderer("").render_pull_request(outcome)
    }
}

impl GenerateArgs {
    /// The trimmed project name, required when generating a README.
    pub fn validate_project_name(&self) -> Result<Option<String>, String> {
        let name = self
            .project_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if self.purpose == Purpose::Readme && name.is_none() {
            return Err("--project-name is required for README generation".to_string());
        }
        Ok(name)
    }

    /// Whether `--out` names a zip bundle.
    pub fn out_is_bundle(&self) -> bool {
        self.out.as_deref().is_some_and(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
        })
    }
}
