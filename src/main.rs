//! tekshila: AI-generated documentation and code quality CLI.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use tekshila::config;
use tekshila::constants;
use tekshila::env;
use tekshila::generator;
use tekshila::ingest;
use tekshila::languages;
use tekshila::models;
use tekshila::output;
use tekshila::progress;
use tekshila::providers;
use tekshila::publish;
use tekshila::quality;

use std::io::IsTerminal;
use std::path::{Component, Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use cli::args::{AnalyzeArgs, Cli, Command, GenerateArgs, GithubAction, OutputFormat, PublishArgs};
use config::Config;
use env::Env;
use models::{ContentMap, GenerationRequest, GenerationResult, PullRequestOutcome, Purpose};
use progress::ProgressTracker;
use providers::{CompletionProvider, ProviderError};
use providers::gemini::GeminiProvider;
use publish::github::GitHubHost;
use publish::{PublishRequest, RepositorySession, SessionRegistry};

/// Session id used for the single caller of a CLI run.
const CLI_SESSION: &str = "cli";

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_logging();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        exit_failure();
    }
}

/// Structured logs go to stderr, filtered by `TEKSHILA_LOG` (default `warn`).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(constants::ENV_LOG)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Exit with status 1 after a result has already been printed.
fn exit_failure() -> ! {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    process::exit(1);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(*args).await,
        Command::Analyze(args) => run_analyze(args).await,
        Command::Publish(args) => run_publish(args).await,
        Command::Github { action } => run_github(action).await,
        Command::Version => run_version(),
    }
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")
}

/// Name an input file the way it is keyed in the content map.
///
/// Relative paths that stay inside the working directory keep their
/// `/`-joined components; anything else falls back to the file name.
fn upload_name(path: &Path) -> String {
    let parts: Option<Vec<String>> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    match parts {
        Some(parts) if !parts.is_empty() => parts.join("/"),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<ingest::Upload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        uploads.push(ingest::Upload::new(upload_name(path), bytes));
    }
    Ok(uploads)
}

/// Open the CLI's repository session with the configured token.
async fn connect_github(config: &Config) -> Result<Arc<RepositorySession>> {
    let Some(token) = config.github.token.as_deref().filter(|t| !t.trim().is_empty()) else {
        bail!(
            "GitHub token is required (set {} or github.token in {})",
            constants::ENV_GITHUB_TOKEN,
            constants::CONFIG_FILENAME,
        );
    };
    let host = GitHubHost::new(token, &config.github).context("failed to build GitHub client")?;
    let registry = SessionRegistry::new();
    let session = registry
        .connect(CLI_SESSION, Arc::new(host))
        .await
        .context("failed to connect to GitHub")?;
    Ok(session)
}

/// Publish `request`, print the outcome, and exit non-zero on failure.
async fn publish_and_report(
    session: &RepositorySession,
    request: &PublishRequest,
    format: OutputFormat,
) -> Result<()> {
    let result = session.publish(request).await;
    if let Err(ref e) = result {
        if let Some(branch) = e.orphaned_branch() {
            tracing::warn!(branch, "working branch left behind after failed publish");
        }
    }
    let failed = result.is_err();
    let outcome = PullRequestOutcome::from(result);
    print!("{}", format.render_pull_request(&outcome));
    if failed {
        exit_failure();
    }
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    use colored::Colorize;

    let project_name = args
        .validate_project_name()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let config = load_config()?;
    let uploads = read_uploads(&args.files).await?;
    let ingested = ingest::collect_uploads(uploads).context("invalid input")?;

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(GeminiProvider::new(&config.llm).context("failed to set up the model client")?);
    let max_concurrent = args.max_concurrent.unwrap_or(config.generate.max_concurrent);

    let show_progress = !args.no_progress
        && args.format == OutputFormat::Terminal
        && std::io::stderr().is_terminal();

    let result = match args.purpose {
        Purpose::Readme => {
            let name = project_name.clone().unwrap_or_default();
            let request =
                GenerationRequest::readme(ingested.to_source_input(), name, args.instructions.as_str());
            if show_progress {
                cli::print_banner(&format!("Writing README from {} file(s)", ingested.files.len()));
            }
            let generator =
                generator::DocGenerator::new(Arc::clone(&provider), config.llm.generation_timeout());
            let readme = generator
                .generate(&request)
                .await
                .context("README generation failed")?;
            GenerationResult::readme(readme)
        }
        Purpose::Comment => {
            let names: Vec<String> = ingested.files.keys().cloned().collect();
            let progress = Arc::new(ProgressTracker::new(&names, "commenting", show_progress));
            if show_progress {
                cli::print_banner(&format!("Commenting {} file(s)", names.len()));
            }
            progress.start();
            let generator =
                generator::DocGenerator::new(Arc::clone(&provider), config.llm.generation_timeout())
                    .with_max_concurrent(max_concurrent)
                    .with_progress(Arc::clone(&progress));
            let batch = generator
                .generate_comments(&ingested.files, &args.instructions)
                .await;
            progress.finish();
            GenerationResult::from(batch)
        }
    };

    match args.out.as_deref() {
        Some(out) => {
            write_generation(out, &result, args.out_is_bundle())?;
            if args.format == OutputFormat::Json {
                print!("{}", args.format.render_generation(&result));
            } else {
                eprintln!("  {} Wrote {}", "✔".green().bold(), out.display());
            }
        }
        None => print!("{}", args.format.render_generation(&result)),
    }

    ensure_complete(&result, ingested.files.len(), args.pr_repo.is_some())?;

    if let Some(repo) = args.pr_repo.as_deref() {
        let files = result.files();
        let title = args
            .pr_title
            .clone()
            .unwrap_or_else(|| constants::default_pr_title(project_name.as_deref()));
        let request = PublishRequest {
            repo: repo.to_string(),
            base_branch: args.pr_base.clone().unwrap_or_default(),
            commit_message: args.commit_message.clone().unwrap_or_else(|| title.clone()),
            body: args
                .pr_body
                .clone()
                .unwrap_or_else(|| constants::DEFAULT_PR_BODY.to_string()),
            title,
            files,
        };
        let session = connect_github(&config).await?;
        publish_and_report(&session, &request, args.format).await?;
    }
    Ok(())
}

/// A partial comment run is an error, and it never reaches a pull request.
fn ensure_complete(result: &GenerationResult, total: usize, publishing: bool) -> Result<()> {
    let failed = result.failures().len();
    if failed == 0 {
        return Ok(());
    }
    if publishing {
        bail!("{failed} of {total} file(s) failed to generate; no pull request was opened");
    }
    bail!("{failed} of {total} file(s) failed to generate")
}

/// Write a generation result under `out`: README text as a file, comments
/// as a directory tree or a zip bundle.
fn write_generation(out: &Path, result: &GenerationResult, bundle: bool) -> Result<()> {
    match result {
        GenerationResult::Readme { content, .. } => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, content)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
        GenerationResult::Comments { files, .. } if bundle => {
            output::files::write_bundle(out, files)?;
        }
        GenerationResult::Comments { files, .. } => {
            output::files::write_files(out, files)?;
        }
    }
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let filename = upload_name(&args.file);
    if languages::is_archive(&filename) || !languages::is_allowed_upload(&filename) {
        bail!("File type not supported: {filename}");
    }
    let code = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let config = load_config()?;
    let analyzer = match GeminiProvider::new(&config.llm) {
        Ok(provider) => quality::QualityAnalyzer::new(Arc::new(provider), config.llm.analysis_timeout()),
        Err(ProviderError::NotConfigured(reason)) => {
            tracing::debug!(%reason, "analysis runs without a model client");
            quality::QualityAnalyzer::unconfigured()
        }
        Err(e) => return Err(e).context("failed to set up the model client"),
    };

    let mut report = analyzer.analyze(&code, &filename).await;
    if let Some(min) = args.min_severity {
        report.retain_min_severity(min);
    }

    print!("{}", args.format.render(&filename, &report));
    if report.is_failure() {
        exit_failure();
    }
    Ok(())
}

/// Read files for publishing, keyed by their path relative to `root`.
async fn read_publish_files(paths: &[PathBuf], root: Option<&Path>) -> Result<ContentMap> {
    let mut files = ContentMap::new();
    for path in paths {
        let key = match root {
            Some(root) => {
                let relative = path.strip_prefix(root).with_context(|| {
                    format!("{} is not under {}", path.display(), root.display())
                })?;
                upload_name(relative)
            }
            None => upload_name(path),
        };
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.insert(key, content);
    }
    Ok(files)
}

async fn run_publish(args: PublishArgs) -> Result<()> {
    let config = load_config()?;
    let files = read_publish_files(&args.files, args.root.as_deref()).await?;

    let title = args.title.unwrap_or_else(|| constants::default_pr_title(None));
    let request = PublishRequest {
        repo: args.repo,
        base_branch: args.base,
        files,
        commit_message: args.commit_message.unwrap_or_else(|| title.clone()),
        body: args
            .body
            .unwrap_or_else(|| constants::DEFAULT_PR_BODY.to_string()),
        title,
    };

    let session = connect_github(&config).await?;
    publish_and_report(&session, &request, args.format).await
}

async fn run_github(action: GithubAction) -> Result<()> {
    use colored::Colorize;

    let config = load_config()?;
    let session = connect_github(&config).await?;

    match action {
        GithubAction::Whoami => {
            let user = session.user();
            println!("  {}  {}", user.login.bold(), user.name.as_deref().unwrap_or("").dimmed());
            println!("         {}  {}", "repos:".cyan(), user.public_repos);
            if let Some(ref avatar) = user.avatar_url {
                println!("         {}  {}", "avatar:".cyan(), avatar);
            }
        }
        GithubAction::Repos => {
            let repos = session
                .list_repositories()
                .await
                .context("failed to list repositories")?;
            if repos.is_empty() {
                println!("No repositories found.");
            }
            for repo in repos {
                println!("{repo}");
            }
        }
        GithubAction::Branches { repo } => {
            let branches = session
                .list_branches(&repo)
                .await
                .with_context(|| format!("failed to list branches of {repo}"))?;
            for branch in branches {
                println!("{branch}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_name_keeps_relative_paths() {
        assert_eq!(upload_name(Path::new("src/lib.rs")), "src/lib.rs");
        assert_eq!(upload_name(Path::new("./a.py")), "a.py");
    }

    #[test]
    fn upload_name_falls_back_to_file_name() {
        assert_eq!(upload_name(Path::new("/tmp/work/a.py")), "a.py");
        assert_eq!(upload_name(Path::new("../up/b.rs")), "b.rs");
    }

    #[test]
    fn partial_comment_run_blocks_publishing() {
        let result = GenerationResult::from(models::CommentBatch {
            commented: ContentMap::from([("a.py".to_string(), "# a".to_string())]),
            failures: vec![models::FileFailure {
                path: "b.py".into(),
                error: "timed out".into(),
            }],
        });

        let err = ensure_complete(&result, 2, true).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
        assert!(err.to_string().contains("no pull request was opened"));
        assert!(!ensure_complete(&result, 2, false).unwrap_err().to_string().contains("pull request"));
        assert!(ensure_complete(&GenerationResult::readme("# Demo"), 1, true).is_ok());
    }

    #[tokio::test]
    async fn publish_files_are_keyed_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("guide.md");
        std::fs::write(&file, "# Guide").unwrap();

        let files = read_publish_files(&[file.clone()], Some(dir.path())).await.unwrap();
        assert_eq!(files["docs/guide.md"], "# Guide");

        let other = tempfile::tempdir().unwrap();
        assert!(read_publish_files(&[file], Some(other.path())).await.is_err());
    }
}
