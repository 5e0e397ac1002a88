use std::path::Path;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aiderflow::aider::AiderRunner;
use aiderflow::config::AppConfig;
use aiderflow::deps::{DependencyProbe, EnvironmentChecker};
use aiderflow::error::AppError;
use aiderflow::remote::GitHubRemote;
use aiderflow::vcs::GitCli;
use aiderflow::workflow::Orchestrator;

#[derive(Parser)]
#[command(
    name = "aiderflow",
    version,
    about = "Turn a natural-language change request into a GitHub pull request via aider"
)]
struct Cli {
    /// The change request to hand to aider
    prompt: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Branch name to use instead of a generated one
    #[arg(short, long)]
    branch: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// Check configuration and dependencies, then exit
    #[arg(long)]
    check: bool,

    /// Write a starter configuration file, then exit
    #[arg(long)]
    init: bool,

    /// Overwrite an existing file with --init
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    if cli.init {
        return match handle_init(cli.config.as_deref(), cli.force) {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write config file");
                AppError::Config(e.to_string()).exit_code()
            }
        };
    }

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            if let Some(hint) = e.hint() {
                tracing::info!("hint: {hint}");
            }
            return e.exit_code();
        }
    };

    let (owner, repo) = match config.repo_owner_name() {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(error = %e, "Invalid repository configuration");
            return e.exit_code();
        }
    };

    let remote = match GitHubRemote::new(&config.github.token, owner, repo) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build GitHub client");
            return e.exit_code();
        }
    };

    if cli.check {
        return handle_check(&remote).await;
    }

    let Some(prompt) = cli.prompt.as_deref() else {
        tracing::error!("Missing prompt argument; see `aiderflow --help`");
        return 1;
    };

    let vcs = GitCli::new(".");
    let modifier = AiderRunner::new(&config.aider, ".");
    let checker = EnvironmentChecker::new(".", &remote);

    let orchestrator = Orchestrator::new(&config, &checker, &vcs, &modifier, &remote);
    let outcome = orchestrator.run(prompt, cli.branch.as_deref()).await;

    println!("{}", outcome.report());
    outcome.exit_code()
}

fn handle_init(config_path: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config_path.unwrap_or("aiderflow.toml");
    AppConfig::write_starter(Path::new(path), force)?;
    tracing::info!(path, "Starter config written");
    tracing::info!("Set github.token (or the GITHUB_TOKEN environment variable) and github.repo");
    Ok(())
}

async fn handle_check(remote: &GitHubRemote) -> i32 {
    tracing::info!("Configuration loaded and valid");

    let checker = EnvironmentChecker::new(".", remote);
    let missing = checker.check_all().await;

    if missing.is_empty() {
        tracing::info!("All dependencies available");
        println!("Environment OK: aider, git, repository, and GitHub access all check out");
        0
    } else {
        for dep in &missing {
            println!("missing: {dep}");
        }
        AppError::Dependency(missing).exit_code()
    }
}
