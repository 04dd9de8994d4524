mod analysis;
mod config;
mod pipeline;
mod pr;
mod report;
mod setup;

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError};
use crate::pipeline::{Pipeline, PipelineError};
use crate::report::RunOutcome;

/// PhpMetrics reporter: runs PhpMetrics on the PHP files changed by a GitHub
/// Pull Request and posts the cohesion and complexity figures as a comment.
///
/// Meant to run as a workflow step; repository and PR are read from the
/// `GITHUB_*` environment of the runner.
#[derive(Parser, Debug)]
#[command(name = "phpmetrics-reporter", version, about)]
struct Cli {
    /// PHP version to install (e.g., 8.2); overrides the config file and the
    /// `php-version` action input
    #[arg(long)]
    php_version: Option<String>,

    /// Token used for the GitHub API; overrides the config file and the
    /// `github-token` action input
    #[arg(long)]
    github_token: Option<String>,

    /// Config file (defaults to .phpmetrics-reporter.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => {
            info!(comment_id = outcome.comment.id, "done");
            report::print_summary(&outcome);
        }
        Err(err) => {
            error!(error = %err, "run failed");
            // Workflow command: marks the step as failed in the Actions UI.
            println!("{}", failure_line(&err));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome, PipelineError> {
    info!("loading configuration");
    let config = load_config(&cli, |key| std::env::var(key).ok())?;

    let event = pr::EventContext::from_env().map_err(PipelineError::Context)?;
    info!(event = %event.event_name, repository = %format!("{}/{}", event.owner, event.repo), "read workflow context");

    let runner = setup::TokioCommandRunner::new(config.timeouts.command());
    let api = pr::GitHubClient::new(
        &config.github.api_url,
        config.github.token.as_deref().unwrap_or_default(),
        config.timeouts.http(),
    )
    .map_err(PipelineError::Client)?;

    Pipeline::new(&config, &runner, &api).run(&event).await
}

/// Config file first, then the action inputs for anything it leaves unset,
/// then explicit command-line flags.
fn load_config<F>(cli: &Cli, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::load(cli.config.as_deref(), lookup)?;
    config.override_with(cli.php_version.clone(), cli.github_token.clone());
    Ok(config)
}

/// Workflow command that marks the step as failed in the Actions UI.
fn failure_line(err: &PipelineError) -> String {
    format!("::error::Action failed with error: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn config_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporter.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_action_input_does_not_override_config_file() {
        let (_dir, path) = config_file("[runtime]\nversion = \"7.4\"\n");
        let cli = Cli::parse_from(["phpmetrics-reporter", "--config", path.to_str().unwrap()]);

        let config = load_config(&cli, lookup(&[("INPUT_PHP-VERSION", "8.2"), ("INPUT_GITHUB-TOKEN", "t")])).unwrap();

        assert_eq!(config.runtime.version.as_deref(), Some("7.4"));
        assert_eq!(config.github.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_action_input_fills_unset_version() {
        let (_dir, path) = config_file("[github]\ntoken = \"from-file\"\n");
        let cli = Cli::parse_from(["phpmetrics-reporter", "--config", path.to_str().unwrap()]);

        let config = load_config(&cli, lookup(&[("INPUT_PHP-VERSION", "8.2"), ("INPUT_GITHUB-TOKEN", "input")])).unwrap();

        assert_eq!(config.runtime.version.as_deref(), Some("8.2"));
        assert_eq!(config.github.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_flags_override_file_and_inputs() {
        let (_dir, path) = config_file("[runtime]\nversion = \"7.4\"\n");
        let cli = Cli::parse_from([
            "phpmetrics-reporter",
            "--config",
            path.to_str().unwrap(),
            "--php-version",
            "8.3",
            "--github-token",
            "flag-token",
        ]);

        let config = load_config(&cli, lookup(&[("INPUT_PHP-VERSION", "8.2"), ("GITHUB_TOKEN", "env")])).unwrap();

        assert_eq!(config.runtime_version().unwrap(), "8.3");
        assert_eq!(config.github_token().unwrap(), "flag-token");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let cli = Cli::parse_from(["phpmetrics-reporter", "--config", missing.to_str().unwrap()]);

        let err = load_config(&cli, lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }

    #[test]
    fn test_failure_line_carries_error_message() {
        let err = PipelineError::NotPullRequest("push".to_string());
        assert_eq!(
            failure_line(&err),
            "::error::Action failed with error: This action can only be run on pull requests (triggered by `push`)"
        );

        let err = PipelineError::Config(ConfigError::MissingToken);
        assert!(failure_line(&err).starts_with("::error::Action failed with error: GitHub token is required"));
    }
}
