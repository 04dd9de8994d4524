//! The reporter run, step by step. Every step finishes before the next one
//! starts, and the first failure ends the run.

use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::analysis::{self, AnalysisError};
use crate::config::{Config, ConfigError};
use crate::pr::{self, ChangeStatus, EventContext, PrError, PullRequestApi, PullRequestContext};
use crate::report::{self, ReportError, RunOutcome, SubsetResult};
use crate::setup::{self, CommandRunner, ProcessError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("This action can only be run on pull requests (triggered by `{0}`)")]
    NotPullRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read the workflow context: {0}")]
    Context(#[source] PrError),

    #[error("Failed to create the GitHub client: {0}")]
    Client(#[source] PrError),

    #[error("Environment setup failed: {0}")]
    Setup(#[source] ProcessError),

    #[error("Dependency install failed: {0}")]
    Dependencies(#[source] ProcessError),

    #[error("Failed to list pull request files: {0}")]
    ListFiles(#[source] PrError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to comment on the pull request: {0}")]
    PostComment(#[source] PrError),
}

/// Wires configuration, process runner and platform API together.
pub struct Pipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    api: &'a dyn PullRequestApi,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner, api: &'a dyn PullRequestApi) -> Self {
        Self { config, runner, api }
    }

    /// Run every step for the pull request in `event` and post one comment.
    ///
    /// Nothing is started when the event is not a pull request. Files written
    /// before a failure are left in place.
    pub async fn run(&self, event: &EventContext) -> Result<RunOutcome, PipelineError> {
        let pr = event
            .pull_request()
            .ok_or_else(|| PipelineError::NotPullRequest(event.event_name.clone()))?;
        self.config.validate()?;

        let span = info_span!("report_pr", owner = %pr.owner, repo = %pr.repo, pr = pr.number);
        self.run_steps(&pr).instrument(span).await
    }

    async fn run_steps(&self, pr: &PullRequestContext) -> Result<RunOutcome, PipelineError> {
        info!(git_ref = %pr.git_ref, "checking out");
        self.runner
            .run(&setup::checkout(&pr.git_ref))
            .await
            .map_err(PipelineError::Setup)?;

        let version = self.config.runtime_version()?;
        info!(version, "installing PHP");
        self.runner
            .run(&setup::install_runtime(version, &self.config.runtime.extensions))
            .await
            .map_err(PipelineError::Setup)?;

        info!("installing composer dependencies");
        self.runner
            .run(&setup::install_dependencies())
            .await
            .map_err(PipelineError::Dependencies)?;

        info!("listing changed files");
        let files = self.api.list_files(pr).await.map_err(PipelineError::ListFiles)?;
        let subsets = pr::partition_changed_files(&files, &self.config.analysis.extension);
        info!(
            changed = files.len(),
            modified = subsets.modified.len(),
            added = subsets.added.len(),
            "partitioned changed files"
        );

        let assets_dir = &self.config.analysis.assets_dir;
        let mut results = Vec::with_capacity(ChangeStatus::ALL.len());
        let mut sections = Vec::with_capacity(ChangeStatus::ALL.len());
        for status in ChangeStatus::ALL {
            debug!(%status, files = %subsets.joined(status), "analyzing subset");
            let path = analysis::run_subset(self.runner, &self.config.analysis, status, subsets.files(status)).await?;
            let metrics = report::metrics_for(&analysis::load_report(&path, status)?);
            sections.push(report::render_section(status, metrics.as_ref()));
            results.push(SubsetResult {
                status,
                file_count: subsets.files(status).len(),
                metrics,
            });
        }

        let body = report::write_comment(assets_dir, &sections[0], &sections[1])?;

        info!("posting comment");
        let comment = self
            .api
            .create_comment(pr, &body)
            .await
            .map_err(PipelineError::PostComment)?;
        info!(comment_id = comment.id, "comment posted");

        Ok(RunOutcome {
            pr_number: pr.number,
            subsets: results,
            body,
            comment,
        })
    }
}
