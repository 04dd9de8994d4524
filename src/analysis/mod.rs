pub mod metrics;

pub use metrics::{extract_metrics, ExtractedMetrics, NOT_AVAILABLE};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::AnalysisConfig;
use crate::pr::ChangeStatus;
use crate::setup::{CommandRunner, Invocation, ProcessError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("PhpMetrics failed on {status} files: {source}")]
    Tool {
        status: ChangeStatus,
        #[source]
        source: ProcessError,
    },

    #[error("Failed to write report {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read report {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A raw report as found on disk after the analysis step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricReport {
    /// No report file was written.
    Missing,
    /// The subset was empty and the placeholder sentence was written instead.
    Placeholder,
    /// PhpMetrics output.
    Generated(String),
}

/// Raw report location for one subset.
pub fn report_path(assets_dir: &Path, status: ChangeStatus) -> PathBuf {
    assets_dir.join(format!("phpmetrics_output_{}.txt", status.as_str()))
}

/// Text written in place of a report when a subset has no files.
pub fn placeholder(status: ChangeStatus) -> String {
    format!("No PHP files {} in this pull request.", status.as_str())
}

/// Analyze one subset and store the report at [`report_path`].
///
/// An empty subset gets the placeholder text and PhpMetrics is not started.
/// Otherwise the binary runs once over all files (`--report-cli a.php,b.php`)
/// and its stdout becomes the report.
#[instrument(skip(runner, config, status, files), fields(status = %status, files = files.len()))]
pub async fn run_subset(
    runner: &dyn CommandRunner,
    config: &AnalysisConfig,
    status: ChangeStatus,
    files: &[String],
) -> Result<PathBuf, AnalysisError> {
    let path = report_path(&config.assets_dir, status);

    let contents = if files.is_empty() {
        let text = placeholder(status);
        info!("{}", text);
        text
    } else {
        debug!(files = %files.join(" "), "running PhpMetrics");
        runner
            .run(&phpmetrics(&config.binary, files))
            .await
            .map_err(|source| AnalysisError::Tool { status, source })?
    };

    write_report(&path, &contents)?;
    debug!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(path)
}

/// PhpMetrics takes several paths as one comma-separated argument.
fn phpmetrics(binary: &str, files: &[String]) -> Invocation {
    Invocation::new(binary, ["--report-cli".to_string(), files.join(",")])
}

fn write_report(path: &Path, contents: &str) -> Result<(), AnalysisError> {
    let to_error = |source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, contents).map_err(to_error)
}

/// Read a subset's report back from disk.
pub fn load_report(path: &Path, status: ChangeStatus) -> Result<MetricReport, AnalysisError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MetricReport::Missing),
        Err(source) => {
            return Err(AnalysisError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if text.trim() == placeholder(status) {
        Ok(MetricReport::Placeholder)
    } else {
        Ok(MetricReport::Generated(text))
    }
}
