pub mod types;

pub use types::{RunOutcome, SubsetResult};

use colored::Colorize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::{extract_metrics, ExtractedMetrics, MetricReport, NOT_AVAILABLE};
use crate::analysis::metrics::{CYCLOMATIC_COMPLEXITY_LABEL, LACK_OF_COHESION_LABEL};
use crate::pr::ChangeStatus;

pub const TITLE: &str = "## PHP Metrics Analysis Results";

const DETAILS: &str = "## Details\n\
- [LCOM](https://global-exam.slite.com/app/docs/KMS5I08Eh_guxb?noteModalId=fbQf78FpLY_wH4)\n\
- [CCN](https://global-exam.slite.com/app/docs/KMS5I08Eh_guxb?noteModalId=THWZNC68rXAY9R)\n";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read report file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendered markdown location for one subset.
pub fn section_path(assets_dir: &Path, status: ChangeStatus) -> PathBuf {
    assets_dir.join(format!("phpmetrics_results_{}.md", status.as_str()))
}

/// Location of the full comment body.
pub fn comment_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join("phpmetrics_results.md")
}

/// Metrics to show for a report. Only real PhpMetrics output yields a table;
/// a missing report or the empty-subset placeholder yields None.
pub fn metrics_for(report: &MetricReport) -> Option<ExtractedMetrics> {
    match report {
        MetricReport::Generated(text) => Some(extract_metrics(text)),
        MetricReport::Missing | MetricReport::Placeholder => None,
    }
}

/// Markdown for one subset: a two-row metric table, or a single sentence
/// when there is nothing to show.
pub fn render_section(status: ChangeStatus, metrics: Option<&ExtractedMetrics>) -> String {
    let Some(metrics) = metrics else {
        return format!("No metrics found for {} files.", status.as_str());
    };

    let mut md = String::new();
    md.push_str(&format!("## Metrics for {} Files\n", status.title()));
    md.push_str("| Metric | Value |\n");
    md.push_str("| ------ | ----- |\n");
    md.push_str(&format!(
        "| {} | {} |\n",
        LACK_OF_COHESION_LABEL,
        metrics.lack_of_cohesion_or_na()
    ));
    md.push_str(&format!(
        "| {} | {} |\n",
        CYCLOMATIC_COMPLEXITY_LABEL,
        metrics.average_cyclomatic_complexity_or_na()
    ));
    md
}

/// Full comment: title, modified section, added section, details links.
pub fn compose_comment(modified_section: &str, added_section: &str) -> String {
    let mut md = String::new();
    md.push_str(TITLE);
    md.push_str("\n\n");
    md.push_str(modified_section);
    md.push_str("\n\n");
    md.push_str(added_section);
    md.push_str("\n\n");
    md.push_str(DETAILS);
    md
}

/// Write both section files and the combined comment file under
/// `assets_dir`, then return the comment body as stored on disk.
#[instrument(skip(assets_dir, modified_section, added_section), fields(assets_dir = %assets_dir.display()))]
pub fn write_comment(
    assets_dir: &Path,
    modified_section: &str,
    added_section: &str,
) -> Result<String, ReportError> {
    write_file(&section_path(assets_dir, ChangeStatus::Modified), modified_section)?;
    write_file(&section_path(assets_dir, ChangeStatus::Added), added_section)?;

    let path = comment_path(assets_dir);
    write_file(&path, &compose_comment(modified_section, added_section))?;
    debug!(path = %path.display(), "comment written");

    std::fs::read_to_string(&path).map_err(|source| ReportError::FileRead { path, source })
}

fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    let to_error = |source| ReportError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, contents).map_err(to_error)
}

/// Print a short colored summary of the run to the terminal.
///
/// PR #42: metrics posted (https://github.com/...#issuecomment-1)
///   modified  2 files  LCOM 7  CCN 3
///   added     0 files  no metrics
pub fn print_summary(outcome: &RunOutcome) {
    println!();
    println!(
        "PR #{}: {} ({})",
        outcome.pr_number,
        "metrics posted".green().bold(),
        outcome.comment.html_url
    );
    for subset in &outcome.subsets {
        let detail = match &subset.metrics {
            Some(metrics) => format!(
                "LCOM {}  CCN {}",
                colorize_value(metrics.lack_of_cohesion_or_na()),
                colorize_value(metrics.average_cyclomatic_complexity_or_na())
            ),
            None => "no metrics".dimmed().to_string(),
        };
        println!(
            "  {:<9} {:>3} files  {}",
            subset.status.as_str(),
            subset.file_count,
            detail
        );
    }
    println!();
}

fn colorize_value(value: &str) -> colored::ColoredString {
    if value == NOT_AVAILABLE {
        value.yellow()
    } else {
        value.bold()
    }
}
